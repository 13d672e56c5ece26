//! Built-in access-control schema data used when the configuration omits it.

use std::collections::BTreeMap;

use super::{ConversionKind, ConversionRule, SequenceBinding};

/// Parent-before-child load order for the access-control tables.
pub const PRIORITY_TABLES: &[&str] = &[
    "x_portal_user",
    "x_cred_store",
    "x_user",
    "x_group",
    "x_group_groups",
    "x_group_users",
    "x_auth_sess",
    "x_service_def",
    "x_service",
    "x_service_config_def",
    "x_service_config_map",
    "x_resource_def",
    "x_access_type_def",
    "x_access_type_def_grants",
    "x_policy_condition_def",
    "x_context_enricher_def",
    "x_enum_def",
    "x_enum_element_def",
    "x_security_zone",
    "x_ranger_global_state",
    "x_asset",
    "x_resource",
    "x_policy",
    "x_policy_resource",
    "x_policy_resource_map",
    "x_policy_item",
    "x_policy_item_access",
    "x_policy_item_condition",
    "x_policy_item_user_perm",
    "x_policy_item_group_perm",
    "x_datamask_type_def",
    "x_policy_item_datamask",
    "x_policy_item_rowfilter",
    "x_tag_def",
    "x_tag",
    "x_service_resource",
    "x_tag_resource_map",
    "x_role",
    "x_role_ref_user",
    "x_role_ref_group",
    "x_role_ref_role",
    "x_policy_ref_resource",
    "x_policy_ref_access_type",
    "x_policy_ref_condition",
    "x_policy_ref_datamask_type",
    "x_policy_ref_user",
    "x_policy_ref_group",
    "x_policy_ref_role",
    "x_security_zone_ref_service",
    "x_security_zone_ref_tag_srvc",
    "x_security_zone_ref_resource",
    "x_security_zone_ref_user",
    "x_security_zone_ref_group",
    "x_security_zone_ref_role",
    "x_modules_master",
    "x_user_module_perm",
    "x_group_module_perm",
    "x_gds_dataset",
    "x_gds_project",
    "x_gds_data_share",
    "x_gds_shared_resource",
    "x_gds_data_share_in_dataset",
    "x_gds_dataset_in_project",
    "x_gds_dataset_policy_map",
    "x_gds_project_policy_map",
    "x_rms_service_resource",
    "x_rms_notification",
    "x_rms_resource_mapping",
    "x_rms_mapping_provider",
    "x_policy_change_log",
    "x_tag_change_log",
    "x_policy_export_audit",
    "x_ugsync_audit_info",
    "x_service_version_info",
    "x_plugin_info",
    "x_policy_label",
    "x_policy_label_map",
    "x_data_hist",
    "x_perm_map",
    "x_audit_map",
    "x_db_base",
    "x_db_version_h",
    "xa_access_audit",
    "x_trx_log_v2",
];

/// Table to sequence pairs advanced after the load.
pub const SEQUENCES: &[(&str, &str)] = &[
    ("x_portal_user", "x_portal_user_seq"),
    ("x_portal_user_role", "x_portal_user_role_seq"),
    ("xa_access_audit", "xa_access_audit_seq"),
    ("x_asset", "x_asset_seq"),
    ("x_auth_sess", "x_auth_sess_seq"),
    ("x_cred_store", "x_cred_store_seq"),
    ("x_db_base", "x_db_base_seq"),
    ("x_group", "x_group_seq"),
    ("x_group_groups", "x_group_groups_seq"),
    ("x_user", "x_user_seq"),
    ("x_group_users", "x_group_users_seq"),
    ("x_policy_export_audit", "x_policy_export_seq"),
    ("x_resource", "x_resource_seq"),
    ("x_perm_map", "x_perm_map_seq"),
    ("x_audit_map", "x_audit_map_seq"),
    ("x_trx_log_v2", "x_trx_log_v2_seq"),
    ("x_service_def", "x_service_def_seq"),
    ("x_service", "x_service_seq"),
    ("x_security_zone", "x_security_zone_seq"),
    ("x_ranger_global_state", "x_ranger_global_state_seq"),
    ("x_policy", "x_policy_seq"),
    ("x_service_config_def", "x_service_config_def_seq"),
    ("x_resource_def", "x_resource_def_seq"),
    ("x_access_type_def", "x_access_type_def_seq"),
    ("x_access_type_def_grants", "x_access_type_def_grants_seq"),
    ("x_policy_condition_def", "x_policy_condition_def_seq"),
    ("x_context_enricher_def", "x_context_enricher_def_seq"),
    ("x_enum_def", "x_enum_def_seq"),
    ("x_enum_element_def", "x_enum_element_def_seq"),
    ("x_service_config_map", "x_service_config_map_seq"),
    ("x_policy_resource", "x_policy_resource_seq"),
    ("x_policy_resource_map", "x_policy_resource_map_seq"),
    ("x_policy_item", "x_policy_item_seq"),
    ("x_policy_item_access", "x_policy_item_access_seq"),
    ("x_policy_item_condition", "x_policy_item_condition_seq"),
    ("x_policy_item_user_perm", "x_policy_item_user_perm_seq"),
    ("x_policy_item_group_perm", "x_policy_item_group_perm_seq"),
    ("x_data_hist", "x_data_hist_seq"),
    ("x_modules_master", "x_modules_master_seq"),
    ("x_user_module_perm", "x_user_module_perm_seq"),
    ("x_group_module_perm", "x_group_module_perm_seq"),
    ("x_tag_def", "x_tag_def_seq"),
    ("x_tag", "x_tag_seq"),
    ("x_service_resource", "x_service_resource_seq"),
    ("x_tag_resource_map", "x_tag_resource_map_seq"),
    ("x_datamask_type_def", "x_datamask_type_def_seq"),
    ("x_policy_item_datamask", "x_policy_item_datamask_seq"),
    ("x_policy_item_rowfilter", "x_policy_item_rowfilter_seq"),
    ("x_service_version_info", "x_service_version_info_seq"),
    ("x_plugin_info", "x_plugin_info_seq"),
    ("x_policy_label", "x_policy_label_seq"),
    ("x_policy_label_map", "x_policy_label_map_seq"),
    ("x_ugsync_audit_info", "x_ugsync_audit_info_seq"),
    ("x_policy_ref_resource", "x_policy_ref_resource_seq"),
    ("x_policy_ref_access_type", "x_policy_ref_access_type_seq"),
    ("x_policy_ref_condition", "x_policy_ref_condition_seq"),
    ("x_policy_ref_datamask_type", "x_policy_ref_datamask_type_seq"),
    ("x_policy_ref_user", "x_policy_ref_user_seq"),
    ("x_policy_ref_group", "x_policy_ref_group_seq"),
    ("x_security_zone_ref_service", "x_sec_zone_ref_service_seq"),
    ("x_security_zone_ref_tag_srvc", "x_sec_zone_ref_tag_srvc_seq"),
    ("x_security_zone_ref_resource", "x_sec_zone_ref_resource_seq"),
    ("x_security_zone_ref_user", "x_sec_zone_ref_user_seq"),
    ("x_security_zone_ref_group", "x_sec_zone_ref_group_seq"),
    ("x_policy_change_log", "x_policy_change_log_seq"),
    ("x_role", "x_role_seq"),
    ("x_role_ref_user", "x_role_ref_user_seq"),
    ("x_role_ref_group", "x_role_ref_group_seq"),
    ("x_policy_ref_role", "x_policy_ref_role_seq"),
    ("x_role_ref_role", "x_role_ref_role_seq"),
    ("x_security_zone_ref_role", "x_sec_zone_ref_role_seq"),
    ("x_tag_change_log", "x_tag_change_log_seq"),
    ("x_rms_service_resource", "x_rms_service_resource_seq"),
    ("x_rms_notification", "x_rms_notification_seq"),
    ("x_rms_resource_mapping", "x_rms_resource_mapping_seq"),
    ("x_rms_mapping_provider", "x_rms_mapping_provider_seq"),
    ("x_gds_dataset", "x_gds_dataset_seq"),
    ("x_gds_project", "x_gds_project_seq"),
    ("x_gds_data_share", "x_gds_data_share_seq"),
    ("x_gds_shared_resource", "x_gds_shared_resource_seq"),
    ("x_gds_data_share_in_dataset", "x_gds_data_share_in_dataset_seq"),
    ("x_gds_dataset_in_project", "x_gds_dataset_in_project_seq"),
    ("x_gds_dataset_policy_map", "x_gds_dataset_policy_map_seq"),
    ("x_gds_project_policy_map", "x_gds_project_policy_map_seq"),
];

/// Columns stored as 0/1 integers in MySQL and as booleans in PostgreSQL.
pub const BOOLEAN_COLUMNS: &[(&str, &[&str])] = &[
    ("x_service_def", &["is_enabled"]),
    ("x_service", &["is_enabled"]),
    ("x_policy", &["is_enabled", "is_audit_enabled"]),
    ("x_service_config_def", &["is_mandatory"]),
    (
        "x_resource_def",
        &[
            "mandatory",
            "look_up_supported",
            "recursive_supported",
            "excludes_supported",
        ],
    ),
    ("x_policy_resource", &["is_excludes", "is_recursive"]),
];

/// Tables excluded from every pass unless the configuration says otherwise.
pub fn skip_tables() -> Vec<String> {
    vec!["vx_principal".to_string()]
}

pub fn priority_tables() -> Vec<String> {
    PRIORITY_TABLES.iter().map(|t| t.to_string()).collect()
}

pub fn sequences() -> Vec<SequenceBinding> {
    SEQUENCES
        .iter()
        .map(|(table, sequence)| SequenceBinding {
            table: table.to_string(),
            sequence: sequence.to_string(),
        })
        .collect()
}

pub fn type_conversions() -> Vec<ConversionRule> {
    let tables: BTreeMap<String, Vec<String>> = BOOLEAN_COLUMNS
        .iter()
        .map(|(table, columns)| {
            (
                table.to_string(),
                columns.iter().map(|c| c.to_string()).collect(),
            )
        })
        .collect();

    vec![ConversionRule {
        conversion: ConversionKind::Boolean,
        tables,
    }]
}
