//! Configuration validation.

use std::collections::HashSet;

use super::Config;
use crate::drivers::common::SslMode;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(MigrateError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(MigrateError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(MigrateError::Config("source.user is required".into()));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(MigrateError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(MigrateError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(MigrateError::Config("target.user is required".into()));
    }
    if config.target.schema.is_empty() {
        return Err(MigrateError::Config("target.schema cannot be empty".into()));
    }
    SslMode::parse(&config.target.ssl_mode)?;

    let migration = &config.migration;
    if migration.batch_size == 0 {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }
    if migration.progress_every_batches == 0 {
        return Err(MigrateError::Config(
            "migration.progress_every_batches must be at least 1".into(),
        ));
    }
    if migration.sequence_key_column.is_empty() {
        return Err(MigrateError::Config(
            "migration.sequence_key_column cannot be empty".into(),
        ));
    }

    let mut seen = HashSet::new();
    for table in &migration.priority_tables {
        if !seen.insert(table.as_str()) {
            return Err(MigrateError::Config(format!(
                "migration.priority_tables lists '{}' more than once",
                table
            )));
        }
    }

    for rule in &migration.type_conversions {
        for (table, columns) in &rule.tables {
            if columns.is_empty() {
                return Err(MigrateError::Config(format!(
                    "{} conversion for table '{}' names no columns",
                    rule.conversion, table
                )));
            }
        }
    }

    for binding in &migration.sequences {
        if binding.table.is_empty() || binding.sequence.is_empty() {
            return Err(MigrateError::Config(
                "migration.sequences entries need both table and sequence".into(),
            ));
        }
    }

    Ok(())
}
