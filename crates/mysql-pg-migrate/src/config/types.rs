//! Configuration type definitions.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::defaults;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source database configuration (MySQL).
    pub source: SourceConfig,

    /// Target database configuration (PostgreSQL).
    pub target: TargetConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

/// Source database (MySQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 3306).
    #[serde(default = "default_mysql_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Connection character set (default: "utf8").
    #[serde(default = "default_charset")]
    pub charset: String,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("charset", &self.charset)
            .finish()
    }
}

/// Target database (PostgreSQL) configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// Target schema (default: "public").
    #[serde(default = "default_public_schema")]
    pub schema: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("schema", &self.schema)
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}

/// Migration behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Rows per insert batch (default: 1000).
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Log transfer progress every this many batches (default: 5).
    #[serde(default = "default_progress_every_batches")]
    pub progress_every_batches: usize,

    /// Tables excluded from every pass.
    #[serde(default = "defaults::skip_tables")]
    pub skip_tables: Vec<String>,

    /// Clear destination tables before loading (default: true).
    #[serde(default = "default_true")]
    pub truncate_before_insert: bool,

    /// Drop tables missing on the destination instead of failing them (default: true).
    #[serde(default = "default_true")]
    pub skip_missing_tables: bool,

    /// Parent-before-child table order.
    #[serde(default = "defaults::priority_tables")]
    pub priority_tables: Vec<String>,

    /// Per-table column conversions applied before insert.
    #[serde(default = "defaults::type_conversions")]
    pub type_conversions: Vec<ConversionRule>,

    /// Sequences advanced to the loaded maximum key after transfer.
    #[serde(default = "defaults::sequences")]
    pub sequences: Vec<SequenceBinding>,

    /// Key column whose maximum drives each sequence (default: "id").
    #[serde(default = "default_key_column")]
    pub sequence_key_column: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            progress_every_batches: default_progress_every_batches(),
            skip_tables: defaults::skip_tables(),
            truncate_before_insert: true,
            skip_missing_tables: true,
            priority_tables: defaults::priority_tables(),
            type_conversions: defaults::type_conversions(),
            sequences: defaults::sequences(),
            sequence_key_column: default_key_column(),
        }
    }
}

impl MigrationConfig {
    /// Check whether a table is in the skip set.
    pub fn is_skipped(&self, table: &str) -> bool {
        self.skip_tables.iter().any(|t| t == table)
    }

    /// Conversions that apply to a table, as (kind, column) pairs in rule order.
    pub fn conversions_for(&self, table: &str) -> Vec<(ConversionKind, &str)> {
        self.type_conversions
            .iter()
            .filter_map(|rule| rule.tables.get(table).map(|cols| (rule.conversion, cols)))
            .flat_map(|(kind, cols)| cols.iter().map(move |c| (kind, c.as_str())))
            .collect()
    }
}

/// Scalar transform applied to a named column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    /// 1 becomes true, 0 becomes false, anything else becomes NULL.
    Boolean,
    /// Binary data becomes text; fails on invalid UTF-8.
    Utf8Text,
}

impl fmt::Display for ConversionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionKind::Boolean => write!(f, "boolean"),
            ConversionKind::Utf8Text => write!(f, "utf8_text"),
        }
    }
}

/// One conversion kind and the table columns it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversionRule {
    pub conversion: ConversionKind,
    /// Table name to column names.
    pub tables: BTreeMap<String, Vec<String>>,
}

/// Pairing of a destination table with its auto-increment sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceBinding {
    pub table: String,
    pub sequence: String,
}

fn default_mysql_port() -> u16 {
    3306
}

fn default_pg_port() -> u16 {
    5432
}

fn default_charset() -> String {
    "utf8".to_string()
}

fn default_public_schema() -> String {
    "public".to_string()
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_batch_size() -> usize {
    1000
}

fn default_progress_every_batches() -> usize {
    5
}

fn default_key_column() -> String {
    "id".to_string()
}

fn default_true() -> bool {
    true
}
