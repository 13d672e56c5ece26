//! Error types for the migration library.

use thiserror::Error;

/// Process exit code for configuration problems.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Process exit code when a database connection cannot be established.
pub const EXIT_CONNECTION_ERROR: u8 = 2;
/// Process exit code for uncontained query failures.
pub const EXIT_DATABASE_ERROR: u8 = 3;
/// Process exit code when verification finds mismatched or missing tables.
pub const EXIT_VERIFY_FAILED: u8 = 4;
/// Process exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// MySQL source query error
    #[error("Source database error: {0}")]
    Source(#[from] sqlx::Error),

    /// PostgreSQL target query error
    #[error("Target database error: {0}")]
    Target(#[from] tokio_postgres::Error),

    /// Connection could not be opened or reopened
    #[error("Connection error: {message}\n  Context: {context}")]
    Connection { message: String, context: String },

    /// Data transfer failed for a specific table
    #[error("Transfer failed for table {table}: {message}")]
    Transfer { table: String, message: String },

    /// A column conversion rule rejected a value
    #[error("Conversion failed for {table}.{column}: {message}")]
    Conversion {
        table: String,
        column: String,
        message: String,
    },

    /// Post-migration verification found differences
    #[error("Verification failed: {0}")]
    Verification(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    /// Create a Connection error with context about where it occurred
    pub fn connection(message: impl std::fmt::Display, context: impl Into<String>) -> Self {
        MigrateError::Connection {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Transfer error
    pub fn transfer(table: impl Into<String>, message: impl Into<String>) -> Self {
        MigrateError::Transfer {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create a Conversion error
    pub fn conversion(
        table: impl Into<String>,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        MigrateError::Conversion {
            table: table.into(),
            column: column.into(),
            message: message.into(),
        }
    }

    /// Map the error to the process exit code reported by the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            MigrateError::Config(_) | MigrateError::Yaml(_) => EXIT_CONFIG_ERROR,
            MigrateError::Connection { .. } => EXIT_CONNECTION_ERROR,
            MigrateError::Source(_) | MigrateError::Target(_) | MigrateError::Transfer { .. } => {
                EXIT_DATABASE_ERROR
            }
            MigrateError::Verification(_) => EXIT_VERIFY_FAILED,
            MigrateError::Io(_) => EXIT_IO_ERROR,
            MigrateError::Conversion { .. } | MigrateError::Json(_) => EXIT_CONFIG_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(MigrateError::Config("x".into()).exit_code(), EXIT_CONFIG_ERROR);
        assert_eq!(
            MigrateError::connection("refused", "opening MySQL source").exit_code(),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(
            MigrateError::transfer("x_user", "boom").exit_code(),
            EXIT_DATABASE_ERROR
        );
        assert_eq!(
            MigrateError::Verification("2 tables".into()).exit_code(),
            EXIT_VERIFY_FAILED
        );
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(MigrateError::from(io).exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_format_detailed_includes_context() {
        let err = MigrateError::connection("timed out", "opening PostgreSQL target");
        let detailed = err.format_detailed();
        assert!(detailed.starts_with("Error: Connection error: timed out"));
        assert!(detailed.contains("Context: opening PostgreSQL target"));
    }

    #[test]
    fn test_format_detailed_walks_cause_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = MigrateError::from(io);
        assert!(err.format_detailed().contains("denied"));
    }
}
