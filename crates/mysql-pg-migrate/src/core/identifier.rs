//! Identifier validation and quoting.
//!
//! Table, column and sequence names cannot be bound as statement parameters,
//! so every name that is spliced into SQL goes through these functions.

use crate::error::{MigrateError, Result};

/// Longest identifier either database accepts (MySQL: 64, PostgreSQL: 63).
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Reject empty, over-long, or NUL-containing identifiers.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::Config("Identifier cannot be empty".to_string()));
    }
    if name.contains('\0') {
        return Err(MigrateError::Config(format!(
            "Identifier contains a null byte: {:?}",
            name
        )));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::Config(format!(
            "Identifier exceeds {} bytes: {:?}",
            MAX_IDENTIFIER_LENGTH, name
        )));
    }
    Ok(())
}

/// Quote a PostgreSQL identifier with double quotes.
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Fold a name the way PostgreSQL folds an unquoted identifier.
///
/// MySQL names keep their case, but the destination schema was created
/// with unquoted DDL, so `Is_Enabled` on the source is `is_enabled` here.
pub fn fold_pg(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Fold and then quote a PostgreSQL identifier.
pub fn quote_pg_folded(name: &str) -> Result<String> {
    quote_pg(&fold_pg(name))
}

/// Quote a MySQL identifier with backticks.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Schema-qualified PostgreSQL relation name.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg(schema)?, quote_pg(table)?))
}
