//! Per-column value conversions applied before insert.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::{ConversionKind, MigrationConfig};
use crate::core::schema::TableData;
use crate::core::value::{SqlNullType, SqlValue};
use crate::error::MigrateError;

impl ConversionKind {
    /// Convert one value. An `Err` leaves the caller to keep the original.
    pub fn apply(&self, value: &SqlValue) -> std::result::Result<SqlValue, String> {
        match self {
            ConversionKind::Boolean => Ok(to_boolean(value)),
            ConversionKind::Utf8Text => to_utf8_text(value),
        }
    }
}

/// 1 is true, 0 is false, everything else is NULL.
fn to_boolean(value: &SqlValue) -> SqlValue {
    let flag = match value {
        SqlValue::Bool(b) => Some(*b),
        SqlValue::I16(_) | SqlValue::I32(_) | SqlValue::I64(_) => match value.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        SqlValue::Decimal(d) if *d == Decimal::ONE => Some(true),
        SqlValue::Decimal(d) if d.is_zero() => Some(false),
        SqlValue::F32(f) if *f == 1.0 => Some(true),
        SqlValue::F32(f) if *f == 0.0 => Some(false),
        SqlValue::F64(f) if *f == 1.0 => Some(true),
        SqlValue::F64(f) if *f == 0.0 => Some(false),
        _ => None,
    };
    flag.map_or(SqlValue::Null(SqlNullType::Bool), SqlValue::Bool)
}

fn to_utf8_text(value: &SqlValue) -> std::result::Result<SqlValue, String> {
    match value {
        SqlValue::Bytes(bytes) => String::from_utf8(bytes.clone())
            .map(SqlValue::Text)
            .map_err(|e| format!("invalid UTF-8: {}", e)),
        SqlValue::Null(_) => Ok(SqlValue::Null(SqlNullType::String)),
        other => Ok(other.clone()),
    }
}

/// Apply the configured conversions for `table` to every row in place.
///
/// Rules naming a column the table does not have are ignored. A value that
/// fails to convert is logged and left unchanged. Returns the number of
/// values that failed.
pub fn apply_conversions(table: &str, data: &mut TableData, migration: &MigrationConfig) -> usize {
    let targets: Vec<(ConversionKind, &str, usize)> = migration
        .conversions_for(table)
        .into_iter()
        .filter_map(|(kind, column)| data.column_index(column).map(|idx| (kind, column, idx)))
        .collect();
    if targets.is_empty() {
        return 0;
    }

    let mut failures = 0;
    for row in &mut data.rows {
        for &(kind, column, idx) in &targets {
            let Some(value) = row.get_mut(idx) else {
                continue;
            };
            match kind.apply(value) {
                Ok(converted) => *value = converted,
                Err(message) => {
                    failures += 1;
                    warn!("{}", MigrateError::conversion(table, column, message));
                }
            }
        }
    }
    failures
}
