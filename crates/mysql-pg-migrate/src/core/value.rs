//! SQL value types for dialect-neutral row transfer.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// Type hint carried by NULL values so the encoder knows what was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlNullType {
    Bool,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Bytes,
    Decimal,
    DateTime,
    Date,
    Time,
}

/// A single column value read from the source.
///
/// Values are owned: a table is read in full before it is written, so there
/// is no source buffer to borrow from.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL with type hint.
    Null(SqlNullType),

    /// Boolean value.
    Bool(bool),

    /// 16-bit signed integer (tinyint/smallint).
    I16(i16),

    /// 32-bit signed integer (mediumint/int).
    I32(i32),

    /// 64-bit signed integer (bigint).
    I64(i64),

    /// 32-bit floating point.
    F32(f32),

    /// 64-bit floating point.
    F64(f64),

    /// Text/string data.
    Text(String),

    /// Binary data.
    Bytes(Vec<u8>),

    /// Decimal value with arbitrary precision.
    Decimal(Decimal),

    /// Timestamp without timezone.
    DateTime(NaiveDateTime),

    /// Date without time component.
    Date(NaiveDate),

    /// Time without date component.
    Time(NaiveTime),
}

impl SqlValue {
    /// Check if this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null(_))
    }

    /// Integer view of the value, if it holds an integer.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::I16(v) => Some(i64::from(*v)),
            SqlValue::I32(v) => Some(i64::from(*v)),
            SqlValue::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Short variant name used in encoder error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            SqlValue::Null(_) => "null",
            SqlValue::Bool(_) => "bool",
            SqlValue::I16(_) => "int2",
            SqlValue::I32(_) => "int4",
            SqlValue::I64(_) => "int8",
            SqlValue::F32(_) => "float4",
            SqlValue::F64(_) => "float8",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Decimal(_) => "decimal",
            SqlValue::DateTime(_) => "datetime",
            SqlValue::Date(_) => "date",
            SqlValue::Time(_) => "time",
        }
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null(_) => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{}", v),
            SqlValue::I16(v) => write!(f, "{}", v),
            SqlValue::I32(v) => write!(f, "{}", v),
            SqlValue::I64(v) => write!(f, "{}", v),
            SqlValue::F32(v) => write!(f, "{}", v),
            SqlValue::F64(v) => write!(f, "{}", v),
            SqlValue::Text(v) => write!(f, "'{}'", v),
            SqlValue::Bytes(v) => write!(f, "<{} bytes>", v.len()),
            SqlValue::Decimal(v) => write!(f, "{}", v),
            SqlValue::DateTime(v) => write!(f, "'{}'", v),
            SqlValue::Date(v) => write!(f, "'{}'", v),
            SqlValue::Time(v) => write!(f, "'{}'", v),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<i16> for SqlValue {
    fn from(v: i16) -> Self {
        SqlValue::I16(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::I32(v)
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::I64(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        SqlValue::Bytes(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null(SqlNullType::String),
        }
    }
}

/// A row of values in source column order.
pub type Row = Vec<SqlValue>;

/// Maximum characters of a row shown when it is logged.
pub const ROW_PREVIEW_LIMIT: usize = 500;

/// Render a row for logging, truncated to [`ROW_PREVIEW_LIMIT`] characters.
pub fn row_preview(row: &[SqlValue]) -> String {
    let rendered = format!(
        "({})",
        row.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );
    rendered.chars().take(ROW_PREVIEW_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_null() {
        assert!(SqlValue::Null(SqlNullType::Bytes).is_null());
        assert!(!SqlValue::Text(String::new()).is_null());
    }

    #[test]
    fn test_as_i64_widens_integers() {
        assert_eq!(SqlValue::I16(-3).as_i64(), Some(-3));
        assert_eq!(SqlValue::I32(70_000).as_i64(), Some(70_000));
        assert_eq!(SqlValue::Text("1".into()).as_i64(), None);
    }

    #[test]
    fn test_from_option() {
        assert_eq!(SqlValue::from(Some(5i64)), SqlValue::I64(5));
        assert!(SqlValue::from(None::<i64>).is_null());
    }

    #[test]
    fn test_row_preview_formats_values() {
        let row = vec![
            SqlValue::I64(7),
            SqlValue::Text("admin".into()),
            SqlValue::Null(SqlNullType::String),
            SqlValue::Bytes(vec![1, 2, 3]),
        ];
        assert_eq!(row_preview(&row), "(7, 'admin', NULL, <3 bytes>)");
    }

    #[test]
    fn test_row_preview_truncates() {
        let row = vec![SqlValue::Text("x".repeat(2_000))];
        assert_eq!(row_preview(&row).chars().count(), ROW_PREVIEW_LIMIT);
    }
}
