//! Table metadata and in-memory table contents.

use serde::{Deserialize, Serialize};

use super::value::Row;

/// A source column: name and 1-based ordinal position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ordinal: i32,
    /// Source data type (e.g. "tinyint", "varchar").
    pub data_type: String,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, ordinal: i32, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ordinal,
            data_type: data_type.into(),
        }
    }
}

/// Every row of one source table together with its ordered columns.
///
/// Column metadata is read alongside the rows for each table and never
/// cached between tables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableData {
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<Row>,
}

impl TableData {
    /// Column names in ordinal order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Position of a column within each row.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::SqlValue;

    #[test]
    fn test_column_lookup() {
        let data = TableData {
            columns: vec![
                ColumnDescriptor::new("id", 1, "bigint"),
                ColumnDescriptor::new("is_enabled", 2, "tinyint"),
            ],
            rows: vec![vec![SqlValue::I64(1), SqlValue::I16(1)]],
        };
        assert_eq!(data.column_index("is_enabled"), Some(1));
        assert_eq!(data.column_index("missing"), None);
        assert_eq!(data.column_names(), vec!["id", "is_enabled"]);
        assert!(!data.is_empty());
    }
}
