//! MySQL/MariaDB source reader implementation.
//!
//! Implements `SourceReader` over a single-connection SQLx pool. Tables are
//! read in full with an explicit column list so values line up with the
//! ordinal column order from INFORMATION_SCHEMA.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::{Row, ValueRef};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::identifier::quote_mysql;
use crate::core::schema::{ColumnDescriptor, TableData};
use crate::core::traits::{Dialect, Introspect, SourceReader};
use crate::core::value::{Row as ValueRow, SqlNullType, SqlValue};
use crate::error::{MigrateError, Result};

/// Connection acquire timeout.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Column metadata needed to decode a value.
#[derive(Debug, Clone)]
struct SourceColumn {
    name: String,
    ordinal: i32,
    data_type: String,
    unsigned: bool,
}

/// MySQL/MariaDB source reader implementation.
pub struct MysqlReader {
    pool: MySqlPool,
    database: String,
}

impl MysqlReader {
    /// Connect to the source database described by the configuration.
    pub async fn new(config: &SourceConfig) -> Result<Self> {
        let options = Self::connect_options(config);

        // One logical connection for the whole run.
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| MigrateError::connection(e, "connecting to MySQL source"))?;

        sqlx::query("SELECT 1")
            .fetch_one(&pool)
            .await
            .map_err(|e| MigrateError::connection(e, "testing MySQL source connection"))?;

        info!(
            "Connected to MySQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }

    /// Session options. The server's own time zone is kept so TIMESTAMP
    /// columns read back as the server presents them.
    fn connect_options(config: &SourceConfig) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .charset(&config.charset)
            .timezone(None::<String>)
            .ssl_mode(MySqlSslMode::Preferred)
    }

    /// Load columns for a table in ordinal order.
    async fn load_columns(&self, table: &str) -> Result<Vec<SourceColumn>> {
        // CAST to CHAR to avoid collation-dependent binary strings
        let query = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
                CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE,
                CAST(COLUMN_TYPE AS CHAR(255)) AS COLUMN_TYPE,
                CAST(ORDINAL_POSITION AS SIGNED) AS ORDINAL_POSITION
            FROM INFORMATION_SCHEMA.COLUMNS
            WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| -> Result<SourceColumn> {
                let column_type: String = row.try_get("COLUMN_TYPE")?;
                let ordinal: i64 = row.try_get("ORDINAL_POSITION")?;
                Ok(SourceColumn {
                    name: row.try_get("COLUMN_NAME")?,
                    ordinal: ordinal as i32,
                    data_type: row.try_get::<String, _>("DATA_TYPE")?.to_lowercase(),
                    unsigned: column_type.to_lowercase().contains("unsigned"),
                })
            })
            .collect()
    }

    /// Convert a MySQL row to values using the column metadata.
    fn row_to_values(row: &MySqlRow, columns: &[SourceColumn]) -> ValueRow {
        columns
            .iter()
            .enumerate()
            .map(|(i, col)| Self::decode(row, i, col))
            .collect()
    }

    fn decode(row: &MySqlRow, i: usize, col: &SourceColumn) -> SqlValue {
        let null_type = Self::null_type_for(&col.data_type, col.unsigned);

        let is_null = row.try_get_raw(i).map(|r| r.is_null()).unwrap_or(true);
        if is_null {
            return SqlValue::Null(null_type);
        }

        let decoded = match (col.data_type.as_str(), col.unsigned) {
            // Integer types; unsigned values move up one width
            ("tinyint", false) => row.try_get::<i8, _>(i).map(|v| SqlValue::I16(v as i16)),
            ("tinyint", true) => row.try_get::<u8, _>(i).map(|v| SqlValue::I16(v as i16)),
            ("smallint", false) => row.try_get::<i16, _>(i).map(SqlValue::I16),
            ("smallint", true) => row.try_get::<u16, _>(i).map(|v| SqlValue::I32(v as i32)),
            ("mediumint" | "int" | "integer", false) => row.try_get::<i32, _>(i).map(SqlValue::I32),
            ("mediumint" | "int" | "integer", true) => {
                row.try_get::<u32, _>(i).map(|v| SqlValue::I64(v as i64))
            }
            ("bigint", false) => row.try_get::<i64, _>(i).map(SqlValue::I64),
            ("bigint", true) => row.try_get::<u64, _>(i).map(|v| match i64::try_from(v) {
                Ok(v) => SqlValue::I64(v),
                Err(_) => SqlValue::Decimal(rust_decimal::Decimal::from(v)),
            }),

            // Floating point
            ("float", _) => row.try_get::<f32, _>(i).map(SqlValue::F32),
            ("double" | "real", _) => row.try_get::<f64, _>(i).map(SqlValue::F64),

            // Decimal
            ("decimal" | "numeric", _) => row
                .try_get::<rust_decimal::Decimal, _>(i)
                .map(SqlValue::Decimal),

            // Boolean
            ("bit" | "boolean" | "bool", _) => row.try_get::<bool, _>(i).map(SqlValue::Bool),

            // Binary types
            ("binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob", _) => {
                row.try_get::<Vec<u8>, _>(i).map(SqlValue::Bytes)
            }

            // Date/Time types. Zero dates and out-of-range times cannot be
            // represented and are read as NULL.
            ("date", _) => {
                return row
                    .try_get::<chrono::NaiveDate, _>(i)
                    .map(SqlValue::Date)
                    .unwrap_or(SqlValue::Null(null_type))
            }
            ("time", _) => {
                return row
                    .try_get::<chrono::NaiveTime, _>(i)
                    .map(SqlValue::Time)
                    .unwrap_or(SqlValue::Null(null_type))
            }
            ("datetime" | "timestamp", _) => {
                return row
                    .try_get::<chrono::NaiveDateTime, _>(i)
                    .map(SqlValue::DateTime)
                    .unwrap_or(SqlValue::Null(null_type))
            }

            // Strings, JSON, enum, set and anything else
            _ => row.try_get::<String, _>(i).map(SqlValue::Text),
        };

        decoded.unwrap_or_else(|e| {
            debug!(
                "Decoding {} ({}) as its declared type failed: {}",
                col.name, col.data_type, e
            );
            Self::decode_fallback(row, i, null_type)
        })
    }

    /// Last-resort decoding: text, then raw bytes, then NULL.
    fn decode_fallback(row: &MySqlRow, i: usize, null_type: SqlNullType) -> SqlValue {
        if let Ok(s) = row.try_get::<String, _>(i) {
            return SqlValue::Text(s);
        }
        match row.try_get_unchecked::<Vec<u8>, _>(i) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(s) => SqlValue::Text(s),
                Err(e) => SqlValue::Bytes(e.into_bytes()),
            },
            Err(_) => SqlValue::Null(null_type),
        }
    }

    /// Get the appropriate null type for a MySQL data type.
    fn null_type_for(data_type: &str, unsigned: bool) -> SqlNullType {
        match (data_type, unsigned) {
            ("tinyint", _) | ("smallint", false) => SqlNullType::I16,
            ("smallint", true) | ("mediumint" | "int" | "integer", false) => SqlNullType::I32,
            ("mediumint" | "int" | "integer", true) | ("bigint", _) => SqlNullType::I64,
            ("float", _) => SqlNullType::F32,
            ("double" | "real", _) => SqlNullType::F64,
            ("decimal" | "numeric", _) => SqlNullType::Decimal,
            ("bit" | "boolean" | "bool", _) => SqlNullType::Bool,
            ("binary" | "varbinary" | "blob" | "tinyblob" | "mediumblob" | "longblob", _) => {
                SqlNullType::Bytes
            }
            ("date", _) => SqlNullType::Date,
            ("time", _) => SqlNullType::Time,
            ("datetime" | "timestamp", _) => SqlNullType::DateTime,
            _ => SqlNullType::String,
        }
    }
}

#[async_trait]
impl Introspect for MysqlReader {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn relation_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn row_count(&self, name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_mysql(name)?);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn relation_size(&self, name: &str) -> Result<String> {
        let size: Option<String> = sqlx::query_scalar(
            "SELECT CAST(CONCAT(ROUND((DATA_LENGTH + INDEX_LENGTH) / 1024 / 1024, 2), ' MB') AS CHAR) \
             FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;
        Ok(size.unwrap_or_else(|| "N/A".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SourceReader for MysqlReader {
    async fn list_tables(&self) -> Result<Vec<String>> {
        // Views are listed too; the skip set decides what is migrated.
        let tables: Vec<String> = sqlx::query_scalar(
            "SELECT CAST(TABLE_NAME AS CHAR(255)) FROM information_schema.TABLES \
             WHERE TABLE_SCHEMA = DATABASE() ORDER BY TABLE_NAME",
        )
        .fetch_all(&self.pool)
        .await?;
        debug!("Found {} relations in MySQL source", tables.len());
        Ok(tables)
    }

    async fn read_table(&self, table: &str) -> Result<TableData> {
        let columns = self.load_columns(table).await?;
        if columns.is_empty() {
            return Err(MigrateError::transfer(table, "no columns found in source"));
        }

        let col_list = columns
            .iter()
            .map(|c| quote_mysql(&c.name))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let sql = format!("SELECT {} FROM {}", col_list, quote_mysql(table)?);

        let rows: Vec<MySqlRow> = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let rows = rows
            .iter()
            .map(|row| Self::row_to_values(row, &columns))
            .collect();

        Ok(TableData {
            columns: columns
                .into_iter()
                .map(|c| ColumnDescriptor::new(c.name, c.ordinal, c.data_type))
                .collect(),
            rows,
        })
    }

    async fn close(&self) {
        self.pool.close().await;
        debug!("Closed MySQL source connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_keep_server_time_zone() {
        let config = SourceConfig {
            host: "mysql.local".into(),
            port: 3307,
            database: "ranger".into(),
            user: "ranger".into(),
            password: "secret".into(),
            charset: "utf8".into(),
        };
        let options = MysqlReader::connect_options(&config);
        let rendered = format!("{:?}", options);
        assert!(rendered.contains("port: 3307"));
        assert!(rendered.contains("timezone: None"));
    }

    #[test]
    fn test_null_type_for_signed_and_unsigned() {
        assert_eq!(MysqlReader::null_type_for("tinyint", false), SqlNullType::I16);
        assert_eq!(MysqlReader::null_type_for("smallint", true), SqlNullType::I32);
        assert_eq!(MysqlReader::null_type_for("int", false), SqlNullType::I32);
        assert_eq!(MysqlReader::null_type_for("int", true), SqlNullType::I64);
        assert_eq!(MysqlReader::null_type_for("bigint", true), SqlNullType::I64);
    }

    #[test]
    fn test_null_type_for_other_types() {
        assert_eq!(MysqlReader::null_type_for("longblob", false), SqlNullType::Bytes);
        assert_eq!(MysqlReader::null_type_for("datetime", false), SqlNullType::DateTime);
        assert_eq!(MysqlReader::null_type_for("decimal", false), SqlNullType::Decimal);
        assert_eq!(MysqlReader::null_type_for("varchar", false), SqlNullType::String);
        assert_eq!(MysqlReader::null_type_for("json", false), SqlNullType::String);
    }
}
