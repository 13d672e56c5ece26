//! PostgreSQL target writer implementation.
//!
//! Implements `TargetWriter` on a single `tokio_postgres` client whose
//! connection future is driven by a spawned task. The client can be
//! replaced in place when the session is lost or stuck in a failed
//! transaction.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, Config as PgConfig, NoTls};
use tracing::{debug, info, warn};

use crate::config::TargetConfig;
use crate::core::identifier::{fold_pg, qualify_pg, quote_pg_folded};
use crate::core::traits::{Dialect, Introspect, TargetWriter};
use crate::core::value::Row;
use crate::drivers::common::TlsBuilder;
use crate::error::{MigrateError, Result};

/// Connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bind parameter limit of the PostgreSQL wire protocol.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// PostgreSQL target writer implementation.
pub struct PostgresWriter {
    config: TargetConfig,
    client: Client,
    connection: JoinHandle<()>,
}

impl PostgresWriter {
    /// Connect to the target database described by the configuration.
    pub async fn new(config: &TargetConfig) -> Result<Self> {
        let (client, connection) = Self::connect(config).await?;

        info!(
            "Connected to PostgreSQL target: {}:{}/{} (schema {})",
            config.host, config.port, config.database, config.schema
        );

        Ok(Self {
            config: config.clone(),
            client,
            connection,
        })
    }

    async fn connect(config: &TargetConfig) -> Result<(Client, JoinHandle<()>)> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("mysql-pg-migrate");
        pg_config.keepalives(true);
        pg_config.keepalives_idle(Duration::from_secs(30));
        pg_config.connect_timeout(CONNECT_TIMEOUT);

        let (client, connection) = match TlsBuilder::parse(&config.ssl_mode)?.build()? {
            None => {
                warn!("PostgreSQL TLS is disabled. Credentials will be transmitted in plaintext.");
                let (client, conn) = pg_config
                    .connect(NoTls)
                    .await
                    .map_err(|e| MigrateError::connection(e, "connecting to PostgreSQL target"))?;
                let handle = tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        warn!("PostgreSQL connection ended with error: {}", e);
                    }
                });
                (client, handle)
            }
            Some(tls) => {
                let (client, conn) = pg_config
                    .connect(tls)
                    .await
                    .map_err(|e| MigrateError::connection(e, "connecting to PostgreSQL target"))?;
                let handle = tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        warn!("PostgreSQL connection ended with error: {}", e);
                    }
                });
                (client, handle)
            }
        };

        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| MigrateError::connection(e, "testing PostgreSQL target connection"))?;

        Ok((client, connection))
    }

    fn schema(&self) -> &str {
        &self.config.schema
    }

    fn qualify(&self, table: &str) -> Result<String> {
        qualify_pg(self.schema(), &fold_pg(table))
    }

    /// Source column names folded and quoted for an INSERT column list.
    pub fn quote_columns(columns: &[String]) -> Result<Vec<String>> {
        columns.iter().map(|c| quote_pg_folded(c)).collect()
    }

    /// Rows per INSERT statement that stay under the bind parameter limit.
    pub fn rows_per_statement(column_count: usize) -> usize {
        (MAX_BIND_PARAMS / column_count.max(1)).max(1)
    }

    /// `INSERT INTO t (cols) VALUES ($1, $2), ($3, $4), ...` for `row_count` rows.
    pub fn build_insert(qualified_table: &str, quoted_cols: &[String], row_count: usize) -> String {
        let width = quoted_cols.len();
        let mut sql = format!(
            "INSERT INTO {} ({}) VALUES ",
            qualified_table,
            quoted_cols.join(", ")
        );
        for r in 0..row_count {
            if r > 0 {
                sql.push_str(", ");
            }
            sql.push('(');
            for c in 0..width {
                if c > 0 {
                    sql.push_str(", ");
                }
                sql.push('$');
                sql.push_str(&(r * width + c + 1).to_string());
            }
            sql.push(')');
        }
        sql
    }
}

#[async_trait]
impl Introspect for PostgresWriter {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn relation_exists(&self, name: &str) -> Result<bool> {
        let sql = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )
        "#;
        let row = self.client.query_one(sql, &[&self.schema(), &fold_pg(name)]).await?;
        Ok(row.get::<_, bool>(0))
    }

    async fn row_count(&self, name: &str) -> Result<i64> {
        let sql = format!("SELECT COUNT(*)::int8 FROM {}", self.qualify(name)?);
        let row = self.client.query_one(&sql, &[]).await?;
        Ok(row.get::<_, i64>(0))
    }

    async fn relation_size(&self, name: &str) -> Result<String> {
        let sql = "SELECT pg_size_pretty(pg_total_relation_size(format('%I.%I', $1::text, $2::text)::regclass))";
        let row = self.client.query_one(sql, &[&self.schema(), &fold_pg(name)]).await?;
        Ok(row
            .get::<_, Option<String>>(0)
            .unwrap_or_else(|| "N/A".to_string()))
    }

    async fn ping(&self) -> Result<()> {
        self.client.simple_query("SELECT 1").await?;
        Ok(())
    }
}

#[async_trait]
impl TargetWriter for PostgresWriter {
    async fn is_view(&self, name: &str) -> Result<bool> {
        let sql = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.views
                WHERE table_schema = $1 AND table_name = $2
            )
        "#;
        let row = self.client.query_one(sql, &[&self.schema(), &fold_pg(name)]).await?;
        Ok(row.get::<_, bool>(0))
    }

    async fn list_base_tables(&self) -> Result<Vec<String>> {
        let sql = r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;
        let rows = self.client.query(sql, &[&self.schema()]).await?;
        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    async fn sequence_exists(&self, name: &str) -> Result<bool> {
        let sql = r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.sequences
                WHERE sequence_schema = $1 AND sequence_name = $2
            )
        "#;
        let row = self.client.query_one(sql, &[&self.schema(), &fold_pg(name)]).await?;
        Ok(row.get::<_, bool>(0))
    }

    async fn max_key(&self, table: &str, column: &str) -> Result<i64> {
        let sql = format!(
            "SELECT COALESCE(MAX({}), 0)::int8 FROM {}",
            quote_pg_folded(column)?,
            self.qualify(table)?
        );
        let row = self.client.query_one(&sql, &[]).await?;
        Ok(row.get::<_, i64>(0))
    }

    async fn begin(&mut self) -> Result<()> {
        self.client.simple_query("BEGIN").await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.client.simple_query("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        self.client.simple_query("ROLLBACK").await?;
        Ok(())
    }

    async fn set_referential_checks(&mut self, enabled: bool) -> Result<()> {
        let role = if enabled { "origin" } else { "replica" };
        self.client
            .simple_query(&format!("SET session_replication_role = '{}'", role))
            .await?;
        Ok(())
    }

    async fn truncate_cascade(&mut self, table: &str) -> Result<()> {
        let sql = format!("TRUNCATE TABLE {} CASCADE", self.qualify(table)?);
        self.client.simple_query(&sql).await?;
        debug!("Truncated {}.{}", self.schema(), table);
        Ok(())
    }

    async fn insert_rows(&mut self, table: &str, columns: &[String], rows: &[Row]) -> Result<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        if columns.is_empty() {
            return Err(MigrateError::transfer(table, "insert with no columns"));
        }

        let qualified = self.qualify(table)?;
        let quoted_cols = Self::quote_columns(columns)?;

        let mut written = 0u64;
        for chunk in rows.chunks(Self::rows_per_statement(columns.len())) {
            if let Some(bad) = chunk.iter().find(|r| r.len() != columns.len()) {
                return Err(MigrateError::transfer(
                    table,
                    format!(
                        "row has {} values for {} columns",
                        bad.len(),
                        columns.len()
                    ),
                ));
            }

            let sql = Self::build_insert(&qualified, &quoted_cols, chunk.len());
            let params: Vec<&(dyn ToSql + Sync)> = chunk
                .iter()
                .flat_map(|row| row.iter().map(|v| v as &(dyn ToSql + Sync)))
                .collect();
            written += self.client.execute(sql.as_str(), &params).await?;
        }

        Ok(written)
    }

    async fn set_sequence(&mut self, sequence: &str, value: i64) -> Result<()> {
        let qualified = self.qualify(sequence)?;
        self.client
            .query_one("SELECT setval($1::text::regclass, $2::int8)", &[&qualified, &value])
            .await?;
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.client.is_closed()
    }

    async fn reopen(&mut self) -> Result<()> {
        info!("Reopening PostgreSQL target connection");
        let (client, connection) = Self::connect(&self.config).await?;
        self.connection.abort();
        self.client = client;
        self.connection = connection;
        Ok(())
    }

    async fn close(&mut self) {
        self.connection.abort();
        debug!("Closed PostgreSQL target connection");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_insert_numbers_placeholders_row_major() {
        let cols = vec!["\"id\"".to_string(), "\"name\"".to_string()];
        let sql = PostgresWriter::build_insert("\"public\".\"x_user\"", &cols, 2);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"x_user\" (\"id\", \"name\") VALUES ($1, $2), ($3, $4)"
        );
    }

    #[test]
    fn test_mixed_case_source_columns_match_folded_destination() {
        let cols = vec!["ID".to_string(), "Is_Enabled".to_string()];
        let quoted = PostgresWriter::quote_columns(&cols).unwrap();
        assert_eq!(quoted, vec!["\"id\"", "\"is_enabled\""]);

        let sql = PostgresWriter::build_insert("\"public\".\"p_svc\"", &quoted, 1);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"p_svc\" (\"id\", \"is_enabled\") VALUES ($1, $2)"
        );
    }

    #[test]
    fn test_rows_per_statement_respects_bind_limit() {
        assert_eq!(PostgresWriter::rows_per_statement(1), MAX_BIND_PARAMS);
        assert_eq!(PostgresWriter::rows_per_statement(10), 6_553);
        assert!(PostgresWriter::rows_per_statement(30) * 30 <= MAX_BIND_PARAMS);
        assert_eq!(PostgresWriter::rows_per_statement(100_000), 1);
        assert_eq!(PostgresWriter::rows_per_statement(0), MAX_BIND_PARAMS);
    }
}
