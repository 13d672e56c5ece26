//! Collaborator traits used by the migration engine.
//!
//! - [`Introspect`]: read-only catalog questions both sides can answer
//! - [`SourceReader`]: lists tables and reads whole tables from the source
//! - [`TargetWriter`]: the destination session, including transaction control
//!   and recovery from a poisoned session
//!
//! The engine components are generic over these traits so they can run
//! against the real drivers or an in-memory double.

use std::fmt;

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::Result;

use super::schema::TableData;
use super::value::Row;

/// Which SQL dialect a connection speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Dialect {
    Mysql,
    Postgres,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "MySQL"),
            Dialect::Postgres => write!(f, "PostgreSQL"),
        }
    }
}

/// Catalog questions about a named relation.
///
/// These return raw results; the advisory defaults (false, -1, "N/A") are
/// applied by [`crate::probe`].
#[async_trait]
pub trait Introspect: Send + Sync {
    /// Dialect of the underlying connection.
    fn dialect(&self) -> Dialect;

    /// Whether a table or view with this name exists in the working schema.
    async fn relation_exists(&self, name: &str) -> Result<bool>;

    /// Exact row count.
    async fn row_count(&self, name: &str) -> Result<i64>;

    /// Human-readable on-disk size, data plus indexes.
    async fn relation_size(&self, name: &str) -> Result<String>;

    /// Round-trip a trivial query.
    async fn ping(&self) -> Result<()>;
}

/// Read access to the source database.
#[async_trait]
pub trait SourceReader: Introspect {
    /// All base table names in the source database.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Read every row of a table along with its columns in ordinal order.
    async fn read_table(&self, table: &str) -> Result<TableData>;

    /// Release the connection.
    async fn close(&self);
}

/// The destination session.
///
/// Statements run in autocommit mode unless bracketed by [`begin`] and
/// [`commit`]/[`rollback`].
///
/// [`begin`]: TargetWriter::begin
/// [`commit`]: TargetWriter::commit
/// [`rollback`]: TargetWriter::rollback
#[async_trait]
pub trait TargetWriter: Introspect {
    /// Whether the name refers to a view in the working schema.
    async fn is_view(&self, name: &str) -> Result<bool>;

    /// All BASE TABLE names in the working schema.
    async fn list_base_tables(&self) -> Result<Vec<String>>;

    /// Whether a sequence with this name exists in the working schema.
    async fn sequence_exists(&self, name: &str) -> Result<bool>;

    /// Largest value of an integer key column, 0 for an empty table.
    async fn max_key(&self, table: &str, column: &str) -> Result<i64>;

    async fn begin(&mut self) -> Result<()>;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Toggle foreign-key and trigger enforcement for this session.
    async fn set_referential_checks(&mut self, enabled: bool) -> Result<()>;

    /// Truncate a table and everything that references it.
    async fn truncate_cascade(&mut self, table: &str) -> Result<()>;

    /// Insert rows with multi-row INSERT statements. Returns rows written.
    async fn insert_rows(&mut self, table: &str, columns: &[String], rows: &[Row]) -> Result<u64>;

    /// Set a sequence so its next value follows `value`.
    async fn set_sequence(&mut self, sequence: &str, value: i64) -> Result<()>;

    /// Whether the underlying connection has gone away.
    fn is_closed(&self) -> bool;

    /// Discard the session and open a fresh one with the same settings.
    async fn reopen(&mut self) -> Result<()>;

    /// Release the connection.
    async fn close(&mut self);

    /// Abort any open transaction, reopening the session if it cannot be
    /// brought back to a usable state. Errors only if the reopen fails.
    async fn recover(&mut self) -> Result<()> {
        if self.is_closed() {
            warn!("Destination session is closed, reopening");
            return self.reopen().await;
        }
        if let Err(e) = self.rollback().await {
            warn!("Rollback failed ({}), reopening destination session", e);
            self.reopen().await?;
        }
        Ok(())
    }
}
