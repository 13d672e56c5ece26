//! Row transfer engine.
//!
//! A table is read from the source in full, converted, and written to the
//! destination in batches. Each batch is its own transaction. When a batch
//! fails the session is recovered and the same rows are retried one at a
//! time, so a single bad row costs only itself.

mod convert;
mod strategy;

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::MigrationConfig;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::error::Result;

pub use convert::apply_conversions;
pub use strategy::InsertStrategy;

/// How a table's transfer ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    /// Every source row was committed.
    Success,
    /// Some rows were committed, some were rejected.
    Partial,
    /// The source table had no rows; nothing was written.
    Skipped,
    /// No rows were committed.
    Failed,
}

/// Result of transferring one table.
#[derive(Debug, Clone, Serialize)]
pub struct TransferOutcome {
    pub table: String,

    /// Rows read from the source.
    pub rows_attempted: u64,

    /// Rows committed on the destination.
    pub rows_committed: u64,

    pub status: TransferStatus,

    /// Error that ended the transfer early, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Wall time spent on the table in milliseconds.
    pub duration_ms: u64,
}

impl TransferOutcome {
    fn finished(table: &str, attempted: u64, committed: u64, elapsed: Duration) -> Self {
        let status = if committed == attempted {
            TransferStatus::Success
        } else if committed == 0 {
            TransferStatus::Failed
        } else {
            TransferStatus::Partial
        };
        Self {
            table: table.to_string(),
            rows_attempted: attempted,
            rows_committed: committed,
            status,
            error: None,
            duration_ms: elapsed.as_millis() as u64,
        }
    }

    fn skipped(table: &str, elapsed: Duration) -> Self {
        Self {
            status: TransferStatus::Skipped,
            ..Self::finished(table, 0, 0, elapsed)
        }
    }

    fn failed(table: &str, message: String, elapsed: Duration) -> Self {
        Self {
            status: TransferStatus::Failed,
            error: Some(message),
            ..Self::finished(table, 0, 0, elapsed)
        }
    }
}

/// Moves tables from a [`SourceReader`] to a [`TargetWriter`].
pub struct TransferEngine<'a> {
    migration: &'a MigrationConfig,
}

impl<'a> TransferEngine<'a> {
    pub fn new(migration: &'a MigrationConfig) -> Self {
        Self { migration }
    }

    /// Transfer one table.
    ///
    /// Per-table problems are reported in the returned outcome. The only
    /// error returned is a destination session that could not be reopened.
    pub async fn transfer_table<S, T>(
        &self,
        source: &S,
        target: &mut T,
        table: &str,
    ) -> Result<TransferOutcome>
    where
        S: SourceReader + ?Sized,
        T: TargetWriter + ?Sized,
    {
        let started = Instant::now();
        info!("Migrating table: {}", table);

        let mut data = match source.read_table(table).await {
            Ok(data) => data,
            Err(e) => {
                error!("CRITICAL ERROR migrating table {}: {}", table, e);
                target.recover().await?;
                return Ok(TransferOutcome::failed(table, e.to_string(), started.elapsed()));
            }
        };

        if data.is_empty() {
            info!("Table {} is empty, skipping", table);
            return Ok(TransferOutcome::skipped(table, started.elapsed()));
        }
        debug!(
            "Read {} rows ({} columns) from {}",
            data.rows.len(),
            data.columns.len(),
            table
        );

        info!("Converting data types for table {}", table);
        let failures = apply_conversions(table, &mut data, self.migration);
        if failures > 0 {
            warn!("{} values in {} kept their original form", failures, table);
        }

        let columns = data.column_names();
        let attempted = data.rows.len() as u64;
        let batch_size = self.migration.batch_size.max(1);
        let progress_every = self.migration.progress_every_batches.max(1);
        let mut committed = 0u64;

        for (index, batch) in data.rows.chunks(batch_size).enumerate() {
            match InsertStrategy::Batch
                .apply(target, table, &columns, batch)
                .await
            {
                Ok(written) => committed += written,
                Err(e) => {
                    warn!(
                        "Error inserting batch {} into {}: {}. Retrying row by row",
                        index + 1,
                        table,
                        e
                    );
                    target.recover().await?;
                    committed += InsertStrategy::SingleRow
                        .apply(target, table, &columns, batch)
                        .await?;
                }
            }

            if (index + 1) % progress_every == 0 {
                info!("Table {}: migrated {} records", table, committed);
            }
        }

        let outcome = TransferOutcome::finished(table, attempted, committed, started.elapsed());
        match outcome.status {
            TransferStatus::Success => {
                info!("Table {} migrated successfully: {} records", table, committed)
            }
            _ => warn!(
                "Table {} migrated with errors: {} of {} records",
                table, committed, attempted
            ),
        }
        Ok(outcome)
    }
}
