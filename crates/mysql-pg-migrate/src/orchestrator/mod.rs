//! Migration orchestrator: reset, transfer and sequence reconciliation in
//! one sequential run.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::core::traits::{Introspect, SourceReader, TargetWriter};
use crate::drivers::{MysqlReader, PostgresWriter};
use crate::error::Result;
use crate::ordering;
use crate::reset;
use crate::sequences;
use crate::transfer::{TransferEngine, TransferOutcome, TransferStatus};
use crate::verify::{VerifyReport, Verifier};

/// Summary of a migration run.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed" or "dry_run".
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the migration started.
    pub started_at: DateTime<Utc>,

    /// When the migration completed.
    pub completed_at: DateTime<Utc>,

    /// Tables in the resolved order.
    pub tables_total: usize,

    /// Tables with every row committed.
    pub tables_success: usize,

    /// Tables with some rows rejected.
    pub tables_partial: usize,

    /// Tables skipped because the source was empty.
    pub tables_skipped: usize,

    /// Tables with no rows committed.
    pub tables_failed: usize,

    /// Rows committed across all tables.
    pub rows_transferred: u64,

    /// Average throughput (rows/second).
    pub rows_per_second: u64,

    /// Destination tables cleared before the load.
    pub tables_truncated: usize,

    /// Sequences advanced after the load.
    pub sequences_updated: usize,

    /// List of failed table names.
    pub failed_tables: Vec<String>,

    /// Tables in load order.
    pub table_order: Vec<String>,

    /// Per-table transfer outcomes, in load order.
    pub table_outcomes: Vec<TransferOutcome>,
}

impl MigrationResult {
    fn new(
        run_id: String,
        started_at: DateTime<Utc>,
        table_order: Vec<String>,
        table_outcomes: Vec<TransferOutcome>,
    ) -> Self {
        let completed_at = Utc::now();
        let duration = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let count = |status: TransferStatus| {
            table_outcomes
                .iter()
                .filter(|o| o.status == status)
                .count()
        };
        let rows_transferred: u64 = table_outcomes.iter().map(|o| o.rows_committed).sum();
        let rows_per_second = if duration > 0.0 {
            (rows_transferred as f64 / duration) as u64
        } else {
            0
        };

        Self {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration,
            started_at,
            completed_at,
            tables_total: table_order.len(),
            tables_success: count(TransferStatus::Success),
            tables_partial: count(TransferStatus::Partial),
            tables_skipped: count(TransferStatus::Skipped),
            tables_failed: count(TransferStatus::Failed),
            rows_transferred,
            rows_per_second,
            tables_truncated: 0,
            sequences_updated: 0,
            failed_tables: table_outcomes
                .iter()
                .filter(|o| o.status == TransferStatus::Failed)
                .map(|o| o.table.clone())
                .collect(),
            table_order,
            table_outcomes,
        }
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Connection status of both databases.
#[derive(Debug, Clone, Serialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// Connect to both databases and time a trivial query on each.
///
/// Connection failures are reported in the result rather than returned.
pub async fn health_check(config: &Config) -> HealthCheckResult {
    let started = Instant::now();
    let source = match MysqlReader::new(&config.source).await {
        Ok(source) => {
            let ping = source.ping().await;
            source.close().await;
            ping
        }
        Err(e) => Err(e),
    };
    let source_latency_ms = started.elapsed().as_millis() as u64;

    let started = Instant::now();
    let target = match PostgresWriter::new(&config.target).await {
        Ok(mut target) => {
            let ping = target.ping().await;
            target.close().await;
            ping
        }
        Err(e) => Err(e),
    };
    let target_latency_ms = started.elapsed().as_millis() as u64;

    HealthCheckResult {
        source_connected: source.is_ok(),
        source_latency_ms,
        source_error: source.as_ref().err().map(|e| e.to_string()),
        target_connected: target.is_ok(),
        target_latency_ms,
        target_error: target.as_ref().err().map(|e| e.to_string()),
        healthy: source.is_ok() && target.is_ok(),
    }
}

/// Migration orchestrator.
///
/// Owns both connections for the duration of a run and closes them on
/// every exit path of [`run`](Orchestrator::run) and
/// [`verify`](Orchestrator::verify).
pub struct Orchestrator<S, T> {
    config: Config,
    source: S,
    target: T,
}

impl Orchestrator<MysqlReader, PostgresWriter> {
    /// Open the source and destination connections.
    pub async fn new(config: Config) -> Result<Self> {
        info!("Connecting to MySQL...");
        let source = MysqlReader::new(&config.source).await?;

        info!("Connecting to PostgreSQL...");
        let target = match PostgresWriter::new(&config.target).await {
            Ok(target) => target,
            Err(e) => {
                source.close().await;
                return Err(e);
            }
        };

        Ok(Self::with_connections(config, source, target))
    }
}

impl<S, T> Orchestrator<S, T>
where
    S: SourceReader,
    T: TargetWriter,
{
    /// Build an orchestrator around already-open connections.
    pub fn with_connections(config: Config, source: S, target: T) -> Self {
        Self {
            config,
            source,
            target,
        }
    }

    /// Run the migration. With `dry_run` only the table order is resolved
    /// and logged; nothing is written.
    pub async fn run(mut self, dry_run: bool) -> Result<MigrationResult> {
        let result = self.execute(dry_run).await;
        if let Err(ref e) = result {
            error!("CRITICAL ERROR: {}", e);
        }
        self.source.close().await;
        self.target.close().await;
        info!("Database connections closed");
        result
    }

    /// Compare every table across both databases. Read-only.
    pub async fn verify(mut self) -> VerifyReport {
        let report = Verifier::new(&self.config.migration)
            .verify(&self.source, &self.target)
            .await;
        self.source.close().await;
        self.target.close().await;
        info!("Database connections closed");
        report
    }

    async fn execute(&mut self, dry_run: bool) -> Result<MigrationResult> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let migration = &self.config.migration;
        info!("Starting migration run: {}", run_id);

        // Reset runs before ordering; a dry run skips it.
        let tables_truncated = if migration.truncate_before_insert && !dry_run {
            reset::reset_tables(&mut self.target, migration).await?
        } else {
            0
        };

        let table_order =
            ordering::migration_order(&self.source, &self.target, migration).await?;

        if dry_run {
            info!("Dry run: {} tables would be migrated", table_order.len());
            let mut result = MigrationResult::new(run_id, started_at, table_order, Vec::new());
            result.status = "dry_run".to_string();
            return Ok(result);
        }

        let engine = TransferEngine::new(migration);
        let mut outcomes = Vec::with_capacity(table_order.len());
        for table in &table_order {
            let outcome = engine
                .transfer_table(&self.source, &mut self.target, table)
                .await?;
            outcomes.push(outcome);
        }

        let sequences_updated = sequences::reconcile_sequences(&mut self.target, migration).await?;

        let mut result = MigrationResult::new(run_id, started_at, table_order, outcomes);
        result.tables_truncated = tables_truncated;
        result.sequences_updated = sequences_updated;

        if result.tables_failed > 0 || result.tables_partial > 0 {
            warn!(
                "{} tables failed, {} tables partially migrated",
                result.tables_failed, result.tables_partial
            );
        }
        info!(
            "Migration {}: {} tables, {} rows in {:.1}s ({} rows/s)",
            result.status,
            result.tables_total,
            result.rows_transferred,
            result.duration_seconds,
            result.rows_per_second
        );
        Ok(result)
    }
}
