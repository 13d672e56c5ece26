//! Post-migration verification.
//!
//! Compares existence, row counts and sizes of every table across source
//! and destination. Read-only: nothing is written on either side.

mod report;
mod types;

pub use report::VerifyReport;
pub use types::{TableCheck, VerifyStatus};

use tracing::info;

use crate::config::MigrationConfig;
use crate::core::traits::{Introspect, SourceReader, TargetWriter};
use crate::ordering;
use crate::probe;

/// Runs the verification pass.
pub struct Verifier<'a> {
    migration: &'a MigrationConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(migration: &'a MigrationConfig) -> Self {
        Self { migration }
    }

    /// Check every table either side knows about, in migration order.
    pub async fn verify<S, T>(&self, source: &S, target: &T) -> VerifyReport
    where
        S: SourceReader + ?Sized,
        T: TargetWriter + ?Sized,
    {
        info!("Starting data verification between MySQL and PostgreSQL");
        let tables = ordering::verification_order(source, target, self.migration).await;
        info!("Found tables to check: {}", tables.len());

        let mut checks = Vec::with_capacity(tables.len());
        for (i, table) in tables.iter().enumerate() {
            info!("Checking table {}/{}: {}", i + 1, tables.len(), table);
            checks.push(check_table(source, target, table).await);
        }
        VerifyReport::new(checks)
    }
}

/// Compare one table. Probe failures show up as unknown counts and sizes.
pub async fn check_table<S, T>(source: &S, target: &T, table: &str) -> TableCheck
where
    S: Introspect + ?Sized,
    T: Introspect + ?Sized,
{
    let mysql_exists = probe::exists(source, table).await;
    let postgres_exists = probe::exists(target, table).await;
    if !mysql_exists || !postgres_exists {
        return TableCheck::missing(table, mysql_exists, postgres_exists);
    }

    let mysql_count = probe::row_count(source, table).await;
    let postgres_count = probe::row_count(target, table).await;

    TableCheck {
        table: table.to_string(),
        mysql_exists,
        postgres_exists,
        mysql_count,
        postgres_count,
        mysql_size: probe::approx_size(source, table).await,
        postgres_size: probe::approx_size(target, table).await,
        status: VerifyStatus::from_counts(mysql_count, postgres_count),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbered_rows, MemorySource, MemoryTarget};

    #[tokio::test]
    async fn test_match_mismatch_and_missing() {
        let source = MemorySource::new()
            .with_table("x_user", &["id", "name"], numbered_rows(500))
            .with_table("x_group", &["id", "name"], numbered_rows(500))
            .with_table("x_policy", &["id", "name"], numbered_rows(10));
        let target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_rows("x_user", numbered_rows(500))
            .with_table("x_group", &["id", "name"])
            .with_rows("x_group", numbered_rows(480));
        let migration = MigrationConfig {
            priority_tables: vec!["x_user".into(), "x_group".into()],
            ..MigrationConfig::default()
        };

        let report = Verifier::new(&migration).verify(&source, &target).await;

        let statuses: Vec<_> = report
            .checks
            .iter()
            .map(|c| (c.table.as_str(), c.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("x_user", VerifyStatus::Match),
                ("x_group", VerifyStatus::Mismatch),
                ("x_policy", VerifyStatus::MissingPostgres),
            ]
        );
        assert_eq!(report.checks[1].signed_difference(), "-20");
        assert!(!report.passed());
        let text = report.render();
        assert!(text.contains("(difference: -20)"));
        assert!(text.contains("TABLES MISSING IN POSTGRESQL:\n  x_policy\n"));
    }

    #[tokio::test]
    async fn test_probe_failure_reads_as_missing() {
        let source = MemorySource::new().with_table("x_user", &["id", "name"], numbered_rows(5));
        let target = MemoryTarget::new().with_table("x_user", &["id", "name"]).fail_probes();

        let check = check_table(&source, &target, "x_user").await;
        assert_eq!(check.status, VerifyStatus::MissingPostgres);
        assert!(check.status.is_failure());
    }

    #[tokio::test]
    async fn test_sizes_are_reported() {
        let source = MemorySource::new().with_table("x_user", &["id", "name"], numbered_rows(50));
        let target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_rows("x_user", numbered_rows(50));

        let check = check_table(&source, &target, "x_user").await;
        assert_eq!(check.status, VerifyStatus::Match);
        assert_eq!(check.mysql_size, "0.05 MB");
        assert_eq!(check.postgres_size, "408 kB");
    }
}
