//! Fixed-width verification report.

use std::fmt::Write as _;

use serde::Serialize;

use super::types::{TableCheck, VerifyStatus};
use crate::error::Result;

const RULE_WIDTH: usize = 100;

/// Longest table name shown in the detailed table.
const NAME_WIDTH: usize = 39;

/// Result of a verification pass over every candidate table.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub checks: Vec<TableCheck>,
}

impl VerifyReport {
    pub fn new(checks: Vec<TableCheck>) -> Self {
        Self { checks }
    }

    /// Number of tables with the given status.
    pub fn count(&self, status: VerifyStatus) -> usize {
        self.checks.iter().filter(|c| c.status == status).count()
    }

    /// Tables whose status fails the run.
    pub fn failures(&self) -> Vec<&TableCheck> {
        self.checks.iter().filter(|c| c.status.is_failure()).collect()
    }

    pub fn passed(&self) -> bool {
        self.failures().is_empty()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Render the report as text, one line per `\n`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        let _ = writeln!(out, "{}", heavy);
        let _ = writeln!(out, "DATA VERIFICATION REPORT MYSQL -> POSTGRESQL");
        let _ = writeln!(out, "{}", heavy);

        let _ = writeln!(out, "STATISTICS:");
        let _ = writeln!(out, "  Total tables: {}", self.checks.len());
        let _ = writeln!(out, "  Matched: {}", self.count(VerifyStatus::Match));
        let _ = writeln!(out, "  Mismatched: {}", self.count(VerifyStatus::Mismatch));
        let _ = writeln!(out, "  Missing in MySQL: {}", self.count(VerifyStatus::MissingMysql));
        let _ = writeln!(
            out,
            "  Missing in PostgreSQL: {}",
            self.count(VerifyStatus::MissingPostgres)
        );
        let _ = writeln!(out, "  Missing in both: {}", self.count(VerifyStatus::MissingBoth));
        let _ = writeln!(out, "  Empty in MySQL: {}", self.count(VerifyStatus::EmptyMysql));
        let _ = writeln!(
            out,
            "  Empty in PostgreSQL: {}",
            self.count(VerifyStatus::EmptyPostgres)
        );
        let _ = writeln!(out);

        let _ = writeln!(out, "DETAILED REPORT:");
        let _ = writeln!(out, "{}", light);
        let _ = writeln!(
            out,
            "{:<40} {:<10} {:<10} {:<15} {:<15} {:<10}",
            "TABLE", "MySQL", "PostgreSQL", "MySQL Size", "PgSQL Size", "STATUS"
        );
        let _ = writeln!(out, "{}", light);
        for check in &self.checks {
            let name: String = check.table.chars().take(NAME_WIDTH).collect();
            let _ = writeln!(
                out,
                "{:<40} {:<10} {:<10} {:<15} {:<15} {:<10}",
                name,
                count_cell(check.mysql_exists, check.mysql_count),
                count_cell(check.postgres_exists, check.postgres_count),
                check.mysql_size,
                check.postgres_size,
                check.status.tag()
            );
        }
        let _ = writeln!(out, "{}", light);

        let mismatched: Vec<_> = self.with_status(VerifyStatus::Mismatch).collect();
        if !mismatched.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "TABLES WITH MISMATCHES:");
            for check in mismatched {
                let _ = writeln!(
                    out,
                    "  {}: MySQL={}, PostgreSQL={} (difference: {})",
                    check.table,
                    check.mysql_count,
                    check.postgres_count,
                    check.signed_difference()
                );
            }
        }

        self.render_names(&mut out, VerifyStatus::MissingPostgres, "TABLES MISSING IN POSTGRESQL:");
        self.render_names(&mut out, VerifyStatus::MissingMysql, "TABLES MISSING IN MYSQL:");

        let _ = writeln!(out);
        let failures = self.failures().len();
        if failures > 0 {
            let _ = writeln!(out, "WARNING: Found mismatches in {} tables!", failures);
        } else {
            let _ = writeln!(
                out,
                "SUCCESS: All tables verified successfully without mismatches!"
            );
        }
        out
    }

    fn with_status(&self, status: VerifyStatus) -> impl Iterator<Item = &TableCheck> {
        self.checks.iter().filter(move |c| c.status == status)
    }

    fn render_names(&self, out: &mut String, status: VerifyStatus, heading: &str) {
        let mut tables = self.with_status(status).peekable();
        if tables.peek().is_none() {
            return;
        }
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", heading);
        for check in tables {
            let _ = writeln!(out, "  {}", check.table);
        }
    }
}

fn count_cell(exists: bool, count: i64) -> String {
    if exists {
        count.to_string()
    } else {
        "N/A".to_string()
    }
}
