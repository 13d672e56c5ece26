//! Per-table verification results.

use std::fmt;

use serde::Serialize;

/// Outcome of comparing one table across source and destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerifyStatus {
    Match,
    Mismatch,
    MissingMysql,
    MissingPostgres,
    MissingBoth,
    EmptyMysql,
    EmptyPostgres,
}

impl VerifyStatus {
    /// Every status, in report order.
    pub const ALL: [VerifyStatus; 7] = [
        VerifyStatus::Match,
        VerifyStatus::Mismatch,
        VerifyStatus::MissingMysql,
        VerifyStatus::MissingPostgres,
        VerifyStatus::MissingBoth,
        VerifyStatus::EmptyMysql,
        VerifyStatus::EmptyPostgres,
    ];

    /// Classify a table that exists on both sides by its row counts.
    ///
    /// A count that could not be read (negative) is never a match.
    pub fn from_counts(mysql_count: i64, postgres_count: i64) -> Self {
        if mysql_count < 0 || postgres_count < 0 {
            VerifyStatus::Mismatch
        } else if mysql_count == postgres_count {
            VerifyStatus::Match
        } else if postgres_count == 0 {
            VerifyStatus::EmptyPostgres
        } else if mysql_count == 0 {
            VerifyStatus::EmptyMysql
        } else {
            VerifyStatus::Mismatch
        }
    }

    /// Whether this status fails the verification run.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            VerifyStatus::Mismatch
                | VerifyStatus::MissingPostgres
                | VerifyStatus::EmptyPostgres
                | VerifyStatus::EmptyMysql
        )
    }

    /// Marker shown in the detailed report.
    pub fn tag(&self) -> &'static str {
        match self {
            VerifyStatus::Match => "✓ MATCH",
            VerifyStatus::Mismatch => "✗ MISMATCH",
            VerifyStatus::MissingMysql => "! NO IN MYSQL",
            VerifyStatus::MissingPostgres => "! NO IN PGSQL",
            VerifyStatus::MissingBoth => "! NO IN BOTH",
            VerifyStatus::EmptyMysql => "○ EMPTY MYSQL",
            VerifyStatus::EmptyPostgres => "○ EMPTY PGSQL",
        }
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VerifyStatus::Match => "MATCH",
            VerifyStatus::Mismatch => "MISMATCH",
            VerifyStatus::MissingMysql => "MISSING_MYSQL",
            VerifyStatus::MissingPostgres => "MISSING_POSTGRES",
            VerifyStatus::MissingBoth => "MISSING_BOTH",
            VerifyStatus::EmptyMysql => "EMPTY_MYSQL",
            VerifyStatus::EmptyPostgres => "EMPTY_POSTGRES",
        };
        write!(f, "{}", name)
    }
}

/// Comparison of one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCheck {
    pub table: String,
    pub mysql_exists: bool,
    pub postgres_exists: bool,
    /// Source row count; 0 when the table is missing, -1 when counting failed.
    pub mysql_count: i64,
    /// Destination row count; 0 when the table is missing, -1 when counting failed.
    pub postgres_count: i64,
    pub mysql_size: String,
    pub postgres_size: String,
    pub status: VerifyStatus,
}

impl TableCheck {
    /// Check for a table missing on at least one side. Nothing is counted.
    pub fn missing(table: &str, mysql_exists: bool, postgres_exists: bool) -> Self {
        let status = match (mysql_exists, postgres_exists) {
            (false, false) => VerifyStatus::MissingBoth,
            (false, true) => VerifyStatus::MissingMysql,
            _ => VerifyStatus::MissingPostgres,
        };
        Self {
            table: table.to_string(),
            mysql_exists,
            postgres_exists,
            mysql_count: 0,
            postgres_count: 0,
            mysql_size: crate::probe::UNKNOWN_SIZE.to_string(),
            postgres_size: crate::probe::UNKNOWN_SIZE.to_string(),
            status,
        }
    }

    /// Destination count minus source count.
    pub fn difference(&self) -> i64 {
        self.postgres_count - self.mysql_count
    }

    /// Difference with an explicit sign for increases (`+3`, `-20`, `0`).
    pub fn signed_difference(&self) -> String {
        let difference = self.difference();
        if difference > 0 {
            format!("+{}", difference)
        } else {
            difference.to_string()
        }
    }
}
