//! # mysql-pg-migrate
//!
//! One-shot bulk migration of an access-control database from MySQL to
//! PostgreSQL.
//!
//! A run works through four sequential phases against a destination schema
//! that already exists:
//!
//! - **Reset**: clear destination tables children-first
//! - **Order**: resolve a parent-before-child table order from a priority list
//! - **Transfer**: copy each table in batches, falling back to row-by-row
//!   inserts when a batch is rejected
//! - **Sequences**: advance each sequence past the migrated keys
//!
//! A separate read-only [`verify`] pass compares row counts afterwards.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_pg_migrate::{Config, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> mysql_pg_migrate::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let orchestrator = Orchestrator::new(config).await?;
//!     let result = orchestrator.run(false).await?;
//!     println!("Migrated {} rows", result.rows_transferred);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod orchestrator;
pub mod ordering;
pub mod probe;
pub mod reset;
pub mod sequences;
pub mod transfer;
pub mod verify;

#[cfg(test)]
mod testing;

// Re-exports for convenient access
pub use config::{Config, MigrationConfig, SourceConfig, TargetConfig};
pub use crate::core::{Row, SqlValue, TableData};
pub use drivers::{MysqlReader, PostgresWriter};
pub use error::{MigrateError, Result};
pub use orchestrator::{health_check, HealthCheckResult, MigrationResult, Orchestrator};
pub use transfer::{TransferEngine, TransferOutcome, TransferStatus};
pub use verify::{VerifyReport, VerifyStatus};
