//! Destructive reset of the destination.
//!
//! Tables are cleared children-first (the reverse of the priority list).
//! Each table is truncated in its own transaction with referential checks
//! suspended, so one table that cannot be cleared does not block the rest.

use tracing::{info, warn};

use crate::config::MigrationConfig;
use crate::core::traits::TargetWriter;
use crate::error::Result;
use crate::probe;

/// Clear every priority-listed table that exists on the destination.
///
/// Returns how many tables were cleared. Only a failure to reopen the
/// destination session is returned as an error.
pub async fn reset_tables<T: TargetWriter + ?Sized>(
    target: &mut T,
    migration: &MigrationConfig,
) -> Result<usize> {
    info!("Clearing destination tables before insert");
    let mut cleared = 0;

    for table in migration.priority_tables.iter().rev() {
        if !probe::exists(&*target, table).await {
            info!("Table {} doesn't exist in PostgreSQL, skipping truncation", table);
            continue;
        }

        match clear_table(target, table).await {
            Ok(()) => {
                info!("Cleared table: {}", table);
                cleared += 1;
            }
            Err(e) => {
                warn!("Error clearing table {}: {}", table, e);
                target.recover().await?;
            }
        }
    }

    info!("Cleared {} tables", cleared);
    Ok(cleared)
}

async fn clear_table<T: TargetWriter + ?Sized>(target: &mut T, table: &str) -> Result<()> {
    target.begin().await?;
    target.set_referential_checks(false).await?;
    target.truncate_cascade(table).await?;
    target.set_referential_checks(true).await?;
    target.commit().await
}
