//! Table ordering.
//!
//! Tables named in the priority list come first, in that order, so parents
//! are loaded before the children that reference them. Everything else
//! follows alphabetically.

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::config::MigrationConfig;
use crate::core::traits::{SourceReader, TargetWriter};
use crate::error::Result;
use crate::probe;

/// Which pass the order is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMode {
    /// Tables to load: missing destination tables may be dropped.
    Migration,
    /// Tables to report on: missing tables stay so they show up as missing.
    Verification,
}

/// Order an eligible set: priority names first (only those present), then
/// the remaining names sorted. Each name appears once.
pub fn resolve_order(eligible: &BTreeSet<String>, priority: &[String]) -> Vec<String> {
    let mut remaining = eligible.clone();
    let mut ordered = Vec::with_capacity(remaining.len());

    for name in priority {
        if remaining.remove(name) {
            ordered.push(name.clone());
        }
    }
    ordered.extend(remaining);
    ordered
}

/// Drop skipped tables, destination views and (for migration, when
/// configured) tables the destination lacks.
pub async fn filter_candidates<T, I>(
    candidates: I,
    migration: &MigrationConfig,
    target: &T,
    mode: OrderingMode,
) -> BTreeSet<String>
where
    T: TargetWriter + ?Sized,
    I: IntoIterator<Item = String>,
{
    let unique: BTreeSet<String> = candidates.into_iter().collect();
    let mut eligible = BTreeSet::new();

    for name in unique {
        if migration.is_skipped(&name) {
            info!("Excluding table {} (in skip_tables)", name);
            continue;
        }
        if probe::is_view(target, &name).await {
            info!("Excluding view {}", name);
            continue;
        }
        if mode == OrderingMode::Migration
            && migration.skip_missing_tables
            && !probe::exists(target, &name).await
        {
            info!("Table {} doesn't exist in PostgreSQL, excluding", name);
            continue;
        }
        eligible.insert(name);
    }

    eligible
}

/// Tables to migrate, in load order.
pub async fn migration_order<S, T>(
    source: &S,
    target: &T,
    migration: &MigrationConfig,
) -> Result<Vec<String>>
where
    S: SourceReader + ?Sized,
    T: TargetWriter + ?Sized,
{
    let source_tables = source.list_tables().await?;
    info!("Found {} tables in MySQL", source_tables.len());

    let eligible =
        filter_candidates(source_tables, migration, target, OrderingMode::Migration).await;
    let ordered = resolve_order(&eligible, &migration.priority_tables);
    log_order("migration", &ordered);
    Ok(ordered)
}

/// Tables to verify: the union of source tables and destination base
/// tables, in the same order a migration would use.
pub async fn verification_order<S, T>(
    source: &S,
    target: &T,
    migration: &MigrationConfig,
) -> Vec<String>
where
    S: SourceReader + ?Sized,
    T: TargetWriter + ?Sized,
{
    let mut candidates = match source.list_tables().await {
        Ok(tables) => tables,
        Err(e) => {
            warn!("Error listing MySQL tables: {}", e);
            Vec::new()
        }
    };
    match target.list_base_tables().await {
        Ok(tables) => candidates.extend(tables),
        Err(e) => warn!("Error listing PostgreSQL tables: {}", e),
    }

    let eligible =
        filter_candidates(candidates, migration, target, OrderingMode::Verification).await;
    let ordered = resolve_order(&eligible, &migration.priority_tables);
    log_order("verification", &ordered);
    ordered
}

fn log_order(pass: &str, ordered: &[String]) {
    info!("Ordered table list for {} ({} tables):", pass, ordered.len());
    for (i, table) in ordered.iter().enumerate() {
        info!("  {}. {}", i + 1, table);
    }
}
