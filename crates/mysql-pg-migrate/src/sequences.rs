//! Sequence reconciliation.
//!
//! After a bulk load the destination sequences still sit at their initial
//! values. Each bound sequence is moved to the maximum key of its table so
//! the next generated key does not collide with a migrated row.

use tracing::{debug, info, warn};

use crate::config::{MigrationConfig, SequenceBinding};
use crate::core::traits::TargetWriter;
use crate::error::Result;
use crate::probe;

/// Advance every bound sequence whose table and sequence both exist.
///
/// Returns how many sequences were set. Only a failure to reopen the
/// destination session is returned as an error.
pub async fn reconcile_sequences<T: TargetWriter + ?Sized>(
    target: &mut T,
    migration: &MigrationConfig,
) -> Result<usize> {
    info!("Updating sequences");
    let mut updated = 0;

    for binding in &migration.sequences {
        if !probe::exists(&*target, &binding.table).await {
            info!(
                "Table {} doesn't exist in PostgreSQL, skipping sequence {}",
                binding.table, binding.sequence
            );
            continue;
        }
        if !probe::sequence_exists(&*target, &binding.sequence).await {
            info!("Sequence {} doesn't exist, skipping", binding.sequence);
            continue;
        }

        match advance(target, binding, &migration.sequence_key_column).await {
            Ok(Some(value)) => {
                info!("Updated sequence {} to {}", binding.sequence, value);
                updated += 1;
            }
            Ok(None) => debug!(
                "Table {} is empty, sequence {} left unchanged",
                binding.table, binding.sequence
            ),
            Err(e) => {
                warn!("Error updating sequence {}: {}", binding.sequence, e);
                target.recover().await?;
            }
        }
    }

    info!("Updated {} sequences", updated);
    Ok(updated)
}

async fn advance<T: TargetWriter + ?Sized>(
    target: &mut T,
    binding: &SequenceBinding,
    key_column: &str,
) -> Result<Option<i64>> {
    target.begin().await?;
    let max = target.max_key(&binding.table, key_column).await?;
    let set = if max > 0 {
        target.set_sequence(&binding.sequence, max).await?;
        Some(max)
    } else {
        None
    };
    target.commit().await?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbered_rows, MemoryTarget};

    fn migration(bindings: &[(&str, &str)]) -> MigrationConfig {
        MigrationConfig {
            sequences: bindings
                .iter()
                .map(|(table, sequence)| SequenceBinding {
                    table: table.to_string(),
                    sequence: sequence.to_string(),
                })
                .collect(),
            ..MigrationConfig::default()
        }
    }

    #[tokio::test]
    async fn test_sequence_set_to_max_key() {
        let mut target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_rows("x_user", numbered_rows(42))
            .with_sequence("x_user_seq", 1);

        let updated = reconcile_sequences(&mut target, &migration(&[("x_user", "x_user_seq")]))
            .await
            .unwrap();

        assert_eq!(updated, 1);
        assert_eq!(target.sequence_value("x_user_seq"), Some(42));
    }

    #[tokio::test]
    async fn test_empty_table_leaves_sequence_alone() {
        let mut target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_sequence("x_user_seq", 7);

        let updated = reconcile_sequences(&mut target, &migration(&[("x_user", "x_user_seq")]))
            .await
            .unwrap();

        assert_eq!(updated, 0);
        assert_eq!(target.sequence_value("x_user_seq"), Some(7));
        assert!(!target.in_transaction());
    }

    #[tokio::test]
    async fn test_missing_table_or_sequence_is_skipped() {
        let mut target = MemoryTarget::new()
            .with_table("x_group", &["id", "name"])
            .with_rows("x_group", numbered_rows(3))
            .with_table("x_user", &["id", "name"])
            .with_rows("x_user", numbered_rows(5))
            .with_sequence("x_user_seq", 1);
        let migration = migration(&[
            ("x_missing", "x_missing_seq"),
            ("x_group", "x_group_seq"),
            ("x_user", "x_user_seq"),
        ]);

        let updated = reconcile_sequences(&mut target, &migration).await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(target.sequence_value("x_user_seq"), Some(5));
    }

    #[tokio::test]
    async fn test_failure_moves_on_to_next_sequence() {
        let mut target = MemoryTarget::new()
            .with_table("x_keyless", &["name"])
            .with_sequence("x_keyless_seq", 1)
            .with_table("x_user", &["id", "name"])
            .with_rows("x_user", numbered_rows(3))
            .with_sequence("x_user_seq", 1);
        let migration = migration(&[("x_keyless", "x_keyless_seq"), ("x_user", "x_user_seq")]);

        let updated = reconcile_sequences(&mut target, &migration).await.unwrap();

        assert_eq!(updated, 1);
        assert_eq!(target.sequence_value("x_keyless_seq"), Some(1));
        assert_eq!(target.sequence_value("x_user_seq"), Some(3));
    }
}
