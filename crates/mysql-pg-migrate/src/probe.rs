//! Advisory catalog probes.
//!
//! Every probe swallows its error: the failure is logged and a neutral
//! answer is returned (`false`, [`UNKNOWN_COUNT`], [`UNKNOWN_SIZE`]) so a
//! single bad catalog query never stops a migration or a report.

use tracing::warn;

use crate::core::traits::{Introspect, TargetWriter};

/// Row count reported when counting fails.
pub const UNKNOWN_COUNT: i64 = -1;

/// Size reported when the size query fails.
pub const UNKNOWN_SIZE: &str = "N/A";

/// Whether a table or view exists. Errors read as "does not exist".
pub async fn exists<I: Introspect + ?Sized>(conn: &I, name: &str) -> bool {
    match conn.relation_exists(name).await {
        Ok(found) => found,
        Err(e) => {
            warn!(
                "Error checking existence of {} in {}: {}",
                name,
                conn.dialect(),
                e
            );
            false
        }
    }
}

/// Whether a destination relation is a view.
pub async fn is_view<T: TargetWriter + ?Sized>(conn: &T, name: &str) -> bool {
    match conn.is_view(name).await {
        Ok(view) => view,
        Err(e) => {
            warn!("Error checking whether {} is a view: {}", name, e);
            false
        }
    }
}

/// Whether a destination sequence exists.
pub async fn sequence_exists<T: TargetWriter + ?Sized>(conn: &T, name: &str) -> bool {
    match conn.sequence_exists(name).await {
        Ok(found) => found,
        Err(e) => {
            warn!("Error checking sequence {}: {}", name, e);
            false
        }
    }
}

/// Exact row count, or [`UNKNOWN_COUNT`].
pub async fn row_count<I: Introspect + ?Sized>(conn: &I, name: &str) -> i64 {
    match conn.row_count(name).await {
        Ok(count) => count,
        Err(e) => {
            warn!("Error counting rows in {} ({}): {}", name, conn.dialect(), e);
            UNKNOWN_COUNT
        }
    }
}

/// Human-readable size, or [`UNKNOWN_SIZE`].
pub async fn approx_size<I: Introspect + ?Sized>(conn: &I, name: &str) -> String {
    match conn.relation_size(name).await {
        Ok(size) => size,
        Err(e) => {
            warn!("Error getting size of {} ({}): {}", name, conn.dialect(), e);
            UNKNOWN_SIZE.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{numbered_rows, MemorySource, MemoryTarget};

    #[tokio::test]
    async fn test_probes_answer_from_catalog() {
        let source = MemorySource::new().with_table("x_user", &["id", "name"], numbered_rows(3));
        let target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_view("vx_trx_log")
            .with_sequence("x_user_seq", 1);

        assert!(exists(&source, "x_user").await);
        assert!(!exists(&source, "x_group").await);
        assert_eq!(row_count(&source, "x_user").await, 3);
        assert!(exists(&target, "vx_trx_log").await);
        assert!(is_view(&target, "vx_trx_log").await);
        assert!(!is_view(&target, "x_user").await);
        assert!(sequence_exists(&target, "x_user_seq").await);
        assert!(!sequence_exists(&target, "x_group_seq").await);
    }

    #[tokio::test]
    async fn test_probe_failures_return_neutral_answers() {
        let source = MemorySource::new()
            .with_table("x_user", &["id", "name"], numbered_rows(3))
            .fail_probes();
        let target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .fail_probes();

        assert!(!exists(&source, "x_user").await);
        assert_eq!(row_count(&source, "x_user").await, UNKNOWN_COUNT);
        assert_eq!(approx_size(&source, "x_user").await, UNKNOWN_SIZE);
        assert!(!is_view(&target, "x_user").await);
        assert!(!sequence_exists(&target, "x_user_seq").await);
    }

    #[tokio::test]
    async fn test_count_of_missing_table_is_unknown() {
        let target = MemoryTarget::new();
        assert_eq!(row_count(&target, "x_portal_user").await, UNKNOWN_COUNT);
    }
}
