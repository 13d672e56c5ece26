//! Insert strategies: a whole batch in one transaction, or one row at a time.

use tracing::warn;

use crate::core::traits::TargetWriter;
use crate::core::value::{row_preview, Row};
use crate::error::Result;

/// How a batch of rows is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStrategy {
    /// The batch is inserted and committed as one unit.
    Batch,
    /// Each row is inserted on its own in autocommit mode. Rows that fail
    /// are logged and skipped.
    SingleRow,
}

impl InsertStrategy {
    /// Write `rows` and return how many were committed.
    ///
    /// `Batch` returns the error of the first failed statement and leaves
    /// recovery to the caller. `SingleRow` only fails when the destination
    /// session has to be reopened and cannot be.
    pub async fn apply<T: TargetWriter + ?Sized>(
        &self,
        target: &mut T,
        table: &str,
        columns: &[String],
        rows: &[Row],
    ) -> Result<u64> {
        match self {
            InsertStrategy::Batch => {
                target.begin().await?;
                let written = target.insert_rows(table, columns, rows).await?;
                target.commit().await?;
                Ok(written)
            }
            InsertStrategy::SingleRow => {
                let mut committed = 0;
                for row in rows {
                    match target
                        .insert_rows(table, columns, std::slice::from_ref(row))
                        .await
                    {
                        Ok(n) => committed += n,
                        Err(e) => {
                            warn!("Error inserting single record into {}: {}", table, e);
                            warn!("Problematic record: {}", row_preview(row));
                            target.recover().await?;
                        }
                    }
                }
                Ok(committed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::value::SqlValue;
    use crate::testing::{numbered_rows, MemoryTarget};

    fn columns() -> Vec<String> {
        vec!["id".to_string(), "name".to_string()]
    }

    #[tokio::test]
    async fn test_batch_commits_all_rows() {
        let mut target = MemoryTarget::new().with_table("x_user", &["id", "name"]);
        let written = InsertStrategy::Batch
            .apply(&mut target, "x_user", &columns(), &numbered_rows(4))
            .await
            .unwrap();
        assert_eq!(written, 4);
        assert_eq!(target.rows("x_user").len(), 4);
        assert!(!target.in_transaction());
    }

    #[tokio::test]
    async fn test_batch_failure_is_returned() {
        let mut target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_not_null("x_user", "name");
        let mut rows = numbered_rows(3);
        rows[1][1] = SqlValue::Null(crate::core::value::SqlNullType::String);

        let result = InsertStrategy::Batch
            .apply(&mut target, "x_user", &columns(), &rows)
            .await;
        assert!(result.is_err());
        target.recover().await.unwrap();
        assert!(target.rows("x_user").is_empty());
    }

    #[tokio::test]
    async fn test_single_row_skips_bad_rows() {
        let mut target = MemoryTarget::new()
            .with_table("x_user", &["id", "name"])
            .with_not_null("x_user", "name");
        let mut rows = numbered_rows(5);
        rows[2][1] = SqlValue::Null(crate::core::value::SqlNullType::String);

        let committed = InsertStrategy::SingleRow
            .apply(&mut target, "x_user", &columns(), &rows)
            .await
            .unwrap();
        assert_eq!(committed, 4);
        assert_eq!(target.writes, 5);
        assert_eq!(
            target.column("x_user", "id"),
            vec![
                SqlValue::I64(1),
                SqlValue::I64(2),
                SqlValue::I64(4),
                SqlValue::I64(5)
            ]
        );
    }
}
