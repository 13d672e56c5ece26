//! In-memory source and destination used by the engine tests.
//!
//! `MemoryTarget` behaves like a single PostgreSQL session closely enough to
//! exercise the engine's transaction handling: statements in an open
//! transaction are undone by rollback, a failed statement aborts the
//! transaction until it is rolled back, and a poisoned session refuses
//! everything until it is reopened.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use async_trait::async_trait;

use crate::core::schema::{ColumnDescriptor, TableData};
use crate::core::traits::{Dialect, Introspect, SourceReader, TargetWriter};
use crate::core::value::{Row, SqlNullType, SqlValue};
use crate::error::{MigrateError, Result};

fn probe_error(what: &str, name: &str) -> MigrateError {
    MigrateError::connection(format!("probe of {} failed", name), what.to_string())
}

/// Source tables held in memory.
#[derive(Default)]
pub struct MemorySource {
    tables: BTreeMap<String, TableData>,
    failing_reads: HashSet<String>,
    failing_probes: bool,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Row>) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(i, c)| ColumnDescriptor::new(*c, i as i32 + 1, "int"))
            .collect();
        self.tables
            .insert(name.to_string(), TableData { columns, rows });
        self
    }

    /// Make `read_table` fail for this table.
    pub fn fail_read(mut self, name: &str) -> Self {
        self.failing_reads.insert(name.to_string());
        self
    }

    /// Make every catalog probe fail.
    pub fn fail_probes(mut self) -> Self {
        self.failing_probes = true;
        self
    }
}

#[async_trait]
impl Introspect for MemorySource {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    async fn relation_exists(&self, name: &str) -> Result<bool> {
        if self.failing_probes {
            return Err(probe_error("existence", name));
        }
        Ok(self.tables.contains_key(name))
    }

    async fn row_count(&self, name: &str) -> Result<i64> {
        if self.failing_probes {
            return Err(probe_error("row count", name));
        }
        self.tables
            .get(name)
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| MigrateError::transfer(name, "table does not exist"))
    }

    async fn relation_size(&self, name: &str) -> Result<String> {
        let count = self.row_count(name).await?;
        Ok(format!("{:.2} MB", count as f64 / 1000.0))
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn read_table(&self, table: &str) -> Result<TableData> {
        if self.failing_reads.contains(table) {
            return Err(MigrateError::transfer(table, "source read failed"));
        }
        self.tables
            .get(table)
            .cloned()
            .ok_or_else(|| MigrateError::transfer(table, "table does not exist"))
    }

    async fn close(&self) {}
}

/// A destination table: column list, constraints and rows.
#[derive(Debug, Clone, Default)]
pub struct MemTable {
    pub columns: Vec<String>,
    pub not_null: BTreeSet<String>,
    pub bool_columns: BTreeSet<String>,
    pub rows: Vec<Row>,
}

impl MemTable {
    fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Reorder an incoming row into table column order, checking constraints.
    fn admit(&self, columns: &[String], row: &Row, pending: &[Row]) -> std::result::Result<Row, String> {
        if row.len() != columns.len() {
            return Err(format!("row has {} values for {} columns", row.len(), columns.len()));
        }
        let mut stored = vec![SqlValue::Null(SqlNullType::String); self.columns.len()];
        for (name, value) in columns.iter().zip(row) {
            let idx = self
                .index(name)
                .ok_or_else(|| format!("column \"{}\" does not exist", name))?;
            if self.bool_columns.contains(name)
                && !matches!(value, SqlValue::Bool(_) | SqlValue::Null(_))
            {
                return Err(format!(
                    "column \"{}\" is of type boolean but expression is of type {}",
                    name,
                    value.kind()
                ));
            }
            stored[idx] = value.clone();
        }
        for column in &self.not_null {
            if let Some(idx) = self.index(column) {
                if stored[idx].is_null() {
                    return Err(format!(
                        "null value in column \"{}\" violates not-null constraint",
                        column
                    ));
                }
            }
        }
        if let Some(idx) = self.index("id") {
            let key = &stored[idx];
            if !key.is_null()
                && self.rows.iter().chain(pending).any(|r| &r[idx] == key)
            {
                return Err(format!("duplicate key value violates unique constraint: id={}", key));
            }
        }
        Ok(stored)
    }
}

#[derive(Debug, Clone, Default)]
struct State {
    tables: BTreeMap<String, MemTable>,
    sequences: BTreeMap<String, i64>,
}

/// Destination session held in memory.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    state: State,
    views: BTreeSet<String>,
    snapshot: Option<State>,
    aborted: bool,
    poisoned: bool,
    closed: bool,
    referential_checks: bool,
    fail_truncate: HashSet<String>,
    poison_on_failure: bool,
    reopen_fails: bool,
    failing_probes: bool,
    /// Statements that changed or tried to change data, in order.
    pub log: Vec<String>,
    /// Number of insert statements issued.
    pub writes: usize,
    pub reopen_count: usize,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self {
            referential_checks: true,
            ..Self::default()
        }
    }

    pub fn with_table(mut self, name: &str, columns: &[&str]) -> Self {
        self.state.tables.insert(
            name.to_string(),
            MemTable {
                columns: columns.iter().map(|c| c.to_string()).collect(),
                ..MemTable::default()
            },
        );
        self
    }

    pub fn with_not_null(mut self, table: &str, column: &str) -> Self {
        if let Some(t) = self.state.tables.get_mut(table) {
            t.not_null.insert(column.to_string());
        }
        self
    }

    pub fn with_bool_column(mut self, table: &str, column: &str) -> Self {
        if let Some(t) = self.state.tables.get_mut(table) {
            t.bool_columns.insert(column.to_string());
        }
        self
    }

    pub fn with_rows(mut self, table: &str, rows: Vec<Row>) -> Self {
        if let Some(t) = self.state.tables.get_mut(table) {
            t.rows.extend(rows);
        }
        self
    }

    pub fn with_view(mut self, name: &str) -> Self {
        self.views.insert(name.to_string());
        self
    }

    pub fn with_sequence(mut self, name: &str, value: i64) -> Self {
        self.state.sequences.insert(name.to_string(), value);
        self
    }

    /// Make truncation of this table fail.
    pub fn fail_truncate(mut self, table: &str) -> Self {
        self.fail_truncate.insert(table.to_string());
        self
    }

    /// A failed statement leaves the session unable to roll back.
    pub fn poison_on_failure(mut self) -> Self {
        self.poison_on_failure = true;
        self
    }

    pub fn reopen_fails(mut self) -> Self {
        self.reopen_fails = true;
        self
    }

    pub fn fail_probes(mut self) -> Self {
        self.failing_probes = true;
        self
    }

    pub fn rows(&self, table: &str) -> &[Row] {
        self.state
            .tables
            .get(table)
            .map(|t| t.rows.as_slice())
            .unwrap_or(&[])
    }

    pub fn column(&self, table: &str, column: &str) -> Vec<SqlValue> {
        let Some(t) = self.state.tables.get(table) else {
            return Vec::new();
        };
        let Some(idx) = t.index(column) else {
            return Vec::new();
        };
        t.rows.iter().map(|r| r[idx].clone()).collect()
    }

    pub fn sequence_value(&self, name: &str) -> Option<i64> {
        self.state.sequences.get(name).copied()
    }

    pub fn referential_checks_enabled(&self) -> bool {
        self.referential_checks
    }

    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn truncations(&self) -> Vec<String> {
        self.log
            .iter()
            .filter_map(|l| l.strip_prefix("TRUNCATE "))
            .map(str::to_string)
            .collect()
    }

    fn usable(&self) -> Result<()> {
        if self.closed {
            return Err(MigrateError::connection("connection closed", "memory target"));
        }
        if self.poisoned {
            return Err(MigrateError::transfer("session", "connection is in an unusable state"));
        }
        if self.aborted {
            return Err(MigrateError::transfer(
                "session",
                "current transaction is aborted, commands ignored until end of transaction block",
            ));
        }
        Ok(())
    }

    fn statement_failed(&mut self, err: MigrateError) -> MigrateError {
        if self.poison_on_failure {
            self.poisoned = true;
        }
        if self.snapshot.is_some() {
            self.aborted = true;
        }
        err
    }

    fn probe(&self, what: &str, name: &str) -> Result<()> {
        if self.failing_probes {
            return Err(probe_error(what, name));
        }
        Ok(())
    }
}

#[async_trait]
impl Introspect for MemoryTarget {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn relation_exists(&self, name: &str) -> Result<bool> {
        self.probe("existence", name)?;
        Ok(self.state.tables.contains_key(name) || self.views.contains(name))
    }

    async fn row_count(&self, name: &str) -> Result<i64> {
        self.probe("row count", name)?;
        self.state
            .tables
            .get(name)
            .map(|t| t.rows.len() as i64)
            .ok_or_else(|| MigrateError::transfer(name, "relation does not exist"))
    }

    async fn relation_size(&self, name: &str) -> Result<String> {
        let count = self.row_count(name).await?;
        Ok(format!("{} kB", 8 + count * 8))
    }

    async fn ping(&self) -> Result<()> {
        self.usable()
    }
}

#[async_trait]
impl TargetWriter for MemoryTarget {
    async fn is_view(&self, name: &str) -> Result<bool> {
        self.probe("view", name)?;
        Ok(self.views.contains(name))
    }

    async fn list_base_tables(&self) -> Result<Vec<String>> {
        Ok(self.state.tables.keys().cloned().collect())
    }

    async fn sequence_exists(&self, name: &str) -> Result<bool> {
        self.probe("sequence", name)?;
        Ok(self.state.sequences.contains_key(name))
    }

    async fn max_key(&self, table: &str, column: &str) -> Result<i64> {
        self.usable()?;
        let t = self
            .state
            .tables
            .get(table)
            .ok_or_else(|| MigrateError::transfer(table, "relation does not exist"))?;
        let idx = t
            .index(column)
            .ok_or_else(|| MigrateError::transfer(table, format!("column {} does not exist", column)))?;
        Ok(t.rows
            .iter()
            .filter_map(|r| r[idx].as_i64())
            .max()
            .unwrap_or(0))
    }

    async fn begin(&mut self) -> Result<()> {
        self.usable()?;
        if self.snapshot.is_none() {
            self.snapshot = Some(self.state.clone());
        }
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        if self.closed || self.poisoned {
            return self.usable();
        }
        if self.aborted {
            // COMMIT of a failed transaction rolls it back
            if let Some(snapshot) = self.snapshot.take() {
                self.state = snapshot;
            }
            self.aborted = false;
            return Ok(());
        }
        self.snapshot = None;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        if self.closed || self.poisoned {
            return self.usable();
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
        self.aborted = false;
        self.referential_checks = true;
        Ok(())
    }

    async fn set_referential_checks(&mut self, enabled: bool) -> Result<()> {
        self.usable()?;
        self.referential_checks = enabled;
        self.log.push(format!(
            "SET REFERENTIAL CHECKS {}",
            if enabled { "ON" } else { "OFF" }
        ));
        Ok(())
    }

    async fn truncate_cascade(&mut self, table: &str) -> Result<()> {
        self.usable()?;
        if self.fail_truncate.contains(table) {
            self.log.push(format!("FAILED TRUNCATE {}", table));
            let err = MigrateError::transfer(table, "could not obtain lock");
            return Err(self.statement_failed(err));
        }
        match self.state.tables.get_mut(table) {
            Some(t) => {
                t.rows.clear();
                self.log.push(format!("TRUNCATE {}", table));
                Ok(())
            }
            None => {
                let err = MigrateError::transfer(table, "relation does not exist");
                Err(self.statement_failed(err))
            }
        }
    }

    async fn insert_rows(&mut self, table: &str, columns: &[String], rows: &[Row]) -> Result<u64> {
        self.usable()?;
        self.writes += 1;
        let Some(t) = self.state.tables.get(table) else {
            let err = MigrateError::transfer(table, "relation does not exist");
            return Err(self.statement_failed(err));
        };

        // one statement: all rows go in or none do
        let outcome = {
            let mut admitted = Vec::with_capacity(rows.len());
            let mut failure = None;
            for row in rows {
                match t.admit(columns, row, &admitted) {
                    Ok(stored) => admitted.push(stored),
                    Err(message) => {
                        failure = Some(message);
                        break;
                    }
                }
            }
            failure.map_or(Ok(admitted), Err)
        };
        let admitted = match outcome {
            Ok(admitted) => admitted,
            Err(message) => {
                let err = MigrateError::transfer(table, message);
                return Err(self.statement_failed(err));
            }
        };

        let written = admitted.len() as u64;
        if let Some(t) = self.state.tables.get_mut(table) {
            t.rows.extend(admitted);
        }
        self.log.push(format!("INSERT {} {}", table, written));
        Ok(written)
    }

    async fn set_sequence(&mut self, sequence: &str, value: i64) -> Result<()> {
        self.usable()?;
        match self.state.sequences.get_mut(sequence) {
            Some(v) => {
                *v = value;
                self.log.push(format!("SETVAL {} {}", sequence, value));
                Ok(())
            }
            None => {
                let err = MigrateError::transfer(sequence, "sequence does not exist");
                Err(self.statement_failed(err))
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn reopen(&mut self) -> Result<()> {
        if self.reopen_fails {
            return Err(MigrateError::connection(
                "connection refused",
                "reopening memory target",
            ));
        }
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
        self.aborted = false;
        self.poisoned = false;
        self.closed = false;
        self.referential_checks = true;
        self.reopen_count += 1;
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            self.state = snapshot;
        }
        self.closed = true;
    }
}

/// `n` rows of `(id, name)` with ids starting at 1.
pub fn numbered_rows(n: i64) -> Vec<Row> {
    (1..=n)
        .map(|i| vec![SqlValue::I64(i), SqlValue::Text(format!("row-{}", i))])
        .collect()
}
