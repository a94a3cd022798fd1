//! Mock source database for testing.
//!
//! Replays scripted result sets and can inject a failure at any stage of a
//! cursor's life: execute, describe, scanning a given row, or advancing past
//! a given row.

use super::{postgres, sqlite};
use super::{ColumnClass, DatabaseBackend, DriverError, RawCell, RowCursor, SourceDatabase};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scripted behaviour of one cursor.
#[derive(Debug, Clone, Default)]
pub struct MockCursorScript {
    columns: Vec<(String, String)>,
    rows: Vec<Vec<RawCell>>,
    fail_execute: Option<String>,
    fail_describe: Option<String>,
    fail_scan_at: Option<usize>,
    fail_after: Option<usize>,
}

impl MockCursorScript {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a result column with the given driver type name.
    pub fn column(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.columns.push((name.into(), type_name.into()));
        self
    }

    /// Adds a row; `None` cells are database NULLs.
    pub fn row(mut self, cells: &[Option<&str>]) -> Self {
        self.rows
            .push(cells.iter().map(|c| c.map(|s| s.as_bytes().to_vec())).collect());
        self
    }

    /// Adds a row of raw cells.
    pub fn raw_row(mut self, cells: Vec<RawCell>) -> Self {
        self.rows.push(cells);
        self
    }

    /// Makes execution fail with `message`.
    pub fn fail_execute(mut self, message: impl Into<String>) -> Self {
        self.fail_execute = Some(message.into());
        self
    }

    /// Makes describe fail with `message`.
    pub fn fail_describe(mut self, message: impl Into<String>) -> Self {
        self.fail_describe = Some(message.into());
        self
    }

    /// Makes scanning the given 1-based row fail.
    pub fn fail_scan_at(mut self, row: usize) -> Self {
        self.fail_scan_at = Some(row);
        self
    }

    /// Makes the cursor fault when advancing past `rows` rows.
    pub fn fail_after(mut self, rows: usize) -> Self {
        self.fail_after = Some(rows);
        self
    }
}

/// A mock source database that answers queries from scripts.
pub struct MockSource {
    backend: DatabaseBackend,
    default_script: MockCursorScript,
    scripts: Vec<(String, MockCursorScript)>,
    executed: Mutex<Vec<String>>,
    open_cursors: Arc<AtomicUsize>,
}

impl MockSource {
    /// Creates a mock that answers every query with `script`, classifying
    /// types the way PostgreSQL does.
    pub fn new(script: MockCursorScript) -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            default_script: script,
            scripts: Vec::new(),
            executed: Mutex::new(Vec::new()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Sets the backend whose type classification the mock mimics.
    pub fn with_backend(mut self, backend: DatabaseBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Answers queries containing `fragment` with `script`.
    ///
    /// Earlier registrations win.
    pub fn on_query(mut self, fragment: impl Into<String>, script: MockCursorScript) -> Self {
        self.scripts.push((fragment.into(), script));
        self
    }

    /// Returns the queries executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Returns the number of cursors that have not been dropped yet.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    fn script_for(&self, sql: &str) -> &MockCursorScript {
        self.scripts
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
            .map(|(_, script)| script)
            .unwrap_or(&self.default_script)
    }
}

#[async_trait]
impl SourceDatabase for MockSource {
    fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    async fn open_cursor<'a>(
        &'a self,
        sql: &'a str,
    ) -> std::result::Result<Box<dyn RowCursor + 'a>, DriverError> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }

        let script = self.script_for(sql);
        if let Some(message) = &script.fail_execute {
            return Err(message.clone().into());
        }

        self.open_cursors.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockCursor {
            backend: self.backend,
            script: script.clone(),
            position: 0,
            faulted: false,
            open_cursors: Arc::clone(&self.open_cursors),
        }))
    }

    async fn close(&self) {}
}

struct MockCursor {
    backend: DatabaseBackend,
    script: MockCursorScript,
    position: usize,
    faulted: bool,
    open_cursors: Arc<AtomicUsize>,
}

#[async_trait]
impl RowCursor for MockCursor {
    async fn describe(&mut self) -> std::result::Result<Vec<(String, String)>, DriverError> {
        match &self.script.fail_describe {
            Some(message) => Err(message.clone().into()),
            None => Ok(self.script.columns.clone()),
        }
    }

    fn classify(&self, type_name: &str) -> ColumnClass {
        match self.backend {
            DatabaseBackend::Postgres => postgres::classify_type(type_name),
            DatabaseBackend::Sqlite => sqlite::classify_type(type_name),
        }
    }

    async fn advance(&mut self) -> std::result::Result<bool, DriverError> {
        if self.faulted {
            return Ok(false);
        }
        if self.script.fail_after == Some(self.position) {
            self.faulted = true;
            return Err(format!("connection lost after row {}", self.position).into());
        }
        if self.position < self.script.rows.len() {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn scan(&self) -> std::result::Result<Vec<RawCell>, DriverError> {
        if self.position == 0 {
            return Err("no current row to scan".into());
        }
        if self.script.fail_scan_at == Some(self.position) {
            return Err(format!("cannot decode row {}", self.position).into());
        }
        Ok(self.script.rows[self.position - 1].clone())
    }
}

impl Drop for MockCursor {
    fn drop(&mut self) {
        self.open_cursors.fetch_sub(1, Ordering::SeqCst);
    }
}
