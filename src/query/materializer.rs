//! Row materialization.
//!
//! Runs one query to completion and normalizes every cell. The stages are
//! strictly linear: execute, describe, iterate, finalize. Whatever stage
//! fails is reported as such, together with the rows read before the failure
//! when the failure happened mid-iteration.

use crate::db::{ColumnDescriptor, ResultSet, SourceDatabase};
use crate::error::TransferError;
use crate::query::normalize::{normalize_cell, NormalizeOptions};
use crate::query::observer::{QueryObserver, TracingObserver};
use thiserror::Error;
use tracing::{debug, warn};

/// A materialization failure plus the partial result read before it.
///
/// `partial` holds no columns and no rows unless the failure happened while
/// iterating. Rows in a partial result must be treated as incomplete.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct MaterializeError {
    error: TransferError,
    partial: ResultSet,
}

impl MaterializeError {
    fn new(error: TransferError) -> Self {
        Self {
            error,
            partial: ResultSet::new(),
        }
    }

    fn with_partial(error: TransferError, partial: ResultSet) -> Self {
        Self { error, partial }
    }

    /// Returns the stage error.
    pub fn error(&self) -> &TransferError {
        &self.error
    }

    /// Returns the partial result.
    pub fn partial(&self) -> &ResultSet {
        &self.partial
    }

    /// Splits into the stage error and the partial result.
    pub fn into_parts(self) -> (TransferError, ResultSet) {
        (self.error, self.partial)
    }
}

impl From<MaterializeError> for TransferError {
    fn from(err: MaterializeError) -> Self {
        err.error
    }
}

/// Executes queries against a source and materializes normalized rows.
pub struct Materializer<'a> {
    db: &'a dyn SourceDatabase,
    observer: &'a dyn QueryObserver,
    options: NormalizeOptions,
}

impl<'a> Materializer<'a> {
    /// Creates a materializer that logs queries through `tracing`.
    pub fn new(db: &'a dyn SourceDatabase) -> Self {
        Self {
            db,
            observer: &TracingObserver,
            options: NormalizeOptions::default(),
        }
    }

    /// Replaces the query observer.
    pub fn with_observer(mut self, observer: &'a dyn QueryObserver) -> Self {
        self.observer = observer;
        self
    }

    /// Replaces the normalization options.
    pub fn with_options(mut self, options: NormalizeOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes `sql` and returns every row, normalized.
    ///
    /// The cursor is released before this returns, on success and on every
    /// failure path.
    pub async fn materialize(&self, sql: &str) -> Result<ResultSet, MaterializeError> {
        self.observer.before_execute(sql);

        let mut cursor = self
            .db
            .open_cursor(sql)
            .await
            .map_err(|e| MaterializeError::new(TransferError::query_execution(e.to_string())))?;

        let columns: Vec<ColumnDescriptor> = cursor
            .describe()
            .await
            .map_err(|e| MaterializeError::new(TransferError::result_describe(e.to_string())))?
            .into_iter()
            .map(|(name, type_name)| {
                let class = cursor.classify(&type_name);
                ColumnDescriptor::new(name, type_name, class)
            })
            .collect();
        debug!(columns = columns.len(), "described result columns");

        let mut result = ResultSet::with_columns(columns);

        loop {
            match cursor.advance().await {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => {
                    let rows = result.rows.len();
                    warn!(rows, "cursor failed after last row: {e}");
                    return Err(MaterializeError::with_partial(
                        TransferError::cursor_terminal(rows, e.to_string()),
                        result,
                    ));
                }
            }

            let row_number = result.rows.len() + 1;
            let raw = match cursor.scan() {
                Ok(raw) if raw.len() == result.columns.len() => raw,
                Ok(raw) => {
                    let message = format!(
                        "expected {} cells, got {}",
                        result.columns.len(),
                        raw.len()
                    );
                    return Err(MaterializeError::with_partial(
                        TransferError::row_scan(row_number, message),
                        result,
                    ));
                }
                Err(e) => {
                    warn!(row = row_number, "row scan failed: {e}");
                    return Err(MaterializeError::with_partial(
                        TransferError::row_scan(row_number, e.to_string()),
                        result,
                    ));
                }
            };

            let row = raw
                .iter()
                .zip(&result.columns)
                .map(|(cell, column)| normalize_cell(cell.as_deref(), column.class, self.options))
                .collect();
            result.rows.push(row);
        }

        debug!(rows = result.rows.len(), "query materialized");
        Ok(result)
    }
}

/// Executes `sql` against `db` and returns every row, normalized.
pub async fn materialize(
    db: &dyn SourceDatabase,
    sql: &str,
    observer: &dyn QueryObserver,
) -> Result<ResultSet, MaterializeError> {
    Materializer::new(db)
        .with_observer(observer)
        .materialize(sql)
        .await
}
