//! SQLite source implementation.
//!
//! Values are rendered by their storage class: integers and reals through
//! their Rust numeric types, text verbatim, blobs as raw bytes.

use crate::config::{redact_descriptor, PoolSettings};
use crate::db::cursor::RowStream;
use crate::db::{ColumnClass, DatabaseBackend, DriverError, RawCell, RowCursor, SourceDatabase};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteColumn, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Connection, Executor, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

/// SQLite source database.
#[derive(Debug)]
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    /// Opens a pool for `descriptor` and verifies it with a ping.
    pub async fn provision(descriptor: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_open)
            .min_connections(settings.warm_connections())
            .max_lifetime(settings.max_lifetime())
            .acquire_timeout(settings.acquire_timeout())
            .connect_lazy(descriptor)
            .map_err(|e| TransferError::connection_open(e.to_string()))?;

        if let Err(e) = ping(&pool).await {
            warn!("Liveness check failed for {}", redact_descriptor(descriptor));
            pool.close().await;
            return Err(TransferError::connection_unreachable(format!(
                "Cannot open {}: {e}",
                redact_descriptor(descriptor)
            )));
        }

        debug!("Successfully opened source database");
        Ok(Self { pool })
    }
}

async fn ping(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}

#[async_trait]
impl SourceDatabase for SqliteSource {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Sqlite
    }

    async fn open_cursor<'a>(
        &'a self,
        sql: &'a str,
    ) -> std::result::Result<Box<dyn RowCursor + 'a>, DriverError> {
        let rows = RowStream::open(self.pool.fetch(sql)).await?;

        Ok(Box::new(SqliteCursor {
            pool: &self.pool,
            sql,
            rows,
        }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Cursor over a SQLite result stream.
struct SqliteCursor<'a> {
    pool: &'a SqlitePool,
    sql: &'a str,
    rows: RowStream<'a, SqliteRow>,
}

#[async_trait]
impl<'a> RowCursor for SqliteCursor<'a> {
    async fn describe(&mut self) -> std::result::Result<Vec<(String, String)>, DriverError> {
        if let Some(row) = self.rows.peek() {
            return Ok(row
                .columns()
                .iter()
                .map(|col| (col.name().to_string(), resolved_type_name(row, col)))
                .collect());
        }

        let description = self.pool.describe(self.sql).await?;
        Ok(column_pairs(description.columns()))
    }

    fn classify(&self, type_name: &str) -> ColumnClass {
        classify_type(type_name)
    }

    async fn advance(&mut self) -> std::result::Result<bool, DriverError> {
        Ok(self.rows.advance().await?)
    }

    fn scan(&self) -> std::result::Result<Vec<RawCell>, DriverError> {
        let row = self.rows.current().ok_or("no current row to scan")?;
        (0..row.len()).map(|i| scan_cell(row, i)).collect()
    }
}

/// Renders one cell by its storage class.
fn scan_cell(row: &SqliteRow, index: usize) -> std::result::Result<RawCell, DriverError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }
    let storage = raw.type_info().name().to_string();

    let bytes = match storage.as_str() {
        "INTEGER" => row.try_get_unchecked::<i64, _>(index)?.to_string().into_bytes(),
        // Debug formatting keeps a fraction or exponent, so 3.0 stays "3.0".
        "REAL" => format!("{:?}", row.try_get_unchecked::<f64, _>(index)?).into_bytes(),
        "BLOB" => row.try_get_unchecked::<Vec<u8>, _>(index)?,
        _ => row.try_get_unchecked::<String, _>(index)?.into_bytes(),
    };

    Ok(Some(bytes))
}

/// Returns the declared type of `col`, or the storage class of its value in
/// `row` when the column has no declared type (literals, casts, aggregates).
///
/// Stays `NULL` when the value in `row` is NULL too.
fn resolved_type_name(row: &SqliteRow, col: &SqliteColumn) -> String {
    let declared = col.type_info().name();
    if declared != "NULL" {
        return declared.to_string();
    }

    match row.try_get_raw(col.ordinal()) {
        Ok(raw) if !raw.is_null() => raw.type_info().name().to_string(),
        _ => declared.to_string(),
    }
}

fn column_pairs(columns: &[SqliteColumn]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|col| (col.name().to_string(), col.type_info().name().to_string()))
        .collect()
}

/// Classifies a SQLite declared type name.
pub(crate) fn classify_type(type_name: &str) -> ColumnClass {
    match type_name.to_uppercase().as_str() {
        "INTEGER" | "INT" | "BIGINT" | "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" | "DECIMAL"
        | "BOOLEAN" => ColumnClass::Numeric,
        "TEXT" | "VARCHAR" | "CHAR" | "CLOB" => ColumnClass::Text,
        _ => ColumnClass::Other,
    }
}
