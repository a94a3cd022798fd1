//! PostgreSQL source implementation.
//!
//! Provides the `PostgresSource` struct that implements the `SourceDatabase`
//! trait for PostgreSQL databases using sqlx.
//!
//! Queries are sent as plain strings without bind parameters, which makes
//! sqlx use the simple query protocol. Every value then arrives in the
//! server's text rendering, and that text is what gets scanned.

use crate::config::{redact_descriptor, PoolSettings};
use crate::db::cursor::RowStream;
use crate::db::{ColumnClass, DatabaseBackend, DriverError, RawCell, RowCursor, SourceDatabase};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use sqlx::postgres::{PgColumn, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Connection, Executor, Row, TypeInfo};
use tracing::{debug, warn};

/// PostgreSQL source database.
#[derive(Debug)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    /// Opens a pool for `descriptor` and verifies it with a ping.
    pub async fn provision(descriptor: &str, settings: &PoolSettings) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_open)
            .min_connections(settings.warm_connections())
            .max_lifetime(settings.max_lifetime())
            .acquire_timeout(settings.acquire_timeout())
            .connect_lazy(descriptor)
            .map_err(|e| TransferError::connection_open(e.to_string()))?;

        if let Err(e) = ping(&pool).await {
            warn!("Liveness check failed for {}", redact_descriptor(descriptor));
            pool.close().await;
            return Err(map_connection_error(e, descriptor));
        }

        debug!("Successfully connected to source database");
        Ok(Self { pool })
    }
}

async fn ping(pool: &PgPool) -> std::result::Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    conn.ping().await
}

#[async_trait]
impl SourceDatabase for PostgresSource {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::Postgres
    }

    async fn open_cursor<'a>(
        &'a self,
        sql: &'a str,
    ) -> std::result::Result<Box<dyn RowCursor + 'a>, DriverError> {
        let rows = RowStream::open(self.pool.fetch(sql))
            .await
            .map_err(|e| DriverError::from(format_query_error(e)))?;

        Ok(Box::new(PgCursor {
            pool: &self.pool,
            sql,
            rows,
        }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Cursor over a PostgreSQL result stream.
struct PgCursor<'a> {
    pool: &'a PgPool,
    sql: &'a str,
    rows: RowStream<'a, PgRow>,
}

#[async_trait]
impl<'a> RowCursor for PgCursor<'a> {
    async fn describe(&mut self) -> std::result::Result<Vec<(String, String)>, DriverError> {
        if let Some(row) = self.rows.peek() {
            return Ok(column_pairs(row.columns()));
        }

        // No rows came back, so ask the server to describe the statement.
        let description = self
            .pool
            .describe(self.sql)
            .await
            .map_err(|e| DriverError::from(format_query_error(e)))?;
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

        (0..row.len())
            .map(|i| -> std::result::Result<RawCell, DriverError> {
                let text: Option<&str> = row.try_get_unchecked(i)?;
                Ok(text.map(|t| t.as_bytes().to_vec()))
            })
            .collect()
    }
}

fn column_pairs(columns: &[PgColumn]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|col| (col.name().to_string(), col.type_info().name().to_string()))
        .collect()
}

/// Classifies a PostgreSQL type name.
pub(crate) fn classify_type(type_name: &str) -> ColumnClass {
    match type_name.to_uppercase().as_str() {
        "INT2" | "SMALLINT" | "INT4" | "INT" | "INTEGER" | "INT8" | "BIGINT" | "FLOAT4"
        | "REAL" | "FLOAT8" | "DOUBLE PRECISION" | "NUMERIC" | "DECIMAL" | "OID" => {
            ColumnClass::Numeric
        }
        "TEXT" | "VARCHAR" | "CHARACTER VARYING" | "CHAR" | "BPCHAR" | "CHARACTER" | "NAME"
        | "CITEXT" | "UNKNOWN" | "\"CHAR\"" => ColumnClass::Text,
        _ => ColumnClass::Other,
    }
}

/// Maps sqlx liveness-check errors to readable messages.
fn map_connection_error(error: sqlx::Error, descriptor: &str) -> TransferError {
    let target = redact_descriptor(descriptor);
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        TransferError::connection_unreachable(format!(
            "Cannot connect to {target}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        TransferError::connection_unreachable(format!(
            "Authentication failed for {target}. Check your credentials."
        ))
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        TransferError::connection_unreachable(format!(
            "Connection to {target} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        TransferError::connection_unreachable(error.to_string())
    }
}

/// Formats a query error with the server's detail and hint when present.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from("ERROR: ");
    result.push_str(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }

        if let Some(table) = pg_error.table() {
            result.push_str("\n  TABLE: ");
            result.push_str(table);
        }

        if let Some(column) = pg_error.column() {
            result.push_str("\n  COLUMN: ");
            result.push_str(column);
        }
    }

    result
}
