//! Error types for rowshift.
//!
//! Each variant names the stage that failed, so callers can tell a bad
//! descriptor apart from an unreachable server, or a rejected query apart
//! from a row that could not be decoded.

use thiserror::Error;

/// Main error type for rowshift operations.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The descriptor was malformed or rejected by the driver at open time.
    #[error("error on initializing source database connection: {0}")]
    ConnectionOpen(String),

    /// The connection opened but the liveness check failed.
    #[error("error on ping source database connection: {0}")]
    ConnectionUnreachable(String),

    /// The query was rejected or failed server-side.
    #[error("error on executing query: {0}")]
    QueryExecution(String),

    /// Column metadata could not be retrieved after a successful execution.
    #[error("error on describing result columns: {0}")]
    ResultDescribe(String),

    /// A single row failed to decode. `row` is 1-based.
    #[error("error on scanning row {row}: {message}")]
    RowScan { row: usize, message: String },

    /// The cursor reported a fault after `rows` rows were read successfully.
    #[error("error on reading rows after row {rows}: {message}")]
    CursorTerminal { rows: usize, message: String },

    /// A schema or table existence check failed.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Configuration errors (invalid config file, missing descriptor, etc.)
    #[error("Configuration error: {0}")]
    Config(String),
}

impl TransferError {
    /// Creates a connection-open error with the given message.
    pub fn connection_open(msg: impl Into<String>) -> Self {
        Self::ConnectionOpen(msg.into())
    }

    /// Creates a connection-unreachable error with the given message.
    pub fn connection_unreachable(msg: impl Into<String>) -> Self {
        Self::ConnectionUnreachable(msg.into())
    }

    /// Creates a query execution error with the given message.
    pub fn query_execution(msg: impl Into<String>) -> Self {
        Self::QueryExecution(msg.into())
    }

    /// Creates a describe error with the given message.
    pub fn result_describe(msg: impl Into<String>) -> Self {
        Self::ResultDescribe(msg.into())
    }

    /// Creates a row scan error for the given 1-based row number.
    pub fn row_scan(row: usize, msg: impl Into<String>) -> Self {
        Self::RowScan {
            row,
            message: msg.into(),
        }
    }

    /// Creates a terminal cursor error after `rows` successful rows.
    pub fn cursor_terminal(rows: usize, msg: impl Into<String>) -> Self {
        Self::CursorTerminal {
            rows,
            message: msg.into(),
        }
    }

    /// Creates a schema error with the given message.
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::ConnectionOpen(_) => "Connection Open Error",
            Self::ConnectionUnreachable(_) => "Connection Unreachable Error",
            Self::QueryExecution(_) => "Query Execution Error",
            Self::ResultDescribe(_) => "Result Describe Error",
            Self::RowScan { .. } => "Row Scan Error",
            Self::CursorTerminal { .. } => "Cursor Terminal Error",
            Self::Schema(_) => "Schema Error",
            Self::Config(_) => "Configuration Error",
        }
    }

    /// Returns true if the failure happened while reading rows, meaning a
    /// partial result may accompany it.
    pub fn is_mid_iteration(&self) -> bool {
        matches!(self, Self::RowScan { .. } | Self::CursorTerminal { .. })
    }
}

/// Result type alias using TransferError.
pub type Result<T> = std::result::Result<T, TransferError>;
