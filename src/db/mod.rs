//! Database abstraction layer for rowshift.
//!
//! Provides a trait-based interface over source databases: provisioning a
//! health-checked pool from a descriptor, and opening row cursors that the
//! materializer drains.

mod cursor;
mod mock;
mod postgres;
pub mod schema;
mod sqlite;
mod types;

pub use mock::{MockCursorScript, MockSource};
pub use postgres::PostgresSource;
pub use sqlite::SqliteSource;
pub use types::{ColumnClass, ColumnDescriptor, RawCell, ResultSet, Row};

use crate::config::{redact_descriptor, PoolSettings};
use crate::error::{Result, TransferError};
use async_trait::async_trait;
use tracing::info;

/// Error type reported by drivers through the cursor seam.
///
/// The materializer decides which stage a driver error belongs to.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Supported source database backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Postgres,
    Sqlite,
}

impl DatabaseBackend {
    /// Returns the backend as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::Sqlite => "sqlite",
        }
    }

    /// Selects the backend from a descriptor's scheme.
    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let (scheme, _) = descriptor.split_once(':')?;
        match scheme.to_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }

    /// Folds an unquoted identifier the way the backend stores it.
    pub fn fold_identifier(&self, ident: &str) -> String {
        match self {
            Self::Postgres => ident.to_lowercase(),
            Self::Sqlite => ident.to_string(),
        }
    }
}

/// Provisions a health-checked source database from a descriptor.
///
/// Opening and pinging are separate steps: a descriptor the driver rejects
/// yields [`TransferError::ConnectionOpen`], a target that cannot be reached
/// afterwards yields [`TransferError::ConnectionUnreachable`].
pub async fn provision(
    descriptor: &str,
    settings: &PoolSettings,
) -> Result<Box<dyn SourceDatabase>> {
    if descriptor.trim().is_empty() {
        return Err(TransferError::connection_open("descriptor is empty"));
    }

    let backend = DatabaseBackend::from_descriptor(descriptor).ok_or_else(|| {
        TransferError::connection_open(format!(
            "unsupported descriptor {}; expected postgres:// or sqlite:",
            redact_descriptor(descriptor)
        ))
    })?;

    info!(
        backend = backend.as_str(),
        descriptor = %redact_descriptor(descriptor),
        max_idle = settings.max_idle,
        max_open = settings.max_open,
        max_lifetime_secs = settings.max_lifetime_secs,
        "provisioning source database"
    );

    match backend {
        DatabaseBackend::Postgres => {
            let source = PostgresSource::provision(descriptor, settings).await?;
            Ok(Box::new(source))
        }
        DatabaseBackend::Sqlite => {
            let source = SqliteSource::provision(descriptor, settings).await?;
            Ok(Box::new(source))
        }
    }
}

/// A provisioned source database.
///
/// The caller owns it for its whole lifetime and is responsible for calling
/// [`SourceDatabase::close`].
#[async_trait]
pub trait SourceDatabase: Send + Sync {
    /// Returns the backend kind.
    fn backend(&self) -> DatabaseBackend;

    /// Executes `sql` and returns a cursor over its result rows.
    ///
    /// Implementations must have sent the statement to the server before
    /// returning, so that rejection surfaces here.
    async fn open_cursor<'a>(
        &'a self,
        sql: &'a str,
    ) -> std::result::Result<Box<dyn RowCursor + 'a>, DriverError>;

    /// Closes the underlying pool.
    async fn close(&self);
}

/// A cursor over the rows of one executed query.
///
/// Dropping the cursor releases it.
#[async_trait]
pub trait RowCursor: Send {
    /// Returns `(name, type name)` for each result column, in order.
    async fn describe(&mut self) -> std::result::Result<Vec<(String, String)>, DriverError>;

    /// Classifies a driver type name.
    fn classify(&self, type_name: &str) -> ColumnClass;

    /// Moves to the next row. `Ok(false)` means the cursor is exhausted; an
    /// error means the cursor faulted after the last successful row.
    async fn advance(&mut self) -> std::result::Result<bool, DriverError>;

    /// Scans the current row into one raw cell per column.
    fn scan(&self) -> std::result::Result<Vec<RawCell>, DriverError>;
}
