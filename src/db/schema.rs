//! Schema and table existence checks.
//!
//! Run before a transfer so that a missing schema or table is reported up
//! front instead of as a query failure halfway through. Every lookup goes
//! through the row materializer, so the same observer sees these queries.

use super::{DatabaseBackend, SourceDatabase};
use crate::error::{Result, TransferError};
use crate::query::{literal_text, Materializer, QueryObserver};
use tracing::debug;

/// Lists the schemas visible to the connection.
///
/// For SQLite these are the attached database names (`main`, `temp`, ...).
pub async fn list_schemas(
    db: &dyn SourceDatabase,
    observer: &dyn QueryObserver,
) -> Result<Vec<String>> {
    let sql = match db.backend() {
        DatabaseBackend::Postgres => {
            "SELECT schema_name FROM information_schema.schemata ORDER BY schema_name"
        }
        DatabaseBackend::Sqlite => "SELECT name FROM pragma_database_list ORDER BY seq",
    };
    first_column(db, sql, observer).await
}

/// Fails with [`TransferError::Schema`] unless `schema` exists.
pub async fn ensure_schema_exists(
    db: &dyn SourceDatabase,
    schema: &str,
    observer: &dyn QueryObserver,
) -> Result<()> {
    let backend = db.backend();
    let wanted = backend.fold_identifier(schema);
    let schemas = list_schemas(db, observer).await?;

    if schemas.iter().any(|s| *s == wanted) {
        debug!(schema = %wanted, "schema exists");
        Ok(())
    } else {
        Err(TransferError::schema(format!(
            "schema \"{wanted}\" does not exist in {} source",
            backend.as_str()
        )))
    }
}

/// Lists the base tables in `schema`.
pub async fn list_tables(
    db: &dyn SourceDatabase,
    schema: &str,
    observer: &dyn QueryObserver,
) -> Result<Vec<String>> {
    let backend = db.backend();
    let schema = backend.fold_identifier(schema);
    let sql = match backend {
        DatabaseBackend::Postgres => format!(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = {} AND table_type = 'BASE TABLE' ORDER BY table_name",
            quote_literal(&schema)
        ),
        DatabaseBackend::Sqlite => format!(
            "SELECT name FROM {}.sqlite_master WHERE type = 'table' ORDER BY name",
            quote_identifier(&schema)
        ),
    };
    first_column(db, &sql, observer).await
}

/// Fails with [`TransferError::Schema`] unless `schema` exists and holds every
/// table in `tables`.
///
/// All missing tables are named in a single error.
pub async fn ensure_tables_exist(
    db: &dyn SourceDatabase,
    schema: &str,
    tables: &[String],
    observer: &dyn QueryObserver,
) -> Result<()> {
    ensure_schema_exists(db, schema, observer).await?;

    let backend = db.backend();
    let existing = list_tables(db, schema, observer).await?;
    let missing: Vec<String> = tables
        .iter()
        .map(|t| backend.fold_identifier(t))
        .filter(|t| !existing.contains(t))
        .collect();

    if missing.is_empty() {
        debug!(schema, tables = tables.len(), "all tables exist");
        return Ok(());
    }

    Err(TransferError::schema(format!(
        "missing tables in schema \"{}\": {}",
        backend.fold_identifier(schema),
        missing.join(", ")
    )))
}

async fn first_column(
    db: &dyn SourceDatabase,
    sql: &str,
    observer: &dyn QueryObserver,
) -> Result<Vec<String>> {
    let result = Materializer::new(db)
        .with_observer(observer)
        .materialize(sql)
        .await?;

    Ok(result
        .rows
        .iter()
        .filter_map(|row| row.first())
        .filter_map(|token| literal_text(token))
        .map(str::to_string)
        .collect())
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
