//! Existence check integration tests.

use super::common::{get_postgres_source, seed_sqlite, test_pool_settings};
use rowshift::db::{self, schema};
use rowshift::error::TransferError;
use rowshift::query::NoopObserver;

async fn seeded_source(dir: &tempfile::TempDir) -> Box<dyn db::SourceDatabase> {
    let descriptor = seed_sqlite(
        dir,
        &[
            "CREATE TABLE t1 (ID INTEGER)",
            "CREATE TABLE t2 (ID INTEGER)",
        ],
    )
    .await;
    db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_sqlite_main_schema_exists() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_source(&dir).await;

    let schemas = schema::list_schemas(source.as_ref(), &NoopObserver)
        .await
        .unwrap();
    assert!(schemas.contains(&"main".to_string()));
    assert!(schema::ensure_schema_exists(source.as_ref(), "main", &NoopObserver)
        .await
        .is_ok());

    source.close().await;
}

#[tokio::test]
async fn test_sqlite_list_tables() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_source(&dir).await;

    let tables = schema::list_tables(source.as_ref(), "main", &NoopObserver)
        .await
        .unwrap();
    assert_eq!(tables, vec!["t1".to_string(), "t2".to_string()]);

    source.close().await;
}

#[tokio::test]
async fn test_sqlite_reports_exactly_missing_tables() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_source(&dir).await;
    let wanted = vec!["t1".to_string(), "t3".to_string(), "t2".to_string(), "t4".to_string()];

    let err = schema::ensure_tables_exist(source.as_ref(), "main", &wanted, &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err, TransferError::Schema(_)));
    assert!(err.to_string().ends_with(": t3, t4"));

    source.close().await;
}

#[tokio::test]
async fn test_sqlite_unknown_schema() {
    let dir = tempfile::tempdir().unwrap();
    let source = seeded_source(&dir).await;

    let err = schema::ensure_schema_exists(source.as_ref(), "marvin", &NoopObserver)
        .await
        .unwrap_err();
    assert!(matches!(err, TransferError::Schema(_)));

    source.close().await;
}

#[tokio::test]
async fn test_postgres_public_schema_exists() {
    let Some(source) = get_postgres_source().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    assert!(schema::ensure_schema_exists(source.as_ref(), "PUBLIC", &NoopObserver)
        .await
        .is_ok());

    source.close().await;
}
