//! Row materialization integration tests.

use super::common::{
    get_postgres_source, seed_scenario, seed_sqlite, strings, test_pool_settings,
};
use rowshift::db::{self, ColumnClass};
use rowshift::error::TransferError;
use rowshift::query::{materialize, Materializer, NoopObserver, NormalizeOptions};
use std::sync::Mutex;

#[tokio::test]
async fn test_materialize_sqlite_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_scenario(&dir).await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();

    let result = materialize(
        source.as_ref(),
        "SELECT ID, NAME FROM t1 ORDER BY rowid",
        &NoopObserver,
    )
    .await
    .unwrap();

    assert_eq!(result.column_names(), strings(&["ID", "NAME"]));
    assert_eq!(result.columns[0].class, ColumnClass::Numeric);
    assert_eq!(result.columns[1].class, ColumnClass::Text);
    assert_eq!(
        result.rows,
        vec![
            strings(&["1", "'alice'"]),
            strings(&["NULL", "NULL"]),
            strings(&["3", "'007'"]),
        ]
    );

    source.close().await;
}

#[tokio::test]
async fn test_materialize_sqlite_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_scenario(&dir).await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();

    let result = materialize(
        source.as_ref(),
        "SELECT ID, NAME FROM t1 WHERE 1 = 0",
        &NoopObserver,
    )
    .await
    .unwrap();

    assert!(result.is_empty());
    assert_eq!(result.column_names(), strings(&["ID", "NAME"]));

    source.close().await;
}

#[tokio::test]
async fn test_materialize_sqlite_reals_and_quotes() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_sqlite(
        &dir,
        &[
            "CREATE TABLE t2 (SCORE REAL, NAME TEXT)",
            "INSERT INTO t2 VALUES (3.0, 'O''Brien'), (-0.25, '42')",
        ],
    )
    .await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();

    let result = Materializer::new(source.as_ref())
        .with_observer(&NoopObserver)
        .with_options(NormalizeOptions {
            escape_quotes: true,
        })
        .materialize("SELECT SCORE, NAME FROM t2 ORDER BY rowid")
        .await
        .unwrap();

    assert_eq!(
        result.rows,
        vec![strings(&["3.0", "'O''Brien'"]), strings(&["-0.25", "'42'"])]
    );

    source.close().await;
}

#[tokio::test]
async fn test_materialize_sqlite_untyped_text_columns_stay_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_sqlite(
        &dir,
        &[
            "CREATE TABLE t1 (ID INTEGER, NAME TEXT)",
            "INSERT INTO t1 VALUES (1, '007')",
        ],
    )
    .await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();

    let result = materialize(
        source.as_ref(),
        "SELECT NAME, '007' AS lit, CAST(ID AS TEXT) AS c, max(NAME) AS m, ID + 1 AS n FROM t1",
        &NoopObserver,
    )
    .await
    .unwrap();

    let classes: Vec<ColumnClass> = result.columns.iter().map(|c| c.class).collect();
    assert_eq!(
        classes,
        vec![
            ColumnClass::Text,
            ColumnClass::Text,
            ColumnClass::Text,
            ColumnClass::Text,
            ColumnClass::Numeric,
        ]
    );
    assert_eq!(
        result.rows,
        vec![strings(&["'007'", "'007'", "'1'", "'007'", "2"])]
    );

    source.close().await;
}

#[tokio::test]
async fn test_materialize_sqlite_missing_table() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_scenario(&dir).await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();
    let seen = Mutex::new(Vec::new());
    let observer = |sql: &str| seen.lock().unwrap().push(sql.to_string());

    let err = materialize(source.as_ref(), "SELECT * FROM t9", &observer)
        .await
        .unwrap_err();

    assert!(matches!(err.error(), TransferError::QueryExecution(_)));
    assert!(err.partial().rows.is_empty());
    assert_eq!(*seen.lock().unwrap(), strings(&["SELECT * FROM t9"]));

    source.close().await;
}

#[tokio::test]
async fn test_materialize_sqlite_repeated_queries_reuse_pool() {
    let dir = tempfile::tempdir().unwrap();
    let descriptor = seed_scenario(&dir).await;
    let source = db::provision(&descriptor, &test_pool_settings())
        .await
        .unwrap();

    for _ in 0..10 {
        let result = materialize(source.as_ref(), "SELECT ID FROM t1", &NoopObserver)
            .await
            .unwrap();
        assert_eq!(result.row_count(), 3);
    }

    source.close().await;
}

#[tokio::test]
async fn test_materialize_postgres_scenario() {
    let Some(source) = get_postgres_source().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = materialize(
        source.as_ref(),
        "SELECT * FROM (VALUES (1, 'alice'::text), (NULL, ''), (3, '007')) AS t(id, name)",
        &NoopObserver,
    )
    .await
    .unwrap();

    assert_eq!(result.column_names(), strings(&["id", "name"]));
    assert_eq!(
        result.rows,
        vec![
            strings(&["1", "'alice'"]),
            strings(&["NULL", "NULL"]),
            strings(&["3", "'007'"]),
        ]
    );

    source.close().await;
}

#[tokio::test]
async fn test_materialize_postgres_other_types() {
    let Some(source) = get_postgres_source().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let result = materialize(
        source.as_ref(),
        "SELECT DATE '2024-01-31' AS d, 12.50::numeric AS n",
        &NoopObserver,
    )
    .await
    .unwrap();

    assert_eq!(result.columns[0].class, ColumnClass::Other);
    assert_eq!(result.columns[1].class, ColumnClass::Numeric);
    assert_eq!(result.rows, vec![strings(&["'2024-01-31'", "12.50"])]);

    source.close().await;
}

#[tokio::test]
async fn test_materialize_postgres_syntax_error() {
    let Some(source) = get_postgres_source().await else {
        eprintln!("Skipping test: DATABASE_URL not set");
        return;
    };

    let err = materialize(source.as_ref(), "SELEC 1", &NoopObserver)
        .await
        .unwrap_err();

    assert!(matches!(err.error(), TransferError::QueryExecution(_)));

    source.close().await;
}
