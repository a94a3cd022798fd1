//! Shared fixtures.

use rowshift::config::PoolSettings;
use rowshift::db::{self, SourceDatabase};
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

/// Helper to get test database URL from environment.
pub fn get_test_database_url() -> Option<String> {
    std::env::var("DATABASE_URL")
        .ok()
        .filter(|url| url.starts_with("postgres"))
}

/// Helper to provision the PostgreSQL test source.
pub async fn get_postgres_source() -> Option<Box<dyn SourceDatabase>> {
    let url = get_test_database_url()?;
    db::provision(&url, &PoolSettings::default()).await.ok()
}

/// Small pool bounds for tests.
pub fn test_pool_settings() -> PoolSettings {
    PoolSettings {
        max_idle: 1,
        max_open: 2,
        acquire_timeout_secs: 5,
        ..Default::default()
    }
}

/// Creates a SQLite file in `dir`, runs `statements` against it and returns
/// its descriptor.
pub async fn seed_sqlite(dir: &TempDir, statements: &[&str]) -> String {
    let path = dir.path().join("source.db");
    let descriptor = format!("sqlite:{}?mode=rwc", path.display());

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&descriptor)
        .await
        .unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool.close().await;

    descriptor
}

/// Seeds the `t1` table used across tests.
pub async fn seed_scenario(dir: &TempDir) -> String {
    seed_sqlite(
        dir,
        &[
            "CREATE TABLE t1 (ID INTEGER, NAME TEXT)",
            "INSERT INTO t1 VALUES (1, 'alice'), (NULL, ''), (3, '007')",
        ],
    )
    .await
}

pub fn strings(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}
