//! Database access layer for SQLite.
//!
//! Each sub-module provides typed query functions over a `SqlitePool`.

pub mod feedback;
pub mod staging;

use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use noa_retrieval::KnowledgeStore;

/// Open (creating if missing) the SQLite database and run migrations.
pub async fn connect(database_path: &str) -> anyhow::Result<SqlitePool> {
    let pool = if database_path == ":memory:" {
        // Every in-memory connection is its own database.
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?
    } else {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{database_path}"))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?
    };

    migrate(&pool).await?;
    Ok(pool)
}

/// Create every table the service needs.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    tracing::info!("running database migrations");
    KnowledgeStore::new(pool.clone()).init().await?;
    sqlx::raw_sql(include_str!("../../migrations/001_staging_queue.sql"))
        .execute(pool)
        .await?;
    sqlx::raw_sql(include_str!("../../migrations/002_feedback_log.sql"))
        .execute(pool)
        .await?;
    tracing::info!("migrations complete");
    Ok(())
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    connect(":memory:").await.unwrap()
}
