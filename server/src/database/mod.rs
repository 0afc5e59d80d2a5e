//! Database module
//!
//! SQLite storage for registries, finance, inventory, letters and sessions.
//! `models` holds the row types, `repository` the queries and `schema` the
//! versioned migrations.

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::{normalize_address, NewIncome, Repository};
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

const POOL_SIZE: u32 = 5;

fn file_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
}

/// Open the database file, migrate it and return the application pool.
///
/// Migrations run over a single connection that is closed before the
/// application pool opens, so no pooled connection holds a stale schema.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(dir) = db_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    {
        let migrator = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(file_options(db_path))
            .await?;
        initialize_database(&migrator).await?;
        migrator.close().await;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect_with(file_options(db_path))
        .await?;

    tracing::info!("Database ready at {:?}", db_path);
    Ok(pool)
}

/// In-memory database with the full schema applied.
///
/// Every connection to `sqlite::memory:` is a separate database, so the
/// pool is capped at one connection.
pub async fn create_memory_pool() -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;

    initialize_database(&pool).await?;

    Ok(pool)
}
