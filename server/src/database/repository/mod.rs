//! Repository layer for database operations
//!
//! One `Repository` handle wraps the pool; CRUD operations are grouped by
//! entity in the submodules. Writes that must be atomic take a
//! `&mut SqliteConnection` so callers can run them inside a transaction.

mod addresses;
mod auth;
mod finance;
mod households;
mod inventory;
mod letters;
mod residents;

pub use addresses::normalize_address;
pub use finance::NewIncome;

use crate::error::Result;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction for multi-statement writes
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::Repository;
    use crate::database::create_memory_pool;

    pub async fn create_test_repo() -> Repository {
        let pool = create_memory_pool().await.unwrap();
        Repository::new(pool)
    }
}
