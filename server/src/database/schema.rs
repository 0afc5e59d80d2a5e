//! Database schema and migrations
//!
//! Versioned SQL scripts applied in order. Each script runs in its own
//! transaction together with the row recording it in `schema_migrations`.

use crate::error::Result;
use sqlx::sqlite::SqlitePool;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: include_str!("migrations/001_initial_schema.sql"),
}];

/// Bring the schema up to the latest version
pub async fn initialize_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let current: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM schema_migrations")
        .fetch_one(pool)
        .await?;

    tracing::debug!("Schema version {} of {}", current, latest_version());

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        tracing::info!("Applying migration {:03}_{}", migration.version, migration.name);

        let mut tx = pool.begin().await?;

        sqlx::raw_sql(migration.sql).execute(&mut *tx).await?;

        sqlx::query("INSERT INTO schema_migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
    }

    Ok(())
}

fn latest_version() -> i64 {
    MIGRATIONS.last().map_or(0, |m| m.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        initialize_database(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_all_tables_created() {
        let pool = memory_pool().await;

        for table in [
            "addresses",
            "households",
            "residents",
            "income",
            "donation_history",
            "expense",
            "inventory_items",
            "inventory_loans",
            "letters",
            "users",
            "sessions",
        ] {
            let count: i32 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
            )
            .bind(table)
            .fetch_one(&pool)
            .await
            .unwrap();

            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[tokio::test]
    async fn test_initialize_is_idempotent() {
        let pool = memory_pool().await;
        initialize_database(&pool).await.unwrap();

        let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_migrations")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(applied, MIGRATIONS.len() as i64);
        assert_eq!(latest_version(), 1);
    }

    #[tokio::test]
    async fn test_active_month_unique_index() {
        let pool = memory_pool().await;

        sqlx::query("INSERT INTO addresses (id, full_address, normalized_address, created_at) VALUES ('a1', 'Jl. Mawar 1', 'jlmawar1', '2025-01-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO income (id, address_id, transaction_amount, transaction_date, status, created_at, updated_at) VALUES ('i1', 'a1', 50000, '2025-03-01', 'A', '2025-03-01T00:00:00Z', '2025-03-01T00:00:00Z')")
            .execute(&pool)
            .await
            .unwrap();

        let insert = "INSERT INTO donation_history (id, address_id, month, amount, date_paid, income_id, status, created_at) VALUES (?, 'a1', '2025-03', 50000, '2025-03-01', 'i1', ?, '2025-03-01T00:00:00Z')";

        sqlx::query(insert).bind("l1").bind("A").execute(&pool).await.unwrap();

        // A second active row for the same month is rejected
        let dup = sqlx::query(insert).bind("l2").bind("A").execute(&pool).await;
        assert!(dup.is_err());

        // Deleted rows do not count
        sqlx::query(insert).bind("l3").bind("D").execute(&pool).await.unwrap();
    }

    #[tokio::test]
    async fn test_foreign_keys_enabled() {
        let pool = memory_pool().await;

        let foreign_keys: i32 = sqlx::query_scalar("PRAGMA foreign_keys")
            .fetch_one(&pool)
            .await
            .unwrap();

        assert_eq!(foreign_keys, 1);
    }
}
