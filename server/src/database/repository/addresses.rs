use super::Repository;
use crate::database::models::Address;
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

/// Duplicate-detection key for an address: lower-case letters and digits
/// only, so "Jl. Melati No.3" and "jl melati no 3" collide.
pub fn normalize_address(full_address: &str) -> String {
    full_address
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

impl Repository {
    pub async fn create_address(&self, full_address: &str) -> Result<Address> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let address = sqlx::query_as::<_, Address>(
            r#"
            INSERT INTO addresses (id, full_address, normalized_address, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(full_address)
        .bind(normalize_address(full_address))
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created address: {}", id);
        Ok(address)
    }

    pub async fn get_address(&self, id: &str) -> Result<Address> {
        sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Address", id))
    }

    /// Address with the same normalized text, if any
    pub async fn find_address_by_normalized(&self, normalized: &str) -> Result<Option<Address>> {
        let address = sqlx::query_as::<_, Address>(
            "SELECT * FROM addresses WHERE normalized_address = ?",
        )
        .bind(normalized)
        .fetch_optional(&self.pool)
        .await?;

        Ok(address)
    }

    /// List addresses, optionally filtered by a case-insensitive substring
    pub async fn list_addresses(&self, query: Option<&str>) -> Result<Vec<Address>> {
        let pattern = format!("%{}%", query.unwrap_or("").trim().to_lowercase());

        let addresses = sqlx::query_as::<_, Address>(
            r#"
            SELECT * FROM addresses
            WHERE LOWER(full_address) LIKE ?
            ORDER BY full_address ASC
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(addresses)
    }

    pub async fn update_address(&self, id: &str, full_address: &str) -> Result<Address> {
        sqlx::query_as::<_, Address>(
            r#"
            UPDATE addresses SET full_address = ?, normalized_address = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(full_address)
        .bind(normalize_address(full_address))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Address", id))
    }

    /// Number of households, income rows and ledger rows pointing at an address
    pub async fn count_address_references(&self, id: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM households WHERE address_id = ?1)
              + (SELECT COUNT(*) FROM income WHERE address_id = ?1)
              + (SELECT COUNT(*) FROM donation_history WHERE address_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete_address(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM addresses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Address", id));
        }

        tracing::debug!("Deleted address: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;

    #[test]
    fn test_normalize_address() {
        assert_eq!(normalize_address("Jl. Melati No.3"), "jlmelatino3");
        assert_eq!(normalize_address("  jl melati  no 3 "), "jlmelatino3");
        assert_eq!(normalize_address("Gg. Kenanga, RT 01/RW 02"), "ggkenangart01rw02");
    }

    #[tokio::test]
    async fn test_create_get_and_list_addresses() {
        let repo = create_test_repo().await;

        let a = repo.create_address("Jl. Melati No. 3").await.unwrap();
        repo.create_address("Jl. Anggrek No. 1").await.unwrap();

        let fetched = repo.get_address(&a.id).await.unwrap();
        assert_eq!(fetched.full_address, "Jl. Melati No. 3");

        let all = repo.list_addresses(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].full_address, "Jl. Anggrek No. 1");

        let filtered = repo.list_addresses(Some("MELATI")).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_normalized_duplicate_rejected_by_schema() {
        let repo = create_test_repo().await;

        repo.create_address("Jl. Melati No. 3").await.unwrap();
        let dup = repo.create_address("jl melati no 3").await;

        assert!(matches!(dup, Err(AppError::Database(ref e)) if crate::error::is_unique_violation(e)));

        let found = repo
            .find_address_by_normalized(&normalize_address("JL MELATI NO.3"))
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_delete_missing_address() {
        let repo = create_test_repo().await;

        let result = repo.delete_address("nope").await;
        assert!(matches!(result, Err(AppError::NotFound { .. })));
    }
}
