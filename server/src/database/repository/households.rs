use super::Repository;
use crate::database::models::{Household, HouseholdRequest};
use crate::error::{AppError, Result};
use chrono::Utc;

impl Repository {
    pub async fn create_household(&self, req: &HouseholdRequest) -> Result<Household> {
        let now = Utc::now();

        let household = sqlx::query_as::<_, Household>(
            r#"
            INSERT INTO households (
                kk_number, address_id, status_kk, ownership_status, borrowed_from_kk,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&req.kk_number)
        .bind(&req.address_id)
        .bind(req.status_kk)
        .bind(req.ownership_status)
        .bind(&req.borrowed_from_kk)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created household: {}", household.kk_number);
        Ok(household)
    }

    pub async fn get_household(&self, kk_number: &str) -> Result<Household> {
        sqlx::query_as::<_, Household>("SELECT * FROM households WHERE kk_number = ?")
            .bind(kk_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Household", kk_number))
    }

    pub async fn list_households(&self, address_id: Option<&str>) -> Result<Vec<Household>> {
        let households = sqlx::query_as::<_, Household>(
            r#"
            SELECT * FROM households
            WHERE (?1 IS NULL OR address_id = ?1)
            ORDER BY kk_number ASC
            "#,
        )
        .bind(address_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(households)
    }

    /// Update everything except the natural key
    pub async fn update_household(&self, kk_number: &str, req: &HouseholdRequest) -> Result<Household> {
        sqlx::query_as::<_, Household>(
            r#"
            UPDATE households
            SET address_id = ?, status_kk = ?, ownership_status = ?, borrowed_from_kk = ?,
                updated_at = ?
            WHERE kk_number = ?
            RETURNING *
            "#,
        )
        .bind(&req.address_id)
        .bind(req.status_kk)
        .bind(req.ownership_status)
        .bind(&req.borrowed_from_kk)
        .bind(Utc::now())
        .bind(kk_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Household", kk_number))
    }

    /// Residents still attached to a household, active or not, plus
    /// households borrowing from it
    pub async fn count_household_dependents(&self, kk_number: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT
                (SELECT COUNT(*) FROM residents WHERE kk_number = ?1)
              + (SELECT COUNT(*) FROM households WHERE borrowed_from_kk = ?1)
            "#,
        )
        .bind(kk_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn delete_household(&self, kk_number: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM households WHERE kk_number = ?")
            .bind(kk_number)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Household", kk_number));
        }

        tracing::debug!("Deleted household: {}", kk_number);
        Ok(())
    }
}
