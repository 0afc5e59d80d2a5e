use super::Repository;
use crate::database::models::{InactiveReason, Resident, ResidentFilter, ResidentRequest, ResidentStatus};
use crate::error::{AppError, Result};
use chrono::Utc;
use uuid::Uuid;

impl Repository {
    pub async fn create_resident(&self, req: &ResidentRequest) -> Result<Resident> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let resident = sqlx::query_as::<_, Resident>(
            r#"
            INSERT INTO residents (
                id, nik, kk_number, full_name, gender, birth_place, birth_date, religion,
                marital_status, occupation, family_relation, status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'active', ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.nik)
        .bind(&req.kk_number)
        .bind(&req.full_name)
        .bind(req.gender)
        .bind(&req.birth_place)
        .bind(req.birth_date)
        .bind(&req.religion)
        .bind(&req.marital_status)
        .bind(&req.occupation)
        .bind(&req.family_relation)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created resident: {}", id);
        Ok(resident)
    }

    pub async fn get_resident(&self, id: &str) -> Result<Resident> {
        sqlx::query_as::<_, Resident>("SELECT * FROM residents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Resident", id))
    }

    pub async fn find_resident_by_nik(&self, nik: &str) -> Result<Option<Resident>> {
        let resident = sqlx::query_as::<_, Resident>("SELECT * FROM residents WHERE nik = ?")
            .bind(nik)
            .fetch_optional(&self.pool)
            .await?;

        Ok(resident)
    }

    pub async fn list_residents(&self, filter: &ResidentFilter) -> Result<Vec<Resident>> {
        let pattern = filter
            .q
            .as_deref()
            .map(|q| format!("%{}%", q.trim().to_lowercase()));

        let residents = sqlx::query_as::<_, Resident>(
            r#"
            SELECT * FROM residents
            WHERE (?1 IS NULL OR kk_number = ?1)
              AND (?2 IS NULL OR status = ?2)
              AND (?3 IS NULL OR LOWER(full_name) LIKE ?3 OR nik LIKE ?3)
            ORDER BY full_name ASC
            "#,
        )
        .bind(filter.kk.as_deref())
        .bind(filter.status)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(residents)
    }

    pub async fn update_resident(&self, id: &str, req: &ResidentRequest) -> Result<Resident> {
        sqlx::query_as::<_, Resident>(
            r#"
            UPDATE residents
            SET nik = ?, kk_number = ?, full_name = ?, gender = ?, birth_place = ?,
                birth_date = ?, religion = ?, marital_status = ?, occupation = ?,
                family_relation = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&req.nik)
        .bind(&req.kk_number)
        .bind(&req.full_name)
        .bind(req.gender)
        .bind(&req.birth_place)
        .bind(req.birth_date)
        .bind(&req.religion)
        .bind(&req.marital_status)
        .bind(&req.occupation)
        .bind(&req.family_relation)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Resident", id))
    }

    /// Mark a resident inactive with a reason; residents are never removed
    pub async fn deactivate_resident(&self, id: &str, reason: InactiveReason) -> Result<Resident> {
        sqlx::query_as::<_, Resident>(
            r#"
            UPDATE residents SET status = ?, inactive_reason = ?, updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(ResidentStatus::Inactive)
        .bind(reason)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Resident", id))
    }
}
