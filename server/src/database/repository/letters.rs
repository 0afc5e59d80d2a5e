use super::Repository;
use crate::database::models::Letter;
use crate::error::{AppError, Result};
use chrono::{Datelike, NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

impl Repository {
    /// Next sequence number for letters issued in `year`
    pub async fn next_letter_sequence(conn: &mut SqliteConnection, year: i32) -> Result<i64> {
        let last: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(sequence), 0) FROM letters WHERE issued_year = ?",
        )
        .bind(year)
        .fetch_one(&mut *conn)
        .await?;

        Ok(last + 1)
    }

    pub async fn insert_letter(
        conn: &mut SqliteConnection,
        letter_number: &str,
        sequence: i64,
        resident_id: &str,
        purpose: &str,
        issued_date: NaiveDate,
    ) -> Result<Letter> {
        let id = Uuid::new_v4().to_string();

        let letter = sqlx::query_as::<_, Letter>(
            r#"
            INSERT INTO letters (
                id, letter_number, issued_year, sequence, resident_id, purpose, issued_date, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(letter_number)
        .bind(issued_date.year())
        .bind(sequence)
        .bind(resident_id)
        .bind(purpose)
        .bind(issued_date)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Issued letter {} ({})", id, letter_number);
        Ok(letter)
    }

    pub async fn get_letter(&self, id: &str) -> Result<Letter> {
        sqlx::query_as::<_, Letter>("SELECT * FROM letters WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Letter", id))
    }

    pub async fn list_letters(&self, resident_id: Option<&str>) -> Result<Vec<Letter>> {
        let letters = sqlx::query_as::<_, Letter>(
            r#"
            SELECT * FROM letters
            WHERE (?1 IS NULL OR resident_id = ?1)
            ORDER BY issued_date DESC, sequence DESC
            "#,
        )
        .bind(resident_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(letters)
    }

    pub async fn delete_letter(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM letters WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Letter", id));
        }

        tracing::debug!("Deleted letter: {}", id);
        Ok(())
    }
}
