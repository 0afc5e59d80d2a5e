use super::Repository;
use crate::database::models::{Session, User};
use crate::error::Result;
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Repository {
    pub async fn count_users(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created user: {}", username);
        Ok(user)
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn create_session(&self, token_hash: &str, user_id: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("INSERT INTO sessions (token_hash, user_id, expires_at) VALUES (?, ?, ?)")
            .bind(token_hash)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn find_session(&self, token_hash: &str) -> Result<Option<Session>> {
        let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    pub async fn delete_session(&self, token_hash: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Drop sessions that expired before `now`
    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM sessions WHERE expires_at < ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }
}
