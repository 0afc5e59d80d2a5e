//! Authentication service
//!
//! Argon2id password hashes and server-side sessions. A session token is
//! 32 random bytes, hex encoded; only its SHA-256 digest is stored.

use crate::config::SESSION_TOKEN_BYTES;
use crate::database::Repository;
use crate::error::{AppError, Result};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

const SALT_SIZE: usize = 16;
const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let salt_string = SaltString::encode_b64(&salt)
        .map_err(|e| AppError::Generic(format!("Salt encoding failed: {}", e)))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt_string)
        .map_err(|e| AppError::Generic(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hash_token(token: &str) -> String {
    to_hex(&Sha256::digest(token.as_bytes()))
}

/// Service for users and sessions
#[derive(Clone)]
pub struct AuthService {
    repo: Repository,
    session_ttl: Duration,
}

impl AuthService {
    pub fn new(repo: Repository, session_ttl_hours: i64) -> Self {
        Self {
            repo,
            session_ttl: Duration::hours(session_ttl_hours),
        }
    }

    pub async fn create_user(&self, username: &str, password: &str) -> Result<()> {
        let username = username.trim();

        if username.is_empty() {
            return Err(AppError::validation("username is required"));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::validation(format!(
                "password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let hash = hash_password(password)?;
        self.repo.create_user(username, &hash).await?;

        tracing::info!("User created: {}", username);
        Ok(())
    }

    /// Create the first administrator when no user exists yet
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool> {
        if self.repo.count_users().await? > 0 {
            return Ok(false);
        }

        self.create_user(username, password).await?;
        tracing::info!("Seeded administrator account '{}'", username.trim());
        Ok(true)
    }

    pub async fn login(&self, username: &str, password: &str, now: DateTime<Utc>) -> Result<LoginResponse> {
        let user = self
            .repo
            .find_user_by_username(username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            tracing::warn!("Failed login for '{}'", user.username);
            return Err(AppError::InvalidCredentials);
        }

        let mut raw = [0u8; SESSION_TOKEN_BYTES];
        OsRng.fill_bytes(&mut raw);
        let token = to_hex(&raw);
        let expires_at = now + self.session_ttl;

        self.repo
            .create_session(&hash_token(&token), &user.id, expires_at)
            .await?;

        let purged = self.repo.delete_expired_sessions(now).await?;
        if purged > 0 {
            tracing::debug!("Removed {} expired sessions", purged);
        }

        tracing::info!("User '{}' logged in", user.username);
        Ok(LoginResponse { token, expires_at })
    }

    /// Resolve a bearer token to its user id
    pub async fn authenticate(&self, token: &str, now: DateTime<Utc>) -> Result<String> {
        let token_hash = hash_token(token);

        let session = self
            .repo
            .find_session(&token_hash)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.expires_at <= now {
            self.repo.delete_session(&token_hash).await?;
            return Err(AppError::Unauthorized);
        }

        Ok(session.user_id)
    }

    pub async fn logout(&self, token: &str) -> Result<()> {
        self.repo.delete_session(&hash_token(token)).await
    }
}
