//! Application configuration
//!
//! Central location for configuration constants, validation boundaries,
//! and the environment-driven [`ServerConfig`].

use crate::error::{AppError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

// ===== Dues Ledger =====

/// Ledger rows for months older than this many months before the current
/// month are removed by the retention cleanup.
pub const LEDGER_RETENTION_MONTHS: u32 = 24;

/// Cron expression for the nightly ledger cleanup (02:00 every day)
pub const LEDGER_CLEANUP_CRON: &str = "0 0 2 * * *";

// ===== Registries =====

/// Length of a national identity number (NIK)
pub const NIK_LENGTH: usize = 16;

/// Length of a family card number (nomor KK)
pub const KK_NUMBER_LENGTH: usize = 16;

/// Maximum number of data rows accepted in one spreadsheet import.
/// Larger files should be split by the operator.
pub const MAX_IMPORT_ROWS: usize = 5_000;

/// Request body limit for spreadsheet uploads
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

// ===== Sessions =====

/// Size of a session token in bytes before hex encoding
pub const SESSION_TOKEN_BYTES: usize = 32;

const DEFAULT_SESSION_TTL_HOURS: i64 = 12;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "./data";

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub session_ttl_hours: i64,
    /// Credentials for the first administrator, used only while the
    /// users table is empty
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl ServerConfig {
    /// Build configuration from `RTRW_*` environment variables
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("RTRW_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let bind_addr = std::env::var("RTRW_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e| AppError::Generic(format!("Invalid RTRW_BIND_ADDR: {}", e)))?;

        let session_ttl_hours = match std::env::var("RTRW_SESSION_TTL_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|h| *h > 0)
                .ok_or_else(|| {
                    AppError::Generic(format!("Invalid RTRW_SESSION_TTL_HOURS: {}", raw))
                })?,
            Err(_) => DEFAULT_SESSION_TTL_HOURS,
        };

        Ok(Self {
            data_dir,
            bind_addr,
            session_ttl_hours,
            admin_username: std::env::var("RTRW_ADMIN_USERNAME").ok(),
            admin_password: std::env::var("RTRW_ADMIN_PASSWORD").ok(),
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("rtrw.db")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            admin_username: None,
            admin_password: None,
        }
    }
}
