//! Settings service
//!
//! Neighborhood identity (RT/RW and region names) persisted as a JSON file
//! in the data directory.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Region metadata used when composing letters and display strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSettings {
    #[serde(default = "default_rt")]
    pub rt: String,
    #[serde(default = "default_rw")]
    pub rw: String,
    #[serde(default)]
    pub kelurahan: String,
    #[serde(default)]
    pub kecamatan: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub province: String,
    /// Name signing introductory letters (Ketua RT)
    #[serde(default)]
    pub chairman_name: String,
    /// Suggested monthly dues in rupiah
    #[serde(default = "default_monthly_dues")]
    pub monthly_dues_amount: i64,
}

fn default_rt() -> String {
    "001".to_string()
}

fn default_rw() -> String {
    "001".to_string()
}

fn default_monthly_dues() -> i64 {
    50_000
}

impl Default for RegionSettings {
    fn default() -> Self {
        Self {
            rt: default_rt(),
            rw: default_rw(),
            kelurahan: String::new(),
            kecamatan: String::new(),
            city: String::new(),
            province: String::new(),
            chairman_name: String::new(),
            monthly_dues_amount: default_monthly_dues(),
        }
    }
}

impl RegionSettings {
    /// "RT 001 / RW 002, Kelurahan X, Kecamatan Y, City" with empty parts left out
    pub fn display_name(&self) -> String {
        let mut parts = vec![format!("RT {} / RW {}", self.rt, self.rw)];

        if !self.kelurahan.is_empty() {
            parts.push(format!("Kelurahan {}", self.kelurahan));
        }
        if !self.kecamatan.is_empty() {
            parts.push(format!("Kecamatan {}", self.kecamatan));
        }
        for part in [&self.city, &self.province] {
            if !part.is_empty() {
                parts.push(part.clone());
            }
        }

        parts.join(", ")
    }

    fn validate(self) -> Result<Self> {
        let is_number = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

        let rt = self.rt.trim().to_string();
        let rw = self.rw.trim().to_string();

        if !is_number(&rt) || !is_number(&rw) {
            return Err(AppError::validation("rt and rw must be numbers"));
        }
        if self.monthly_dues_amount < 0 {
            return Err(AppError::validation("monthlyDuesAmount cannot be negative"));
        }

        Ok(Self { rt, rw, ..self })
    }
}

/// Service for managing region settings
#[derive(Clone)]
pub struct SettingsService {
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            settings_path: data_dir.join("settings.json"),
        }
    }

    /// Load settings from disk or create default if not exists
    pub async fn load(&self) -> Result<RegionSettings> {
        if !self.settings_path.exists() {
            tracing::info!("Settings file not found, creating default settings");
            let default = RegionSettings::default();
            self.save(&default).await?;
            return Ok(default);
        }

        let content = fs::read_to_string(&self.settings_path).await?;
        let settings: RegionSettings = serde_json::from_str(&content)
            .map_err(|e| AppError::Generic(format!("Failed to parse settings: {}", e)))?;

        Ok(settings)
    }

    /// Save settings to disk
    pub async fn save(&self, settings: &RegionSettings) -> Result<()> {
        let content = serde_json::to_string_pretty(settings)?;

        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.settings_path, content).await?;
        tracing::info!("Settings saved to {:?}", self.settings_path);

        Ok(())
    }

    /// Validate and persist new settings
    pub async fn update(&self, settings: RegionSettings) -> Result<RegionSettings> {
        let settings = settings.validate()?;
        self.save(&settings).await?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_service() -> (SettingsService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let service = SettingsService::new(temp_dir.path().to_path_buf());
        (service, temp_dir)
    }

    #[tokio::test]
    async fn test_default_settings_created_on_load() {
        let (service, temp) = create_test_service();

        let settings = service.load().await.unwrap();

        assert_eq!(settings.rt, "001");
        assert_eq!(settings.rw, "001");
        assert_eq!(settings.monthly_dues_amount, 50_000);
        assert!(temp.path().join("settings.json").exists());
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();

        {
            let service = SettingsService::new(dir.clone());
            service
                .update(RegionSettings {
                    rt: " 005 ".to_string(),
                    rw: "012".to_string(),
                    kelurahan: "Sukamaju".to_string(),
                    chairman_name: "H. Ahmad".to_string(),
                    ..RegionSettings::default()
                })
                .await
                .unwrap();
        }

        {
            let service = SettingsService::new(dir);
            let loaded = service.load().await.unwrap();
            assert_eq!(loaded.rt, "005");
            assert_eq!(loaded.rw, "012");
            assert_eq!(loaded.kelurahan, "Sukamaju");
            assert_eq!(loaded.chairman_name, "H. Ahmad");
        }
    }

    #[tokio::test]
    async fn test_invalid_settings_rejected() {
        let (service, _temp) = create_test_service();

        let result = service
            .update(RegionSettings {
                rt: "satu".to_string(),
                ..RegionSettings::default()
            })
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(service.load().await.unwrap().rt, "001");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: RegionSettings = serde_json::from_str(r#"{"rt": "003"}"#).unwrap();

        assert_eq!(settings.rt, "003");
        assert_eq!(settings.rw, "001");
        assert_eq!(settings.monthly_dues_amount, 50_000);
    }

    #[test]
    fn test_display_name_skips_empty_parts() {
        let settings = RegionSettings {
            rt: "005".to_string(),
            rw: "012".to_string(),
            kelurahan: "Sukamaju".to_string(),
            city: "Bandung".to_string(),
            ..RegionSettings::default()
        };

        assert_eq!(settings.display_name(), "RT 005 / RW 012, Kelurahan Sukamaju, Bandung");
    }
}
