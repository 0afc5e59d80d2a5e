//! Letters service
//!
//! Issues numbered introductory letters (surat pengantar) to residents.

use crate::database::{Letter, LetterRequest, Repository, Resident, ResidentStatus};
use crate::error::{AppError, Result};
use crate::services::settings::{RegionSettings, SettingsService};
use chrono::Datelike;
use serde::Serialize;

const ROMAN_MONTHS: [&str; 12] = [
    "I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X", "XI", "XII",
];

/// `NNN/RT{rt}/RW{rw}/{roman month}/{year}`
pub fn format_letter_number(sequence: i64, settings: &RegionSettings, month: u32, year: i32) -> String {
    let roman = ROMAN_MONTHS
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");

    format!(
        "{:03}/RT{}/RW{}/{}/{}",
        sequence, settings.rt, settings.rw, roman, year
    )
}

/// Letter with everything needed to print it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterDetail {
    #[serde(flatten)]
    pub letter: Letter,
    pub resident: Resident,
    pub region: String,
    pub chairman_name: String,
}

/// Service for issuing letters
#[derive(Clone)]
pub struct LettersService {
    repo: Repository,
    settings: SettingsService,
}

impl LettersService {
    pub fn new(repo: Repository, settings: SettingsService) -> Self {
        Self { repo, settings }
    }

    /// Issue a letter to an active resident with the next number of the year
    pub async fn issue_letter(&self, req: LetterRequest) -> Result<LetterDetail> {
        let purpose = req.purpose.trim().to_string();
        if purpose.is_empty() {
            return Err(AppError::validation("purpose is required"));
        }

        let resident = self.repo.get_resident(&req.resident_id).await.map_err(|e| match e {
            AppError::NotFound { .. } => {
                AppError::validation(format!("Resident not found: {}", req.resident_id))
            }
            other => other,
        })?;

        if resident.status != ResidentStatus::Active {
            return Err(AppError::validation(format!(
                "Resident {} is not active",
                resident.full_name
            )));
        }

        let settings = self.settings.load().await?;
        let year = req.issued_date.year();

        let mut tx = self.repo.begin().await?;

        let sequence = Repository::next_letter_sequence(&mut tx, year).await?;
        let number = format_letter_number(sequence, &settings, req.issued_date.month(), year);
        let letter = Repository::insert_letter(&mut tx, &number, sequence, &resident.id, &purpose, req.issued_date).await?;

        tx.commit().await?;

        tracing::info!("Letter {} issued to {}", letter.letter_number, resident.id);

        Ok(LetterDetail {
            letter,
            resident,
            region: settings.display_name(),
            chairman_name: settings.chairman_name,
        })
    }

    pub async fn get_letter(&self, id: &str) -> Result<LetterDetail> {
        let letter = self.repo.get_letter(id).await?;
        let resident = self.repo.get_resident(&letter.resident_id).await?;
        let settings = self.settings.load().await?;

        Ok(LetterDetail {
            letter,
            resident,
            region: settings.display_name(),
            chairman_name: settings.chairman_name,
        })
    }

    pub async fn list_letters(&self, resident_id: Option<&str>) -> Result<Vec<Letter>> {
        self.repo.list_letters(resident_id).await
    }

    pub async fn delete_letter(&self, id: &str) -> Result<()> {
        self.repo.delete_letter(id).await?;
        tracing::info!("Letter deleted: {}", id);
        Ok(())
    }
}
