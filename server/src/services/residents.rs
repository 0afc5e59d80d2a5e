//! Residents service
//!
//! Resident registry keyed by NIK. Residents are deactivated, never deleted.

use crate::config::NIK_LENGTH;
use crate::database::{InactiveReason, Repository, Resident, ResidentFilter, ResidentRequest};
use crate::error::{AppError, Result};
use crate::services::households::is_digits;
use chrono::NaiveDate;

/// Service for managing residents
#[derive(Clone)]
pub struct ResidentsService {
    repo: Repository,
}

impl ResidentsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Validate a resident record as of `today`. `current_id` is the
    /// resident being updated, if any.
    pub(crate) async fn validate(
        &self,
        req: ResidentRequest,
        current_id: Option<&str>,
        today: NaiveDate,
    ) -> Result<ResidentRequest> {
        let req = ResidentRequest {
            nik: req.nik.trim().to_string(),
            kk_number: req.kk_number.trim().to_string(),
            full_name: req.full_name.trim().to_string(),
            birth_place: req.birth_place.trim().to_string(),
            ..req
        };

        if !is_digits(&req.nik, NIK_LENGTH) {
            return Err(AppError::validation(format!("NIK must be {} digits", NIK_LENGTH)));
        }
        if req.full_name.is_empty() {
            return Err(AppError::validation("fullName is required"));
        }
        if req.birth_date > today {
            return Err(AppError::validation("birthDate cannot be in the future"));
        }

        if let Some(existing) = self.repo.find_resident_by_nik(&req.nik).await? {
            if Some(existing.id.as_str()) != current_id {
                return Err(AppError::validation(format!("NIK already registered: {}", req.nik)));
            }
        }

        self.repo.get_household(&req.kk_number).await.map_err(|e| match e {
            AppError::NotFound { .. } => {
                AppError::validation(format!("Household not found: {}", req.kk_number))
            }
            other => other,
        })?;

        Ok(req)
    }

    pub async fn create_resident(&self, req: ResidentRequest, today: NaiveDate) -> Result<Resident> {
        let req = self.validate(req, None, today).await?;

        let resident = self.repo.create_resident(&req).await?;
        tracing::info!("Resident created: {}", resident.id);

        Ok(resident)
    }

    pub async fn get_resident(&self, id: &str) -> Result<Resident> {
        self.repo.get_resident(id).await
    }

    pub async fn list_residents(&self, filter: &ResidentFilter) -> Result<Vec<Resident>> {
        self.repo.list_residents(filter).await
    }

    pub async fn update_resident(&self, id: &str, req: ResidentRequest, today: NaiveDate) -> Result<Resident> {
        self.repo.get_resident(id).await?;
        let req = self.validate(req, Some(id), today).await?;

        let resident = self.repo.update_resident(id, &req).await?;
        tracing::info!("Resident updated: {}", id);

        Ok(resident)
    }

    pub async fn deactivate_resident(&self, id: &str, reason: InactiveReason) -> Result<Resident> {
        let resident = self.repo.deactivate_resident(id, reason).await?;
        tracing::info!("Resident {} deactivated ({:?})", id, reason);

        Ok(resident)
    }
}
