//! Households service
//!
//! Family cards (KK) and their house ownership rules.

use crate::config::KK_NUMBER_LENGTH;
use crate::database::{Household, HouseholdRequest, OwnershipStatus, Repository};
use crate::error::{AppError, Result};

/// True for a string of exactly `len` ASCII digits
pub(crate) fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

/// Service for managing households
#[derive(Clone)]
pub struct HouseholdsService {
    repo: Repository,
}

impl HouseholdsService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Check field formats and references. `kk_number` is the card being
    /// validated (the path key on update).
    async fn validate(&self, kk_number: &str, req: HouseholdRequest) -> Result<HouseholdRequest> {
        if !is_digits(kk_number, KK_NUMBER_LENGTH) {
            return Err(AppError::validation(format!(
                "kkNumber must be {} digits",
                KK_NUMBER_LENGTH
            )));
        }

        self.repo.get_address(&req.address_id).await.map_err(|e| match e {
            AppError::NotFound { .. } => {
                AppError::validation(format!("Address not found: {}", req.address_id))
            }
            other => other,
        })?;

        let borrowed_from_kk = req
            .borrowed_from_kk
            .map(|kk| kk.trim().to_string())
            .filter(|kk| !kk.is_empty());

        match (req.ownership_status, &borrowed_from_kk) {
            (OwnershipStatus::Borrowing, None) => {
                return Err(AppError::validation(
                    "borrowedFromKk is required when the house is borrowed",
                ));
            }
            (OwnershipStatus::Borrowing, Some(lender)) => {
                if lender == kk_number {
                    return Err(AppError::validation("A household cannot borrow from itself"));
                }
                self.repo.get_household(lender).await.map_err(|e| match e {
                    AppError::NotFound { .. } => {
                        AppError::validation(format!("Lending household not found: {}", lender))
                    }
                    other => other,
                })?;
            }
            (_, Some(_)) => {
                return Err(AppError::validation(
                    "borrowedFromKk is only allowed when the house is borrowed",
                ));
            }
            (_, None) => {}
        }

        Ok(HouseholdRequest {
            kk_number: kk_number.to_string(),
            borrowed_from_kk,
            ..req
        })
    }

    pub async fn create_household(&self, req: HouseholdRequest) -> Result<Household> {
        let kk_number = req.kk_number.trim().to_string();
        let req = self.validate(&kk_number, req).await?;

        if self.repo.get_household(&kk_number).await.is_ok() {
            return Err(AppError::validation(format!(
                "Household already registered: {}",
                kk_number
            )));
        }

        let household = self.repo.create_household(&req).await?;
        tracing::info!("Household created: {}", household.kk_number);

        Ok(household)
    }

    pub async fn get_household(&self, kk_number: &str) -> Result<Household> {
        self.repo.get_household(kk_number).await
    }

    pub async fn list_households(&self, address_id: Option<&str>) -> Result<Vec<Household>> {
        self.repo.list_households(address_id).await
    }

    /// Update a household. The KK number in the body is ignored; the path
    /// key wins.
    pub async fn update_household(&self, kk_number: &str, req: HouseholdRequest) -> Result<Household> {
        self.repo.get_household(kk_number).await?;
        let req = self.validate(kk_number, req).await?;

        let household = self.repo.update_household(kk_number, &req).await?;
        tracing::info!("Household updated: {}", kk_number);

        Ok(household)
    }

    /// Delete a household with no residents and no borrowers
    pub async fn delete_household(&self, kk_number: &str) -> Result<()> {
        self.repo.get_household(kk_number).await?;

        if self.repo.count_household_dependents(kk_number).await? > 0 {
            return Err(AppError::validation(
                "Household still has residents or households borrowing from it",
            ));
        }

        self.repo.delete_household(kk_number).await?;
        tracing::info!("Household deleted: {}", kk_number);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;
    use crate::database::HouseholdStatus;

    const KK_A: &str = "3201010101010001";
    const KK_B: &str = "3201010101010002";

    fn request(kk: &str, address_id: &str, ownership: OwnershipStatus, lender: Option<&str>) -> HouseholdRequest {
        HouseholdRequest {
            kk_number: kk.to_string(),
            address_id: address_id.to_string(),
            status_kk: HouseholdStatus::Active,
            ownership_status: ownership,
            borrowed_from_kk: lender.map(str::to_string),
        }
    }

    async fn setup() -> (HouseholdsService, String) {
        let repo = create_test_repo().await;
        let address = repo.create_address("Jl. Melati 3").await.unwrap();
        (HouseholdsService::new(repo), address.id)
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let (service, address_id) = setup().await;

        let household = service
            .create_household(request(KK_A, &address_id, OwnershipStatus::Owner, None))
            .await
            .unwrap();
        assert_eq!(household.status_kk, HouseholdStatus::Active);

        let dup = service
            .create_household(request(KK_A, &address_id, OwnershipStatus::Rented, None))
            .await;
        assert!(matches!(dup, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_kk_number_format() {
        let (service, address_id) = setup().await;

        for kk in ["123", "32010101010100AB", "32010101010100011"] {
            let result = service
                .create_household(request(kk, &address_id, OwnershipStatus::Owner, None))
                .await;
            assert!(matches!(result, Err(AppError::Validation(_))), "accepted {}", kk);
        }
    }

    #[tokio::test]
    async fn test_borrowing_rules() {
        let (service, address_id) = setup().await;

        service
            .create_household(request(KK_A, &address_id, OwnershipStatus::Owner, None))
            .await
            .unwrap();

        let missing_lender = service
            .create_household(request(KK_B, &address_id, OwnershipStatus::Borrowing, None))
            .await;
        assert!(matches!(missing_lender, Err(AppError::Validation(_))));

        let self_lender = service
            .create_household(request(KK_B, &address_id, OwnershipStatus::Borrowing, Some(KK_B)))
            .await;
        assert!(matches!(self_lender, Err(AppError::Validation(_))));

        let lender_on_owner = service
            .create_household(request(KK_B, &address_id, OwnershipStatus::Owner, Some(KK_A)))
            .await;
        assert!(matches!(lender_on_owner, Err(AppError::Validation(_))));

        let borrowing = service
            .create_household(request(KK_B, &address_id, OwnershipStatus::Borrowing, Some(KK_A)))
            .await
            .unwrap();
        assert_eq!(borrowing.borrowed_from_kk.as_deref(), Some(KK_A));

        // The lender cannot be deleted while borrowed from
        assert!(matches!(
            service.delete_household(KK_A).await,
            Err(AppError::Validation(_))
        ));
        service.delete_household(KK_B).await.unwrap();
        service.delete_household(KK_A).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_keeps_path_key() {
        let (service, address_id) = setup().await;

        service
            .create_household(request(KK_A, &address_id, OwnershipStatus::Owner, None))
            .await
            .unwrap();

        let mut update = request(KK_B, &address_id, OwnershipStatus::Rented, None);
        update.status_kk = HouseholdStatus::Inactive;

        let updated = service.update_household(KK_A, update).await.unwrap();
        assert_eq!(updated.kk_number, KK_A);
        assert_eq!(updated.ownership_status, OwnershipStatus::Rented);
        assert_eq!(updated.status_kk, HouseholdStatus::Inactive);
    }
}
