//! Addresses service
//!
//! Address registry with duplicate detection on normalized text.

use crate::database::{normalize_address, Address, Repository};
use crate::error::{AppError, Result};

/// Service for managing addresses
#[derive(Clone)]
pub struct AddressesService {
    repo: Repository,
}

impl AddressesService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Trim the input and make sure no other address normalizes to the same
    /// key. `current_id` is the address being updated, if any.
    async fn validate(&self, full_address: &str, current_id: Option<&str>) -> Result<String> {
        let trimmed = full_address.trim().to_string();
        let normalized = normalize_address(&trimmed);

        if normalized.is_empty() {
            return Err(AppError::validation("fullAddress is required"));
        }

        if let Some(existing) = self.repo.find_address_by_normalized(&normalized).await? {
            if Some(existing.id.as_str()) != current_id {
                return Err(AppError::validation(format!(
                    "Address already registered: {}",
                    existing.full_address
                )));
            }
        }

        Ok(trimmed)
    }

    pub async fn create_address(&self, full_address: &str) -> Result<Address> {
        let full_address = self.validate(full_address, None).await?;

        let address = self.repo.create_address(&full_address).await?;
        tracing::info!("Address created: {} ({})", address.full_address, address.id);

        Ok(address)
    }

    pub async fn get_address(&self, id: &str) -> Result<Address> {
        self.repo.get_address(id).await
    }

    pub async fn list_addresses(&self, query: Option<&str>) -> Result<Vec<Address>> {
        self.repo.list_addresses(query).await
    }

    pub async fn update_address(&self, id: &str, full_address: &str) -> Result<Address> {
        self.repo.get_address(id).await?;
        let full_address = self.validate(full_address, Some(id)).await?;

        let address = self.repo.update_address(id, &full_address).await?;
        tracing::info!("Address updated: {}", id);

        Ok(address)
    }

    /// Delete an address nothing refers to
    pub async fn delete_address(&self, id: &str) -> Result<()> {
        self.repo.get_address(id).await?;

        if self.repo.count_address_references(id).await? > 0 {
            return Err(AppError::validation(
                "Address is still used by households or finance records",
            ));
        }

        self.repo.delete_address(id).await?;
        tracing::info!("Address deleted: {}", id);

        Ok(())
    }
}
