//! Inventory service
//!
//! Community-owned items and the loans that take them out of stock.

use crate::database::{
    InventoryItem, InventoryItemRequest, InventoryItemStock, InventoryLoan, LoanRequest,
    LoanStatus, Repository,
};
use crate::error::{AppError, Result};
use chrono::NaiveDate;

/// Service for inventory items and loans
#[derive(Clone)]
pub struct InventoryService {
    repo: Repository,
}

impl InventoryService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    fn validate_item(req: InventoryItemRequest) -> Result<InventoryItemRequest> {
        let name = req.name.trim().to_string();

        if name.is_empty() {
            return Err(AppError::validation("name is required"));
        }
        if req.quantity < 0 {
            return Err(AppError::validation("quantity cannot be negative"));
        }

        Ok(InventoryItemRequest {
            name,
            remarks: req.remarks.trim().to_string(),
            ..req
        })
    }

    async fn with_stock(&self, item: InventoryItem) -> Result<InventoryItemStock> {
        let mut conn = self.repo.pool().acquire().await?;
        let lent = Repository::quantity_on_loan(&mut conn, &item.id).await?;

        Ok(InventoryItemStock {
            available: item.quantity - lent,
            item,
        })
    }

    pub async fn create_item(&self, req: InventoryItemRequest) -> Result<InventoryItemStock> {
        let req = Self::validate_item(req)?;
        let item = self.repo.create_item(&req).await?;

        tracing::info!("Inventory item created: {} ({})", item.name, item.id);
        self.with_stock(item).await
    }

    pub async fn get_item(&self, id: &str) -> Result<InventoryItemStock> {
        let item = self.repo.get_item(id).await?;
        self.with_stock(item).await
    }

    pub async fn list_items(&self) -> Result<Vec<InventoryItemStock>> {
        let mut items = Vec::new();
        for item in self.repo.list_items().await? {
            items.push(self.with_stock(item).await?);
        }
        Ok(items)
    }

    /// Update an item. The quantity may not drop below what is on loan.
    pub async fn update_item(&self, id: &str, req: InventoryItemRequest) -> Result<InventoryItemStock> {
        let req = Self::validate_item(req)?;
        let current = self.get_item(id).await?;

        let lent = current.item.quantity - current.available;
        if req.quantity < lent {
            return Err(AppError::validation(format!(
                "quantity cannot be lower than the {} units currently on loan",
                lent
            )));
        }

        let item = self.repo.update_item(id, &req).await?;
        tracing::info!("Inventory item updated: {}", id);

        self.with_stock(item).await
    }

    pub async fn delete_item(&self, id: &str) -> Result<()> {
        let current = self.get_item(id).await?;

        if current.available < current.item.quantity {
            return Err(AppError::validation("Item still has active loans"));
        }

        self.repo.delete_item(id).await?;
        tracing::info!("Inventory item deleted: {}", id);

        Ok(())
    }

    /// Lend units of an item. Stock is checked and the loan written in one
    /// transaction.
    pub async fn create_loan(&self, req: LoanRequest) -> Result<InventoryLoan> {
        let borrower_name = req.borrower_name.trim().to_string();
        if borrower_name.is_empty() {
            return Err(AppError::validation("borrowerName is required"));
        }
        if req.quantity <= 0 {
            return Err(AppError::validation("quantity must be greater than 0"));
        }

        let item = self.repo.get_item(&req.item_id).await.map_err(|e| match e {
            AppError::NotFound { .. } => {
                AppError::validation(format!("Inventory item not found: {}", req.item_id))
            }
            other => other,
        })?;

        if let Some(resident_id) = &req.resident_id {
            self.repo.get_resident(resident_id).await.map_err(|e| match e {
                AppError::NotFound { .. } => {
                    AppError::validation(format!("Resident not found: {}", resident_id))
                }
                other => other,
            })?;
        }

        let req = LoanRequest { borrower_name, ..req };

        let mut tx = self.repo.begin().await?;

        let available = item.quantity - Repository::quantity_on_loan(&mut tx, &item.id).await?;
        if req.quantity > available {
            return Err(AppError::validation(format!(
                "Only {} of '{}' available",
                available, item.name
            )));
        }

        let loan = Repository::insert_loan(&mut tx, &req).await?;
        tx.commit().await?;

        tracing::info!("Loan {} created: {} x {}", loan.id, loan.quantity, item.name);
        Ok(loan)
    }

    pub async fn list_loans(&self, status: Option<LoanStatus>) -> Result<Vec<InventoryLoan>> {
        self.repo.list_loans(status).await
    }

    pub async fn return_loan(&self, id: &str, returned_date: NaiveDate) -> Result<InventoryLoan> {
        let loan = self.repo.get_loan(id).await?;

        if returned_date < loan.loan_date {
            return Err(AppError::validation("returnedDate cannot be before loanDate"));
        }

        let returned = self
            .repo
            .mark_loan_returned(id, returned_date)
            .await?
            .ok_or_else(|| AppError::validation("Loan has already been returned"))?;

        tracing::info!("Loan returned: {}", id);
        Ok(returned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;
    use crate::database::ItemCondition;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn loan(item_id: &str, quantity: i64) -> LoanRequest {
        LoanRequest {
            item_id: item_id.to_string(),
            borrower_name: "Pak Budi".to_string(),
            resident_id: None,
            quantity,
            loan_date: date(2025, 5, 1),
        }
    }

    async fn setup() -> (InventoryService, InventoryItemStock) {
        let service = InventoryService::new(create_test_repo().await);
        let chairs = service
            .create_item(InventoryItemRequest {
                name: "Kursi lipat".to_string(),
                quantity: 50,
                condition: ItemCondition::Good,
                remarks: String::new(),
            })
            .await
            .unwrap();
        (service, chairs)
    }

    #[tokio::test]
    async fn test_loans_reduce_availability() {
        let (service, chairs) = setup().await;
        assert_eq!(chairs.available, 50);

        let first = service.create_loan(loan(&chairs.item.id, 30)).await.unwrap();
        assert_eq!(service.get_item(&chairs.item.id).await.unwrap().available, 20);

        let too_many = service.create_loan(loan(&chairs.item.id, 21)).await;
        assert!(matches!(too_many, Err(AppError::Validation(_))));

        service.return_loan(&first.id, date(2025, 5, 3)).await.unwrap();
        assert_eq!(service.get_item(&chairs.item.id).await.unwrap().available, 50);

        let again = service.return_loan(&first.id, date(2025, 5, 4)).await;
        assert!(matches!(again, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_item_guards() {
        let (service, chairs) = setup().await;
        service.create_loan(loan(&chairs.item.id, 10)).await.unwrap();

        let shrink = service
            .update_item(
                &chairs.item.id,
                InventoryItemRequest {
                    name: "Kursi lipat".to_string(),
                    quantity: 5,
                    condition: ItemCondition::Good,
                    remarks: String::new(),
                },
            )
            .await;
        assert!(matches!(shrink, Err(AppError::Validation(_))));

        assert!(matches!(
            service.delete_item(&chairs.item.id).await,
            Err(AppError::Validation(_))
        ));

        let unknown = service.create_loan(loan("missing", 1)).await;
        assert!(matches!(unknown, Err(AppError::Validation(_))));

        let zero = service.create_loan(loan(&chairs.item.id, 0)).await;
        assert!(matches!(zero, Err(AppError::Validation(_))));
    }
}
