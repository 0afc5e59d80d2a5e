use super::Repository;
use crate::database::models::{
    InventoryItem, InventoryItemRequest, InventoryLoan, LoanRequest, LoanStatus,
};
use crate::error::{AppError, Result};
use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

impl Repository {
    pub async fn create_item(&self, req: &InventoryItemRequest) -> Result<InventoryItem> {
        let id = Uuid::new_v4().to_string();

        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory_items (id, name, quantity, condition, remarks, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.name)
        .bind(req.quantity)
        .bind(req.condition)
        .bind(&req.remarks)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created inventory item: {}", id);
        Ok(item)
    }

    pub async fn get_item(&self, id: &str) -> Result<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Inventory item", id))
    }

    pub async fn list_items(&self) -> Result<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory_items ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    pub async fn update_item(&self, id: &str, req: &InventoryItemRequest) -> Result<InventoryItem> {
        sqlx::query_as::<_, InventoryItem>(
            r#"
            UPDATE inventory_items SET name = ?, quantity = ?, condition = ?, remarks = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(req.quantity)
        .bind(req.condition)
        .bind(&req.remarks)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Inventory item", id))
    }

    pub async fn delete_item(&self, id: &str) -> Result<()> {
        let rows = sqlx::query("DELETE FROM inventory_items WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Inventory item", id));
        }

        tracing::debug!("Deleted inventory item: {}", id);
        Ok(())
    }

    /// Units of an item currently out on loan
    pub async fn quantity_on_loan(conn: &mut SqliteConnection, item_id: &str) -> Result<i64> {
        let lent: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM inventory_loans WHERE item_id = ? AND status = 'borrowed'",
        )
        .bind(item_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(lent)
    }

    pub async fn insert_loan(conn: &mut SqliteConnection, req: &LoanRequest) -> Result<InventoryLoan> {
        let id = Uuid::new_v4().to_string();

        let loan = sqlx::query_as::<_, InventoryLoan>(
            r#"
            INSERT INTO inventory_loans (
                id, item_id, borrower_name, resident_id, quantity, loan_date, status, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.item_id)
        .bind(&req.borrower_name)
        .bind(&req.resident_id)
        .bind(req.quantity)
        .bind(req.loan_date)
        .bind(LoanStatus::Borrowed)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created loan {} for item {}", id, req.item_id);
        Ok(loan)
    }

    pub async fn get_loan(&self, id: &str) -> Result<InventoryLoan> {
        sqlx::query_as::<_, InventoryLoan>("SELECT * FROM inventory_loans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Loan", id))
    }

    pub async fn list_loans(&self, status: Option<LoanStatus>) -> Result<Vec<InventoryLoan>> {
        let loans = sqlx::query_as::<_, InventoryLoan>(
            r#"
            SELECT * FROM inventory_loans
            WHERE (?1 IS NULL OR status = ?1)
            ORDER BY loan_date DESC, created_at DESC
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    /// Close a loan. Returns `None` when the loan was already returned.
    pub async fn mark_loan_returned(&self, id: &str, returned_date: NaiveDate) -> Result<Option<InventoryLoan>> {
        let loan = sqlx::query_as::<_, InventoryLoan>(
            r#"
            UPDATE inventory_loans SET status = ?, returned_date = ?
            WHERE id = ? AND status = 'borrowed'
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Returned)
        .bind(returned_date)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(loan)
    }
}
