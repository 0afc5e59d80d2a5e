use super::Repository;
use crate::database::models::{
    DateRange, ExpenseRequest, ExpenseTransaction, IncomeTransaction, LedgerEntry, RecordStatus,
};
use crate::error::{AppError, Result};
use crate::period::DuesMonth;
use chrono::{NaiveDate, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

/// Validated income fields ready to be written
#[derive(Debug, Clone)]
pub struct NewIncome {
    pub resident_id: Option<String>,
    pub address_id: Option<String>,
    pub transaction_amount: i64,
    pub transaction_date: NaiveDate,
    pub remarks: String,
}

impl Repository {
    // ===== Income =====

    pub async fn insert_income(conn: &mut SqliteConnection, income: &NewIncome) -> Result<IncomeTransaction> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let row = sqlx::query_as::<_, IncomeTransaction>(
            r#"
            INSERT INTO income (
                id, resident_id, address_id, transaction_amount, transaction_date, remarks,
                status, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&income.resident_id)
        .bind(&income.address_id)
        .bind(income.transaction_amount)
        .bind(income.transaction_date)
        .bind(&income.remarks)
        .bind(RecordStatus::Active)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Inserted income: {}", id);
        Ok(row)
    }

    pub async fn update_income(
        conn: &mut SqliteConnection,
        id: &str,
        income: &NewIncome,
    ) -> Result<IncomeTransaction> {
        sqlx::query_as::<_, IncomeTransaction>(
            r#"
            UPDATE income
            SET resident_id = ?, address_id = ?, transaction_amount = ?, transaction_date = ?,
                remarks = ?, updated_at = ?
            WHERE id = ? AND status = 'A'
            RETURNING *
            "#,
        )
        .bind(&income.resident_id)
        .bind(&income.address_id)
        .bind(income.transaction_amount)
        .bind(income.transaction_date)
        .bind(&income.remarks)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found("Income", id))
    }

    pub async fn soft_delete_income(conn: &mut SqliteConnection, id: &str) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE income SET status = 'D', updated_at = ? WHERE id = ? AND status = 'A'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Income", id));
        }

        tracing::debug!("Soft deleted income: {}", id);
        Ok(())
    }

    pub async fn get_income(&self, id: &str) -> Result<IncomeTransaction> {
        sqlx::query_as::<_, IncomeTransaction>("SELECT * FROM income WHERE id = ? AND status = 'A'")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Income", id))
    }

    /// Active income in a date range, optionally filtered by remarks substring
    pub async fn list_income(&self, range: &DateRange, remarks: Option<&str>) -> Result<Vec<IncomeTransaction>> {
        let pattern = remarks.map(|r| format!("%{}%", r.trim().to_lowercase()));

        let rows = sqlx::query_as::<_, IncomeTransaction>(
            r#"
            SELECT * FROM income
            WHERE status = 'A'
              AND (?1 IS NULL OR transaction_date >= ?1)
              AND (?2 IS NULL OR transaction_date <= ?2)
              AND (?3 IS NULL OR LOWER(remarks) LIKE ?3)
            ORDER BY transaction_date ASC, created_at ASC
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    // ===== Dues ledger =====

    /// Raw month keys of the active ledger rows for an address
    pub async fn active_ledger_months(&self, address_id: &str) -> Result<Vec<String>> {
        let months: Vec<String> = sqlx::query_scalar(
            "SELECT month FROM donation_history WHERE address_id = ? AND status = 'A'",
        )
        .bind(address_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(months)
    }

    /// Id of the active ledger row for (address, month), if one exists
    pub async fn find_active_ledger_entry(
        conn: &mut SqliteConnection,
        address_id: &str,
        month: DuesMonth,
    ) -> Result<Option<String>> {
        let id: Option<String> = sqlx::query_scalar(
            "SELECT id FROM donation_history WHERE address_id = ? AND month = ? AND status = 'A'",
        )
        .bind(address_id)
        .bind(month.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(id)
    }

    pub async fn insert_ledger_entry(
        conn: &mut SqliteConnection,
        address_id: &str,
        month: DuesMonth,
        amount: i64,
        date_paid: NaiveDate,
        income_id: &str,
    ) -> Result<LedgerEntry> {
        let id = Uuid::new_v4().to_string();

        let entry = sqlx::query_as::<_, LedgerEntry>(
            r#"
            INSERT INTO donation_history (id, address_id, month, amount, date_paid, income_id, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(address_id)
        .bind(month.to_string())
        .bind(amount)
        .bind(date_paid)
        .bind(income_id)
        .bind(RecordStatus::Active)
        .bind(Utc::now())
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Inserted ledger entry {} for {} ({})", id, address_id, month);
        Ok(entry)
    }

    /// Flip every active ledger row of an income to `D`
    pub async fn soft_delete_ledger_for_income(conn: &mut SqliteConnection, income_id: &str) -> Result<u64> {
        let rows = sqlx::query(
            "UPDATE donation_history SET status = 'D' WHERE income_id = ? AND status = 'A'",
        )
        .bind(income_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        tracing::debug!("Soft deleted {} ledger rows of income {}", rows, income_id);
        Ok(rows)
    }

    /// All ledger rows of an income, deleted ones included
    pub async fn list_ledger_for_income(&self, income_id: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM donation_history WHERE income_id = ? ORDER BY month ASC",
        )
        .bind(income_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// All ledger rows of an address, deleted ones included
    pub async fn list_ledger_for_address(&self, address_id: &str) -> Result<Vec<LedgerEntry>> {
        let rows = sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM donation_history WHERE address_id = ? ORDER BY month ASC, created_at ASC",
        )
        .bind(address_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Physically remove ledger rows for months before `cutoff`
    pub async fn purge_ledger_before(&self, cutoff: DuesMonth) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM donation_history WHERE month < ?")
            .bind(cutoff.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows)
    }

    // ===== Expense =====

    pub async fn create_expense(&self, req: &ExpenseRequest) -> Result<ExpenseTransaction> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        let expense = sqlx::query_as::<_, ExpenseTransaction>(
            r#"
            INSERT INTO expense (id, remarks, transaction_amount, transaction_date, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&req.remarks)
        .bind(req.transaction_amount)
        .bind(req.transaction_date)
        .bind(RecordStatus::Active)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created expense: {}", id);
        Ok(expense)
    }

    pub async fn get_expense(&self, id: &str) -> Result<ExpenseTransaction> {
        sqlx::query_as::<_, ExpenseTransaction>("SELECT * FROM expense WHERE id = ? AND status = 'A'")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("Expense", id))
    }

    pub async fn list_expenses(&self, range: &DateRange, remarks: Option<&str>) -> Result<Vec<ExpenseTransaction>> {
        let pattern = remarks.map(|r| format!("%{}%", r.trim().to_lowercase()));

        let rows = sqlx::query_as::<_, ExpenseTransaction>(
            r#"
            SELECT * FROM expense
            WHERE status = 'A'
              AND (?1 IS NULL OR transaction_date >= ?1)
              AND (?2 IS NULL OR transaction_date <= ?2)
              AND (?3 IS NULL OR LOWER(remarks) LIKE ?3)
            ORDER BY transaction_date ASC, created_at ASC
            "#,
        )
        .bind(range.from)
        .bind(range.to)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_expense(&self, id: &str, req: &ExpenseRequest) -> Result<ExpenseTransaction> {
        sqlx::query_as::<_, ExpenseTransaction>(
            r#"
            UPDATE expense
            SET remarks = ?, transaction_amount = ?, transaction_date = ?, updated_at = ?
            WHERE id = ? AND status = 'A'
            RETURNING *
            "#,
        )
        .bind(&req.remarks)
        .bind(req.transaction_amount)
        .bind(req.transaction_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("Expense", id))
    }

    pub async fn soft_delete_expense(&self, id: &str) -> Result<()> {
        let rows = sqlx::query(
            "UPDATE expense SET status = 'D', updated_at = ? WHERE id = ? AND status = 'A'",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("Expense", id));
        }

        tracing::debug!("Soft deleted expense: {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::repository::test_support::create_test_repo;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_income_and_ledger_lifecycle() {
        let repo = create_test_repo().await;
        let address = repo.create_address("Jl. Kenanga 7").await.unwrap();
        let march = DuesMonth::new(2025, 3).unwrap();

        let mut tx = repo.begin().await.unwrap();
        let income = Repository::insert_income(
            &mut tx,
            &NewIncome {
                resident_id: None,
                address_id: Some(address.id.clone()),
                transaction_amount: 50_000,
                transaction_date: date(2025, 3, 5),
                remarks: "Iuran".to_string(),
            },
        )
        .await
        .unwrap();
        Repository::insert_ledger_entry(&mut tx, &address.id, march, 50_000, date(2025, 3, 5), &income.id)
            .await
            .unwrap();

        let found = Repository::find_active_ledger_entry(&mut tx, &address.id, march)
            .await
            .unwrap();
        assert!(found.is_some());
        tx.commit().await.unwrap();

        assert_eq!(repo.active_ledger_months(&address.id).await.unwrap(), vec!["2025-03"]);

        let mut tx = repo.begin().await.unwrap();
        assert_eq!(Repository::soft_delete_ledger_for_income(&mut tx, &income.id).await.unwrap(), 1);
        Repository::soft_delete_income(&mut tx, &income.id).await.unwrap();
        tx.commit().await.unwrap();

        assert!(repo.active_ledger_months(&address.id).await.unwrap().is_empty());
        let rows = repo.list_ledger_for_income(&income.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, RecordStatus::Deleted);
        assert!(matches!(repo.get_income(&income.id).await, Err(AppError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_expense_filters() {
        let repo = create_test_repo().await;

        for (remarks, day) in [("Kebersihan", 3), ("Listrik pos ronda", 10), ("Kebersihan got", 20)] {
            repo.create_expense(&ExpenseRequest {
                remarks: remarks.to_string(),
                transaction_amount: 10_000,
                transaction_date: date(2025, 1, day),
            })
            .await
            .unwrap();
        }

        let all = repo.list_expenses(&DateRange::default(), None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].transaction_date, date(2025, 1, 3));

        let range = DateRange {
            from: Some(date(2025, 1, 5)),
            to: Some(date(2025, 1, 31)),
        };
        let ranged = repo.list_expenses(&range, Some("KEBERSIHAN")).await.unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].remarks, "Kebersihan got");

        repo.soft_delete_expense(&all[0].id).await.unwrap();
        assert_eq!(repo.list_expenses(&DateRange::default(), None).await.unwrap().len(), 2);
    }
}
