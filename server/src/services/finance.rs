//! Finance service
//!
//! Income (including dues payments), expenses, and the combined report.
//! Income writes that touch the dues ledger run in one transaction.

use crate::database::{
    Address, DateRange, ExpenseRequest, ExpenseTransaction, IncomeDetail, IncomeRequest,
    IncomeTransaction, NewIncome, RecordStatus, Repository,
};
use crate::error::{AppError, Result};
use crate::period::DuesMonth;
use crate::services::dues::{parse_months, write_ledger};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Income,
    Expense,
}

/// Query for `GET /finance/report`
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub kind: Option<EntryKind>,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub id: String,
    pub kind: EntryKind,
    pub transaction_date: NaiveDate,
    pub transaction_amount: i64,
    pub remarks: String,
    #[serde(skip)]
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinanceReport {
    pub entries: Vec<ReportEntry>,
    pub total_income: i64,
    pub total_expense: i64,
    pub net: i64,
}

/// Income request after boundary validation
struct ValidatedIncome {
    income: NewIncome,
    address: Option<Address>,
    months: Vec<DuesMonth>,
}

/// Service for income, expenses and reporting
#[derive(Clone)]
pub struct FinanceService {
    repo: Repository,
}

impl FinanceService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    async fn validate_income(&self, req: IncomeRequest) -> Result<ValidatedIncome> {
        if req.transaction_amount <= 0 {
            return Err(AppError::validation("transactionAmount must be greater than 0"));
        }

        let months = parse_months(&req.months)?;

        let address_id = req
            .address_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());
        let resident_id = req
            .resident_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty());

        if !months.is_empty() && address_id.is_none() {
            return Err(AppError::validation("addressId is required when paying dues months"));
        }

        let address = match &address_id {
            Some(id) => Some(self.repo.get_address(id).await.map_err(|e| match e {
                AppError::NotFound { .. } => AppError::validation(format!("Address not found: {}", id)),
                other => other,
            })?),
            None => None,
        };

        if let Some(id) = &resident_id {
            self.repo.get_resident(id).await.map_err(|e| match e {
                AppError::NotFound { .. } => AppError::validation(format!("Resident not found: {}", id)),
                other => other,
            })?;
        }

        Ok(ValidatedIncome {
            income: NewIncome {
                resident_id,
                address_id,
                transaction_amount: req.transaction_amount,
                transaction_date: req.transaction_date,
                remarks: req.remarks.unwrap_or_default().trim().to_string(),
            },
            address,
            months,
        })
    }

    /// Record income. With `months`, also records one ledger row per month;
    /// a month already paid for the address rejects the whole request.
    pub async fn create_income(&self, req: IncomeRequest) -> Result<IncomeDetail> {
        let validated = self.validate_income(req).await?;

        tracing::info!(
            "Recording income of {} ({} dues months)",
            validated.income.transaction_amount,
            validated.months.len()
        );

        let mut tx = self.repo.begin().await?;

        let income = Repository::insert_income(&mut tx, &validated.income).await?;

        let entries = match &validated.address {
            Some(address) if !validated.months.is_empty() => {
                write_ledger(
                    &mut tx,
                    address,
                    &validated.months,
                    income.transaction_amount,
                    income.transaction_date,
                    &income.id,
                )
                .await?
            }
            _ => Vec::new(),
        };

        tx.commit().await?;

        tracing::info!("Income recorded: {}", income.id);

        Ok(IncomeDetail {
            income,
            months: entries.into_iter().map(|e| e.month).collect(),
        })
    }

    /// Replace an income and its ledger rows. Previous rows are soft-deleted
    /// and the new month set is written fresh.
    pub async fn update_income(&self, id: &str, req: IncomeRequest) -> Result<IncomeDetail> {
        self.repo.get_income(id).await?;
        let validated = self.validate_income(req).await?;

        tracing::info!("Updating income: {}", id);

        let mut tx = self.repo.begin().await?;

        let income = Repository::update_income(&mut tx, id, &validated.income).await?;
        let replaced = Repository::soft_delete_ledger_for_income(&mut tx, id).await?;

        let entries = match &validated.address {
            Some(address) if !validated.months.is_empty() => {
                write_ledger(
                    &mut tx,
                    address,
                    &validated.months,
                    income.transaction_amount,
                    income.transaction_date,
                    &income.id,
                )
                .await?
            }
            _ => Vec::new(),
        };

        tx.commit().await?;

        tracing::info!(
            "Income {} updated ({} ledger rows replaced by {})",
            id,
            replaced,
            entries.len()
        );

        Ok(IncomeDetail {
            income,
            months: entries.into_iter().map(|e| e.month).collect(),
        })
    }

    /// Soft delete an income together with its ledger rows
    pub async fn delete_income(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting income: {}", id);

        let mut tx = self.repo.begin().await?;
        let rows = Repository::soft_delete_ledger_for_income(&mut tx, id).await?;
        Repository::soft_delete_income(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!("Income {} deleted ({} ledger rows)", id, rows);
        Ok(())
    }

    pub async fn get_income(&self, id: &str) -> Result<IncomeDetail> {
        let income = self.repo.get_income(id).await?;
        let months = self
            .repo
            .list_ledger_for_income(id)
            .await?
            .into_iter()
            .filter(|e| e.status == RecordStatus::Active)
            .map(|e| e.month)
            .collect();

        Ok(IncomeDetail { income, months })
    }

    pub async fn list_income(&self, range: &DateRange, remarks: Option<&str>) -> Result<Vec<IncomeTransaction>> {
        validate_range(range)?;
        self.repo.list_income(range, remarks).await
    }

    // ===== Expense =====

    pub async fn create_expense(&self, req: ExpenseRequest) -> Result<ExpenseTransaction> {
        let req = validate_expense(req)?;
        let expense = self.repo.create_expense(&req).await?;

        tracing::info!("Expense recorded: {}", expense.id);
        Ok(expense)
    }

    pub async fn get_expense(&self, id: &str) -> Result<ExpenseTransaction> {
        self.repo.get_expense(id).await
    }

    pub async fn list_expenses(&self, range: &DateRange, remarks: Option<&str>) -> Result<Vec<ExpenseTransaction>> {
        validate_range(range)?;
        self.repo.list_expenses(range, remarks).await
    }

    pub async fn update_expense(&self, id: &str, req: ExpenseRequest) -> Result<ExpenseTransaction> {
        let req = validate_expense(req)?;
        self.repo.update_expense(id, &req).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        tracing::info!("Deleting expense: {}", id);
        self.repo.soft_delete_expense(id).await
    }

    // ===== Report =====

    /// Income and expense rows matching the query, oldest first, with totals
    pub async fn report(&self, query: &ReportQuery) -> Result<FinanceReport> {
        let range = DateRange {
            from: query.from,
            to: query.to,
        };
        validate_range(&range)?;

        let remarks = query
            .remarks
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        let mut entries = Vec::new();

        if query.kind != Some(EntryKind::Expense) {
            entries.extend(self.repo.list_income(&range, remarks).await?.into_iter().map(|i| ReportEntry {
                id: i.id,
                kind: EntryKind::Income,
                transaction_date: i.transaction_date,
                transaction_amount: i.transaction_amount,
                remarks: i.remarks,
                created_at: i.created_at,
            }));
        }

        if query.kind != Some(EntryKind::Income) {
            entries.extend(self.repo.list_expenses(&range, remarks).await?.into_iter().map(|e| ReportEntry {
                id: e.id,
                kind: EntryKind::Expense,
                transaction_date: e.transaction_date,
                transaction_amount: e.transaction_amount,
                remarks: e.remarks,
                created_at: e.created_at,
            }));
        }

        entries.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then(a.created_at.cmp(&b.created_at))
        });

        let total_for = |kind: EntryKind| -> i64 {
            entries
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.transaction_amount)
                .sum()
        };
        let total_income = total_for(EntryKind::Income);
        let total_expense = total_for(EntryKind::Expense);

        Ok(FinanceReport {
            entries,
            total_income,
            total_expense,
            net: total_income - total_expense,
        })
    }
}

fn validate_range(range: &DateRange) -> Result<()> {
    match (range.from, range.to) {
        (Some(from), Some(to)) if from > to => Err(AppError::validation(format!(
            "Invalid date range: {} is after {}",
            from, to
        ))),
        _ => Ok(()),
    }
}

fn validate_expense(req: ExpenseRequest) -> Result<ExpenseRequest> {
    let remarks = req.remarks.trim().to_string();

    if remarks.is_empty() {
        return Err(AppError::validation("remarks is required"));
    }
    if req.transaction_amount <= 0 {
        return Err(AppError::validation("transactionAmount must be greater than 0"));
    }

    Ok(ExpenseRequest { remarks, ..req })
}
