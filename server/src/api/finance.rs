//! Dues, income, expense and report endpoints

use super::today;
use crate::app::AppState;
use crate::database::{
    DateRange, ExpenseRequest, ExpenseTransaction, IncomeDetail, IncomeRequest, IncomeTransaction,
    LedgerEntry,
};
use crate::error::Result;
use crate::services::dues::{DuesStatusEntry, DuesStatusQuery};
use crate::services::finance::{FinanceReport, ReportQuery};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

/// Listing filter for income and expense
#[derive(Debug, Default, Deserialize)]
struct TransactionQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    remarks: Option<String>,
}

impl TransactionQuery {
    fn range(&self) -> DateRange {
        DateRange {
            from: self.from,
            to: self.to,
        }
    }

    fn remarks(&self) -> Option<&str> {
        self.remarks.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/finance/iuran/status", get(dues_status))
        .route("/finance/iuran/ledger/:address_id", get(dues_ledger))
        .route("/finance/income", get(list_income).post(create_income))
        .route(
            "/finance/income/:id",
            get(get_income).put(update_income).delete(delete_income),
        )
        .route("/finance/expense", get(list_expenses).post(create_expense))
        .route(
            "/finance/expense/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/finance/report", get(report))
}

// ===== Dues =====

async fn dues_status(
    State(state): State<AppState>,
    Query(query): Query<DuesStatusQuery>,
) -> Result<Json<Vec<DuesStatusEntry>>> {
    Ok(Json(state.dues.status(&query, today()).await?))
}

async fn dues_ledger(
    State(state): State<AppState>,
    Path(address_id): Path<String>,
) -> Result<Json<Vec<LedgerEntry>>> {
    Ok(Json(state.dues.ledger_for_address(&address_id).await?))
}

// ===== Income =====

async fn list_income(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<IncomeTransaction>>> {
    let income = state
        .finance
        .list_income(&query.range(), query.remarks())
        .await?;
    Ok(Json(income))
}

async fn create_income(
    State(state): State<AppState>,
    Json(req): Json<IncomeRequest>,
) -> Result<(StatusCode, Json<IncomeDetail>)> {
    let income = state.finance.create_income(req).await?;
    Ok((StatusCode::CREATED, Json(income)))
}

async fn get_income(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<IncomeDetail>> {
    Ok(Json(state.finance.get_income(&id).await?))
}

async fn update_income(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<IncomeRequest>,
) -> Result<Json<IncomeDetail>> {
    Ok(Json(state.finance.update_income(&id, req).await?))
}

async fn delete_income(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.finance.delete_income(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Expense =====

async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<TransactionQuery>,
) -> Result<Json<Vec<ExpenseTransaction>>> {
    let expenses = state
        .finance
        .list_expenses(&query.range(), query.remarks())
        .await?;
    Ok(Json(expenses))
}

async fn create_expense(
    State(state): State<AppState>,
    Json(req): Json<ExpenseRequest>,
) -> Result<(StatusCode, Json<ExpenseTransaction>)> {
    let expense = state.finance.create_expense(req).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn get_expense(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ExpenseTransaction>> {
    Ok(Json(state.finance.get_expense(&id).await?))
}

async fn update_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ExpenseRequest>,
) -> Result<Json<ExpenseTransaction>> {
    Ok(Json(state.finance.update_expense(&id, req).await?))
}

async fn delete_expense(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.finance.delete_expense(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Report =====

async fn report(State(state): State<AppState>, Query(query): Query<ReportQuery>) -> Result<Json<FinanceReport>> {
    Ok(Json(state.finance.report(&query).await?))
}
