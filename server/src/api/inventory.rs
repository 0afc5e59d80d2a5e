use crate::app::AppState;
use crate::database::{InventoryItemRequest, InventoryItemStock, InventoryLoan, LoanRequest, LoanStatus, ReturnRequest};
use crate::error::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct LoanQuery {
    status: Option<LoanStatus>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory/items", get(list_items).post(create_item))
        .route(
            "/inventory/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/inventory/loans", get(list_loans).post(create_loan))
        .route("/inventory/loans/:id/return", post(return_loan))
}

async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<InventoryItemStock>>> {
    Ok(Json(state.inventory.list_items().await?))
}

async fn create_item(
    State(state): State<AppState>,
    Json(req): Json<InventoryItemRequest>,
) -> Result<(StatusCode, Json<InventoryItemStock>)> {
    let item = state.inventory.create_item(req).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_item(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<InventoryItemStock>> {
    Ok(Json(state.inventory.get_item(&id).await?))
}

async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<InventoryItemRequest>,
) -> Result<Json<InventoryItemStock>> {
    Ok(Json(state.inventory.update_item(&id, req).await?))
}

async fn delete_item(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.inventory.delete_item(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_loans(
    State(state): State<AppState>,
    Query(query): Query<LoanQuery>,
) -> Result<Json<Vec<InventoryLoan>>> {
    Ok(Json(state.inventory.list_loans(query.status).await?))
}

async fn create_loan(
    State(state): State<AppState>,
    Json(req): Json<LoanRequest>,
) -> Result<(StatusCode, Json<InventoryLoan>)> {
    let loan = state.inventory.create_loan(req).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

async fn return_loan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ReturnRequest>,
) -> Result<Json<InventoryLoan>> {
    Ok(Json(state.inventory.return_loan(&id, req.returned_date).await?))
}
