//! Address, household and resident endpoints

use super::today;
use crate::app::AppState;
use crate::config::MAX_IMPORT_BYTES;
use crate::database::{
    Address, AddressRequest, Household, HouseholdRequest, InactiveReason, Resident,
    ResidentFilter, ResidentRequest,
};
use crate::error::Result;
use crate::services::import::ImportReport;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HouseholdQuery {
    address_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DeactivateQuery {
    reason: Option<InactiveReason>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list_addresses).post(create_address))
        .route(
            "/addresses/import",
            post(import_addresses).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route(
            "/addresses/:id",
            get(get_address).put(update_address).delete(delete_address),
        )
        .route("/households", get(list_households).post(create_household))
        .route(
            "/households/:kk",
            get(get_household).put(update_household).delete(delete_household),
        )
        .route("/residents", get(list_residents).post(create_resident))
        .route(
            "/residents/import",
            post(import_residents).layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES)),
        )
        .route(
            "/residents/:id",
            get(get_resident).put(update_resident).delete(deactivate_resident),
        )
}

// ===== Addresses =====

async fn list_addresses(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.addresses.list_addresses(query.q.as_deref()).await?))
}

async fn create_address(
    State(state): State<AppState>,
    Json(req): Json<AddressRequest>,
) -> Result<(StatusCode, Json<Address>)> {
    let address = state.addresses.create_address(&req.full_address).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

async fn get_address(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Address>> {
    Ok(Json(state.addresses.get_address(&id).await?))
}

async fn update_address(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AddressRequest>,
) -> Result<Json<Address>> {
    Ok(Json(state.addresses.update_address(&id, &req.full_address).await?))
}

async fn delete_address(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.addresses.delete_address(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn import_addresses(State(state): State<AppState>, body: Bytes) -> Result<Json<ImportReport>> {
    Ok(Json(state.import.import_addresses(&body).await?))
}

// ===== Households =====

async fn list_households(
    State(state): State<AppState>,
    Query(query): Query<HouseholdQuery>,
) -> Result<Json<Vec<Household>>> {
    let households = state
        .households
        .list_households(query.address_id.as_deref())
        .await?;
    Ok(Json(households))
}

async fn create_household(
    State(state): State<AppState>,
    Json(req): Json<HouseholdRequest>,
) -> Result<(StatusCode, Json<Household>)> {
    let household = state.households.create_household(req).await?;
    Ok((StatusCode::CREATED, Json(household)))
}

async fn get_household(State(state): State<AppState>, Path(kk): Path<String>) -> Result<Json<Household>> {
    Ok(Json(state.households.get_household(&kk).await?))
}

async fn update_household(
    State(state): State<AppState>,
    Path(kk): Path<String>,
    Json(req): Json<HouseholdRequest>,
) -> Result<Json<Household>> {
    Ok(Json(state.households.update_household(&kk, req).await?))
}

async fn delete_household(State(state): State<AppState>, Path(kk): Path<String>) -> Result<StatusCode> {
    state.households.delete_household(&kk).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ===== Residents =====

async fn list_residents(
    State(state): State<AppState>,
    Query(filter): Query<ResidentFilter>,
) -> Result<Json<Vec<Resident>>> {
    Ok(Json(state.residents.list_residents(&filter).await?))
}

async fn create_resident(
    State(state): State<AppState>,
    Json(req): Json<ResidentRequest>,
) -> Result<(StatusCode, Json<Resident>)> {
    let resident = state.residents.create_resident(req, today()).await?;
    Ok((StatusCode::CREATED, Json(resident)))
}

async fn get_resident(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Resident>> {
    Ok(Json(state.residents.get_resident(&id).await?))
}

async fn update_resident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ResidentRequest>,
) -> Result<Json<Resident>> {
    Ok(Json(state.residents.update_resident(&id, req, today()).await?))
}

/// Residents are never removed; DELETE marks them inactive
async fn deactivate_resident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<DeactivateQuery>,
) -> Result<Json<Resident>> {
    let reason = query.reason.unwrap_or(InactiveReason::Other);
    Ok(Json(state.residents.deactivate_resident(&id, reason).await?))
}

async fn import_residents(State(state): State<AppState>, body: Bytes) -> Result<Json<ImportReport>> {
    Ok(Json(state.import.import_residents(&body, today()).await?))
}
