use crate::app::AppState;
use crate::database::{Letter, LetterRequest};
use crate::error::Result;
use crate::services::letters::LetterDetail;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LetterQuery {
    resident_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/letters", get(list_letters).post(issue_letter))
        .route("/letters/:id", get(get_letter).delete(delete_letter))
}

async fn list_letters(
    State(state): State<AppState>,
    Query(query): Query<LetterQuery>,
) -> Result<Json<Vec<Letter>>> {
    Ok(Json(state.letters.list_letters(query.resident_id.as_deref()).await?))
}

async fn issue_letter(
    State(state): State<AppState>,
    Json(req): Json<LetterRequest>,
) -> Result<(StatusCode, Json<LetterDetail>)> {
    let letter = state.letters.issue_letter(req).await?;
    Ok((StatusCode::CREATED, Json(letter)))
}

async fn get_letter(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<LetterDetail>> {
    Ok(Json(state.letters.get_letter(&id).await?))
}

async fn delete_letter(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    state.letters.delete_letter(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
