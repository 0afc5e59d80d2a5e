use crate::app::AppState;
use crate::error::Result;
use crate::services::settings::RegionSettings;
use axum::{extract::State, routing::get, Json, Router};

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(State(state): State<AppState>) -> Result<Json<RegionSettings>> {
    Ok(Json(state.settings.load().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<RegionSettings>,
) -> Result<Json<RegionSettings>> {
    Ok(Json(state.settings.update(settings).await?))
}
