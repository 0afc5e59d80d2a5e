use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::auth::LoginResponse;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Id of the user owning the session, available to protected handlers
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_session(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response> {
    let token = bearer_token(request.headers()).ok_or(AppError::Unauthorized)?;
    let user_id = state.auth.authenticate(token, Utc::now()).await?;

    request.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(request).await)
}

pub async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> Result<Json<LoginResponse>> {
    let response = state.auth.login(&req.username, &req.password, Utc::now()).await?;

    // Ledger retention also runs after every sign-in
    state.retention.spawn_cleanup(super::today());

    Ok(Json(response))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    headers: HeaderMap,
) -> Result<StatusCode> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    state.auth.logout(token).await?;

    tracing::info!("User {} logged out", user_id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }
}
