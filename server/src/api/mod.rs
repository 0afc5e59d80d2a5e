//! HTTP API
//!
//! Axum routers for every area. `/health` and `/auth/login` are public;
//! everything else sits behind the bearer-token session layer.

mod auth;
mod finance;
mod inventory;
mod letters;
mod registry;
mod settings;

use crate::app::AppState;
use crate::error::Result;
use axum::{middleware, routing::get, routing::post, Router};
use chrono::{Local, NaiveDate};
use std::net::SocketAddr;

pub use auth::bearer_token;

/// Local calendar date used for dues classification and date validation
fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/logout", post(auth::logout))
        .merge(settings::router())
        .merge(registry::router())
        .merge(finance::router())
        .merge(inventory::router())
        .merge(letters::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
