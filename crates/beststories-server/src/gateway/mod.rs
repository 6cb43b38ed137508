//! HTTP gateway (Axum) for the best stories feed.
//!
//! This module is primarily used by the `beststories` server binary.

pub mod error;
pub mod handler;
pub mod state;


use axum::{
    Json, Router,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::TraceLayer;

pub use error::GatewayError;
pub use handler::{BestStoriesParams, best_stories_handler};
pub use state::HandlerState;

use beststories::{BEST_STORIES_STATUS_HEADER, BEST_STORIES_STATUS_HEALTHY, ItemSource};

/// Path of the top-N endpoint.
pub const BEST_STORIES_ROUTE: &str = "/api/hackernews/best-stories";

pub fn create_router_with_state<S>(state: HandlerState<S>) -> Router
where
    S: ItemSource + 'static,
{
    Router::new()
        .route("/healthz", get(health_handler))
        .route(BEST_STORIES_ROUTE, get(best_stories_handler::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        BEST_STORIES_STATUS_HEADER,
        HeaderValue::from_static(BEST_STORIES_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}
