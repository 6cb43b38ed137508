use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use beststories::{BEST_STORIES_STATUS_HEADER, SourceError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(#[from] SourceError),
}

impl GatewayError {
    /// HTTP status and `x-best-stories-status` code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Upstream(SourceError::Transport { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_error")
            }
            GatewayError::Upstream(SourceError::NotFound { .. }) => {
                (StatusCode::BAD_GATEWAY, "upstream_not_found")
            }
            GatewayError::Upstream(SourceError::Cancelled) => {
                (StatusCode::SERVICE_UNAVAILABLE, "cancelled")
            }
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, status_code) = self.status();

        let mut headers = HeaderMap::new();
        headers.insert(
            BEST_STORIES_STATUS_HEADER,
            HeaderValue::from_static(status_code),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
