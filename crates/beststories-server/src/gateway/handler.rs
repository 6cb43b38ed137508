use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use beststories::{BEST_STORIES_STATUS_HEADER, ItemSource};

/// Query string of the top-N endpoint.
#[derive(Debug, Deserialize)]
pub struct BestStoriesParams {
    pub n: Option<i64>,
}

impl BestStoriesParams {
    /// Validated story count. Missing or negative values are rejected.
    pub fn count(&self) -> Result<usize, GatewayError> {
        let n = self.n.ok_or_else(|| {
            GatewayError::InvalidRequest("missing query parameter 'n'".to_string())
        })?;
        usize::try_from(n).map_err(|_| {
            GatewayError::InvalidRequest(format!("'n' must be a non-negative integer, got {n}"))
        })
    }
}

#[instrument(skip(state, params), fields(count = tracing::field::Empty))]
pub async fn best_stories_handler<S>(
    State(state): State<HandlerState<S>>,
    params: Result<Query<BestStoriesParams>, QueryRejection>,
) -> Result<Response, GatewayError>
where
    S: ItemSource + 'static,
{
    let Query(params) = params.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let count = params.count()?;
    tracing::Span::current().record("count", count);

    // Dropping the handler future (client gone) cancels the aggregation too.
    let cancel = state.shutdown.child_token();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let top = match state.aggregator.top_n_with_status(count, &cancel).await {
        Ok(top) => top,
        Err(e) => {
            warn!(error = %e, "Best stories request failed");
            return Err(e.into());
        }
    };

    info!(
        returned = top.stories.len(),
        cache = %top.cache_status,
        "Served best stories"
    );

    let mut headers = HeaderMap::new();
    headers.insert(
        BEST_STORIES_STATUS_HEADER,
        HeaderValue::from_static(top.cache_status.as_header_value()),
    );

    Ok((StatusCode::OK, headers, Json(top.stories)).into_response())
}
