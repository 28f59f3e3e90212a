use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{common::errors::RelayError, server::AppState};

#[derive(Debug, Deserialize)]
pub struct RelayQuery {
    pub url: Option<String>,
}

/// GET /relay?url=... with an optional `Range` header.
pub async fn get_relay(
    Query(params): Query<RelayQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let Some(url) = params.url.filter(|u| !u.trim().is_empty()) else {
        return RelayError::InvalidUrl("missing url parameter".to_string()).into_response();
    };
    tracing::debug!("GET /relay range={:?}", range);

    match state.relay.open(&url, range).await {
        Ok(relayed) => relayed.into_response(),
        Err(e) => {
            tracing::warn!("GET /relay failed: {}", e);
            e.into_response()
        }
    }
}
