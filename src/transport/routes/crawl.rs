use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    common::{errors::CrawlError, types::ListingId},
    server::AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlQuery {
    pub listing_id: Option<String>,
    /// Kept as text so a bad number gets a JSON error from the handler.
    pub max_pages: Option<String>,
}

/// GET /crawl?listingId=...&maxPages=...
pub async fn get_crawl(
    Query(params): Query<CrawlQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let raw_id = params.listing_id.unwrap_or_default();
    tracing::info!("GET /crawl listingId={} maxPages={:?}", raw_id, params.max_pages);

    let Some(listing_id) = ListingId::parse(&raw_id) else {
        return CrawlError::InvalidListingId(raw_id).into_response();
    };

    let requested = match params.max_pages.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => return CrawlError::InvalidMaxPages(raw.to_string()).into_response(),
        },
    };

    let limit = state.config.crawler.max_pages;
    let max_pages = requested.map_or(limit, |requested| requested.min(limit));

    match state.crawler.crawl(&listing_id, max_pages).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::warn!("GET /crawl {}: {}", listing_id, e);
            e.into_response()
        }
    }
}
