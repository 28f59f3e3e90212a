use std::sync::Arc;

use axum::{Router, middleware, routing::get};

use crate::{
    server::AppState,
    transport::{
        middleware::{add_response_headers, check_auth},
        routes::{crawl, info, relay, resolve},
    },
};

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/resolve", get(resolve::get_resolve))
        .route("/crawl", get(crawl::get_crawl))
        .route("/relay", get(relay::get_relay))
        .route("/version", get(info::get_version))
        .layer(middleware::from_fn_with_state(state.clone(), check_auth))
        .layer(middleware::from_fn(add_response_headers))
        .with_state(state)
}
