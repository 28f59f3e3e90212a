use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{common::errors::error_response, server::AppState};

pub const API_VERSION_HEADER: &str = "Tuberelay-Api-Version";
pub const API_VERSION: &str = "1";

/// Requires `Authorization: <password>` when a password is configured.
/// `/version` stays open for health checks.
pub async fn check_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let Some(password) = state.config.server.password.as_deref() else {
        return next.run(req).await;
    };
    if req.uri().path() == "/version" {
        return next.run(req).await;
    }

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header {
        Some(auth) if auth == password => next.run(req).await,
        Some(_) => {
            warn!("Authorization failed for {}: invalid password", req.uri().path());
            error_response(StatusCode::UNAUTHORIZED, "invalid password")
        }
        None => {
            warn!(
                "Authorization failed for {}: missing Authorization header",
                req.uri().path()
            );
            error_response(StatusCode::UNAUTHORIZED, "missing Authorization header")
        }
    }
}

pub async fn add_response_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(API_VERSION_HEADER, HeaderValue::from_static(API_VERSION));
    response
}
