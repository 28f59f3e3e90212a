use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures of a single-media resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid media id: '{0}'")]
    InvalidMediaId(String),

    /// Every configured client identity rejected the negotiation.
    #[error("all client profiles rejected '{media_id}': {last_reason}")]
    ClientProfileExhausted {
        media_id: String,
        last_reason: String,
    },

    #[error("no {kind} stream available for '{media_id}'")]
    NoStreamAvailable { media_id: String, kind: String },
}

impl ResolveError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidMediaId(_) => StatusCode::BAD_REQUEST,
            Self::ClientProfileExhausted { .. } => StatusCode::BAD_GATEWAY,
            Self::NoStreamAvailable { .. } => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.to_string())
    }
}

/// Failures of a listing crawl. Only the first page can fail the request;
/// later pages degrade to a partial result.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid listing id: '{0}'")]
    InvalidListingId(String),

    #[error("invalid maxPages: '{0}'")]
    InvalidMaxPages(String),

    #[error("failed to load first page of '{listing_id}': {reason}")]
    FirstPage { listing_id: String, reason: String },
}

impl CrawlError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidListingId(_) | Self::InvalidMaxPages(_) => StatusCode::BAD_REQUEST,
            Self::FirstPage { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for CrawlError {
    fn into_response(self) -> Response {
        error_response(self.status(), self.to_string())
    }
}

/// Failures of a byte relay.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid relay url: {0}")]
    InvalidUrl(String),

    /// Target host is not on the CDN allow-list. No request is ever made.
    #[error("host '{0}' is not allowed")]
    DisallowedHost(String),

    /// Connection reset, timeout or 5xx; retried per chunk.
    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    #[error("upstream responded with status {0}")]
    UpstreamStatus(u16),

    #[error("requested range not satisfiable (total {total} bytes)")]
    RangeNotSatisfiable { total: u64 },

    #[error("upstream answered range starting at {expected} with {actual}")]
    UnexpectedUpstreamRange { expected: u64, actual: String },
}

impl RelayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            Self::DisallowedHost(_) => StatusCode::FORBIDDEN,
            Self::RangeNotSatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Transient(_)
            | Self::RetriesExhausted { .. }
            | Self::UpstreamStatus(_)
            | Self::UnexpectedUpstreamRange { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        // Anything reqwest reports on the way to or from the CDN is a
        // connection-level problem at this layer.
        Self::Transient(e.to_string())
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let mut response = error_response(self.status(), self.to_string());
        if let Self::RangeNotSatisfiable { total } = self {
            if let Ok(v) = HeaderValue::from_str(&format!("bytes */{}", total)) {
                response.headers_mut().insert(header::CONTENT_RANGE, v);
            }
        }
        response
    }
}

/// JSON `{ "error": message }` body used by every failing route.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}
