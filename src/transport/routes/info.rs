use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
}

/// GET /version
pub async fn get_version() -> Json<VersionInfo> {
    tracing::debug!("GET /version");
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}
