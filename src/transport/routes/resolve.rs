use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{
    common::{errors::ResolveError, error_response, types::MediaId},
    server::AppState,
    sources::youtube::{QualityCeiling, ResolvedStream, StreamKind, StreamResolution},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveQuery {
    pub media_id: Option<String>,
    pub kind: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    pub stream_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    pub video_container: Option<String>,
    pub audio_container: Option<String>,
    pub duration_seconds: u64,
    pub client: String,
}

impl From<ResolvedStream> for ResolveResponse {
    fn from(resolved: ResolvedStream) -> Self {
        match resolved.resolution {
            StreamResolution::Single(d) => Self {
                stream_type: "single",
                video_container: d.is_video.then(|| d.container.clone()),
                audio_container: d.is_audio.then(|| d.container.clone()),
                url: Some(d.url),
                video_url: None,
                audio_url: None,
                duration_seconds: resolved.duration_seconds,
                client: resolved.client,
            },
            StreamResolution::Dual { video, audio } => Self {
                stream_type: "dual",
                url: None,
                video_container: Some(video.container),
                audio_container: Some(audio.container),
                video_url: Some(video.url),
                audio_url: Some(audio.url),
                duration_seconds: resolved.duration_seconds,
                client: resolved.client,
            },
        }
    }
}

/// GET /resolve?mediaId=...&kind=video|audio&quality=...
pub async fn get_resolve(
    Query(params): Query<ResolveQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let raw_id = params.media_id.unwrap_or_default();
    tracing::info!(
        "GET /resolve mediaId={} kind={:?} quality={:?}",
        raw_id,
        params.kind,
        params.quality
    );

    let Some(media_id) = MediaId::parse(&raw_id) else {
        return ResolveError::InvalidMediaId(raw_id).into_response();
    };

    let kind_str = params.kind.unwrap_or_default();
    let Some(kind) = StreamKind::parse(&kind_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("invalid kind '{}', expected video or audio", kind_str),
        );
    };

    let quality_str = params.quality.unwrap_or_default();
    let Some(ceiling) = QualityCeiling::parse(&quality_str) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("invalid quality '{}'", quality_str),
        );
    };

    match state.resolver.resolve(&media_id, kind, ceiling).await {
        Ok(resolved) => {
            tracing::debug!("Resolved {} via {}", media_id, resolved.client);
            Json(ResolveResponse::from(resolved)).into_response()
        }
        Err(e) => {
            tracing::warn!("GET /resolve {}: {}", media_id, e);
            e.into_response()
        }
    }
}
