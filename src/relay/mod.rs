//! Chunked, range-based byte relay from the CDN to the caller.

pub mod allowlist;
pub mod backoff;
pub mod chunker;
pub mod range;

use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::{StreamExt, TryStreamExt};
use reqwest::Url;

pub use allowlist::HostAllowList;
pub use backoff::RetryPolicy;
pub use chunker::{ByteStream, ChunkFetcher};
pub use range::{ByteRange, ContentRange};

use backoff::retry_transient;
use chunker::status_error;

use crate::{
    common::{errors::RelayError, http::HttpClient, types::AnyResult},
    configs::RelayConfig,
};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Status, headers and body of one relayed resource.
pub struct RelayResponse {
    pub status: StatusCode,
    pub content_type: String,
    /// Declared only when the body length is fixed up front. Chunked bodies
    /// can end early on a 416, so they go out with chunked encoding.
    pub content_length: Option<u64>,
    /// Upstream resource size, when known.
    pub total: Option<u64>,
    pub content_range: Option<String>,
    pub accept_ranges: bool,
    pub body: ByteStream,
}

impl std::fmt::Debug for RelayResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .field("total", &self.total)
            .field("content_range", &self.content_range)
            .field("accept_ranges", &self.accept_ranges)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&self.content_type) {
            headers.insert(header::CONTENT_TYPE, v);
        }
        if let Some(len) = self.content_length {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        }
        if let Some(v) = self
            .content_range
            .as_deref()
            .and_then(|cr| HeaderValue::from_str(cr).ok())
        {
            headers.insert(header::CONTENT_RANGE, v);
        }
        if self.accept_ranges {
            headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
        }

        (self.status, headers, Body::from_stream(self.body)).into_response()
    }
}

/// What the initial probe learned about the resource.
enum Probe {
    /// Range requests work; total size if upstream reported one.
    Ranged {
        total: Option<u64>,
        content_type: Option<String>,
    },
    /// Upstream ignored the range and sent the whole thing.
    Opaque(reqwest::Response),
    /// 416 to `bytes=0-0`: zero-length resource.
    Empty { content_type: Option<String> },
}

pub struct RangeRelay {
    http: reqwest::Client,
    config: RelayConfig,
    allowlist: HostAllowList,
}

impl RangeRelay {
    pub fn new(config: RelayConfig) -> AnyResult<Self> {
        let http = HttpClient::new_streaming(config.probe_timeout())?;
        Ok(Self::with_client(http, config))
    }

    pub fn with_client(http: reqwest::Client, config: RelayConfig) -> Self {
        let allowlist = HostAllowList::new(&config.allowed_hosts);
        Self {
            http,
            config,
            allowlist,
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Opens `url` for relaying. `range_header` is the caller's raw `Range`
    /// value; it is honoured when upstream reports a total size.
    pub async fn open(
        &self,
        url: &str,
        range_header: Option<&str>,
    ) -> Result<RelayResponse, RelayError> {
        let url = self.allowlist.check(url)?;
        let caller_range = range_header.and_then(ByteRange::parse);
        if range_header.is_some() && caller_range.is_none() {
            tracing::debug!("Ignoring malformed range header {:?}", range_header);
        }

        let host = url.host_str().unwrap_or("?").to_string();

        match self.probe(&url).await? {
            Probe::Opaque(res) => {
                tracing::info!("Relaying {} without range support", host);
                let content_type = header_string(&res, header::CONTENT_TYPE);
                let content_length = res.content_length();
                let body = res.bytes_stream().map_err(RelayError::from).boxed();
                Ok(RelayResponse {
                    status: StatusCode::OK,
                    content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    content_length,
                    total: content_length,
                    content_range: None,
                    accept_ranges: false,
                    body,
                })
            }
            Probe::Empty { content_type } => {
                if caller_range.is_some() {
                    return Err(RelayError::RangeNotSatisfiable { total: 0 });
                }
                Ok(RelayResponse {
                    status: StatusCode::OK,
                    content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    content_length: Some(0),
                    total: Some(0),
                    content_range: None,
                    accept_ranges: true,
                    body: futures::stream::empty().boxed(),
                })
            }
            Probe::Ranged {
                total: None,
                content_type,
            } => {
                tracing::info!("Relaying {} with unknown length", host);
                Ok(RelayResponse {
                    status: StatusCode::OK,
                    content_type: content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    content_length: None,
                    total: None,
                    content_range: None,
                    accept_ranges: false,
                    body: self.fetcher(url).into_stream(0, None),
                })
            }
            Probe::Ranged {
                total: Some(total),
                content_type,
            } => {
                let content_type =
                    content_type.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

                let Some(range) = caller_range else {
                    tracing::info!("Relaying {} ({} bytes)", host, total);
                    return Ok(RelayResponse {
                        status: StatusCode::OK,
                        content_type,
                        content_length: None,
                        total: Some(total),
                        content_range: None,
                        accept_ranges: true,
                        body: self.fetcher(url).into_stream(0, Some(total - 1)),
                    });
                };

                let (start, end) = range.resolve(total)?;
                tracing::info!(
                    "Relaying {} bytes {}-{} of {}",
                    host,
                    start,
                    end,
                    total
                );
                Ok(RelayResponse {
                    status: StatusCode::PARTIAL_CONTENT,
                    content_type,
                    content_length: None,
                    total: Some(total),
                    content_range: Some(ContentRange::header_value(start, end, total)),
                    accept_ranges: true,
                    body: self.fetcher(url).into_stream(start, Some(end)),
                })
            }
        }
    }

    /// Opens the video and audio legs of a dual resolution concurrently.
    /// Each leg keeps its own sequential chunking and retry budget.
    pub async fn open_pair(
        &self,
        video_url: &str,
        audio_url: &str,
    ) -> Result<(RelayResponse, RelayResponse), RelayError> {
        tokio::try_join!(self.open(video_url, None), self.open(audio_url, None))
    }

    fn fetcher(&self, url: Url) -> ChunkFetcher {
        ChunkFetcher::new(self.http.clone(), url, &self.config)
    }

    async fn probe(&self, url: &Url) -> Result<Probe, RelayError> {
        let timeout = self.config.probe_timeout();
        let label = format!("probe of {}", url.host_str().unwrap_or("?"));

        let res = retry_transient(RetryPolicy::from_config(&self.config), &label, || async {
            let send = self
                .http
                .get(url.clone())
                .header(header::RANGE, "bytes=0-0")
                .header(header::ACCEPT_ENCODING, "identity")
                .send();

            // Bounds the wait for headers only; an opaque body may stream on.
            let res = tokio::time::timeout(timeout, send)
                .await
                .map_err(|_| RelayError::Transient(format!("no response within {:?}", timeout)))??;

            match res.status() {
                StatusCode::OK | StatusCode::PARTIAL_CONTENT | StatusCode::RANGE_NOT_SATISFIABLE => {
                    Ok(res)
                }
                status => Err(status_error(status)),
            }
        })
        .await?;

        let content_type = header_string(&res, header::CONTENT_TYPE);
        Ok(match res.status() {
            StatusCode::PARTIAL_CONTENT => {
                let total = header_string(&res, header::CONTENT_RANGE)
                    .as_deref()
                    .and_then(ContentRange::parse)
                    .and_then(|cr| cr.total);
                if total == Some(0) {
                    Probe::Empty { content_type }
                } else {
                    Probe::Ranged {
                        total,
                        content_type,
                    }
                }
            }
            StatusCode::RANGE_NOT_SATISFIABLE => Probe::Empty { content_type },
            _ => Probe::Opaque(res),
        })
    }
}

fn header_string(res: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
