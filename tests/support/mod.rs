#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tuberelay::configs::RelayConfig;

/// Misbehaviour injected into requests starting at `Upstream::fault_at`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    None,
    /// Send half the chunk, then drop the connection.
    Reset,
    /// Wait this long before answering.
    Stall(Duration),
}

/// Byte source served by the fake CDN.
pub struct Upstream {
    pub data: Vec<u8>,
    /// Longest range the server will answer in one response.
    pub cap: u64,
    /// Requests starting at or past this offset get 416.
    pub eof_at: Option<u64>,
    /// Answer every request with a plain 200 and the full body.
    pub ignore_range: bool,
    /// Number of upcoming requests answered with 500.
    pub fail_next: AtomicU32,
    /// Total reported in `Content-Range` instead of the real length.
    pub claimed_total: Option<u64>,
    pub fault: Fault,
    pub fault_at: u64,
    /// How many matching requests still get `fault`.
    pub faults_left: AtomicU32,
    pub requests: AtomicU32,
}

impl Upstream {
    pub fn new(len: usize) -> Self {
        Self {
            data: pattern(len),
            cap: u64::MAX,
            eof_at: None,
            ignore_range: false,
            fail_next: AtomicU32::new(0),
            claimed_total: None,
            fault: Fault::None,
            fault_at: 0,
            faults_left: AtomicU32::new(0),
            requests: AtomicU32::new(0),
        }
    }

    pub fn requests(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn parse_range(headers: &HeaderMap) -> Option<(u64, Option<u64>)> {
    let value = headers.get(header::RANGE)?.to_str().ok()?;
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.parse().ok()?, end.parse().ok()))
}

async fn serve_bytes(State(upstream): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    upstream.requests.fetch_add(1, Ordering::SeqCst);

    if upstream
        .fail_next
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
    {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let total = upstream.data.len() as u64;
    let mut response_headers = HeaderMap::new();
    response_headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("video/mp4"));

    let range = parse_range(&headers);
    if upstream.ignore_range || range.is_none() {
        return (StatusCode::OK, response_headers, upstream.data.clone()).into_response();
    }
    let Some((start, end)) = range else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    if start >= total || upstream.eof_at.is_some_and(|eof| start >= eof) {
        response_headers.insert(
            header::CONTENT_RANGE,
            HeaderValue::from_str(&format!("bytes */{total}")).unwrap(),
        );
        return (StatusCode::RANGE_NOT_SATISFIABLE, response_headers).into_response();
    }

    let end = end
        .unwrap_or(total - 1)
        .min(total - 1)
        .min(start.saturating_add(upstream.cap - 1));
    let reported = upstream.claimed_total.unwrap_or(total);
    response_headers.insert(
        header::CONTENT_RANGE,
        HeaderValue::from_str(&format!("bytes {start}-{end}/{reported}")).unwrap(),
    );
    let body = upstream.data[start as usize..=end as usize].to_vec();

    let faulty = upstream.fault != Fault::None
        && start == upstream.fault_at
        && upstream
            .faults_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
    if faulty {
        match upstream.fault {
            Fault::Reset => {
                response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
                let half = body[..body.len() / 2].to_vec();
                let parts: Vec<Result<Vec<u8>, std::io::Error>> = vec![
                    Ok(half),
                    Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        "connection reset",
                    )),
                ];
                let body = Body::from_stream(futures::stream::iter(parts));
                return (StatusCode::PARTIAL_CONTENT, response_headers, body).into_response();
            }
            Fault::Stall(delay) => tokio::time::sleep(delay).await,
            Fault::None => {}
        }
    }

    (StatusCode::PARTIAL_CONTENT, response_headers, body).into_response()
}

/// Serves each upstream under `/{name}` on an ephemeral local port.
pub async fn spawn_upstreams(upstreams: Vec<(&str, Arc<Upstream>)>) -> SocketAddr {
    let mut app = Router::new();
    for (name, upstream) in upstreams {
        app = app.route(
            &format!("/{name}"),
            get(serve_bytes).with_state(upstream),
        );
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub async fn spawn_upstream(upstream: Arc<Upstream>) -> String {
    let addr = spawn_upstreams(vec![("media", upstream)]).await;
    format!("http://{addr}/media")
}

pub fn relay_config(chunk_size: u64) -> RelayConfig {
    RelayConfig {
        chunk_size,
        max_retries: 3,
        retry_base_ms: 1,
        retry_max_ms: 5,
        chunk_timeout_secs: 5,
        probe_timeout_secs: 5,
        allowed_hosts: vec!["127.0.0.1".to_string()],
    }
}
