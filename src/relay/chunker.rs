use std::time::Duration;

use bytes::Bytes;
use futures::{StreamExt, stream::BoxStream};
use reqwest::{StatusCode, Url, header};

use super::{
    backoff::{RetryPolicy, retry_transient},
    range::ContentRange,
};
use crate::{common::errors::RelayError, configs::RelayConfig};

pub type ByteStream = BoxStream<'static, Result<Bytes, RelayError>>;

/// Maps an unexpected upstream status onto the relay error taxonomy.
/// Server errors and throttling are worth retrying, the rest are not.
pub fn status_error(status: StatusCode) -> RelayError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        RelayError::Transient(format!("upstream responded with {}", status))
    } else {
        RelayError::UpstreamStatus(status.as_u16())
    }
}

enum Chunk {
    Data { bytes: Bytes, total: Option<u64> },
    /// Upstream answered 416: nothing more to read.
    End,
}

/// Fetches one upstream resource as a sequence of bounded ranged GETs.
pub struct ChunkFetcher {
    http: reqwest::Client,
    url: Url,
    chunk_size: u64,
    chunk_timeout: Duration,
    retry: RetryPolicy,
}

impl ChunkFetcher {
    pub fn new(http: reqwest::Client, url: Url, config: &RelayConfig) -> Self {
        Self {
            http,
            url,
            chunk_size: config.chunk_size.max(1),
            chunk_timeout: config.chunk_timeout(),
            retry: RetryPolicy::from_config(config),
        }
    }

    async fn fetch_once(&self, start: u64, end: u64) -> Result<Chunk, RelayError> {
        let res = self
            .http
            .get(self.url.clone())
            .header(header::RANGE, format!("bytes={}-{}", start, end))
            .header(header::ACCEPT_ENCODING, "identity")
            .timeout(self.chunk_timeout)
            .send()
            .await?;

        match res.status() {
            StatusCode::PARTIAL_CONTENT => {}
            StatusCode::RANGE_NOT_SATISFIABLE => return Ok(Chunk::End),
            StatusCode::OK => {
                return Err(RelayError::UnexpectedUpstreamRange {
                    expected: start,
                    actual: "full response (200) to a ranged request".to_string(),
                });
            }
            status => return Err(status_error(status)),
        }

        let content_range = res
            .headers()
            .get(header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let parsed = content_range.as_deref().and_then(ContentRange::parse);

        if let Some(cr) = parsed {
            if cr.start() != Some(start) {
                return Err(RelayError::UnexpectedUpstreamRange {
                    expected: start,
                    actual: content_range.unwrap_or_default(),
                });
            }
        }

        // A reset mid-body surfaces here and the whole chunk is retried.
        let bytes = res.bytes().await?;
        Ok(Chunk::Data {
            bytes,
            total: parsed.and_then(|cr| cr.total),
        })
    }

    async fn fetch(&self, start: u64, end: u64) -> Result<Chunk, RelayError> {
        let label = format!("chunk {}-{} of {}", start, end, self.host());
        retry_transient(self.retry.clone(), &label, || self.fetch_once(start, end)).await
    }

    fn host(&self) -> &str {
        self.url.host_str().unwrap_or("?")
    }

    /// Streams `[start, end]` (inclusive, open-ended when `end` is `None`).
    /// Chunks are fetched one after another; dropping the stream drops the
    /// in-flight request and any pending retry delay.
    pub fn into_stream(self, start: u64, end: Option<u64>) -> ByteStream {
        let cursor = Cursor {
            fetcher: self,
            pos: start,
            end,
            done: false,
            sent: 0,
        };

        futures::stream::try_unfold(cursor, |mut cursor| async move {
            if cursor.done || cursor.end.is_some_and(|end| cursor.pos > end) {
                cursor.finish();
                return Ok(None);
            }

            let want_end = cursor
                .pos
                .saturating_add(cursor.fetcher.chunk_size - 1)
                .min(cursor.end.unwrap_or(u64::MAX));

            let (mut bytes, total) = match cursor.fetcher.fetch(cursor.pos, want_end).await? {
                Chunk::Data { bytes, total } => (bytes, total),
                Chunk::End => {
                    tracing::debug!(
                        "{} answered 416 at offset {}, ending stream",
                        cursor.fetcher.host(),
                        cursor.pos
                    );
                    cursor.finish();
                    return Ok(None);
                }
            };

            if bytes.is_empty() {
                cursor.finish();
                return Ok(None);
            }

            let requested = want_end - cursor.pos + 1;
            if bytes.len() as u64 > requested {
                bytes.truncate(requested as usize);
            }
            let received = bytes.len() as u64;
            cursor.pos += received;
            cursor.sent += received;

            // Short chunk: natural EOF, unless upstream just capped the range
            // length and reports more bytes beyond this point.
            let more_upstream = total.is_some_and(|t| t > cursor.pos);
            if received < requested && !more_upstream {
                cursor.done = true;
            }
            if total.is_some_and(|t| cursor.pos >= t) {
                cursor.done = true;
            }

            tracing::trace!(
                "{} chunk done: {} bytes, next offset {}",
                cursor.fetcher.host(),
                received,
                cursor.pos
            );

            Ok::<_, RelayError>(Some((bytes, cursor)))
        })
        .boxed()
    }
}

struct Cursor {
    fetcher: ChunkFetcher,
    pos: u64,
    end: Option<u64>,
    done: bool,
    sent: u64,
}

impl Cursor {
    fn finish(&mut self) {
        tracing::info!(
            "Relay from {} finished: {} bytes sent",
            self.fetcher.host(),
            self.sent
        );
    }
}
