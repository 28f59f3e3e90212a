use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Value, json};

use super::{
    clients::{ClientProfile, common::build_context, common::with_identity, profile_by_name},
    extractor::{extract_entry, extract_header, scan_page},
};
use crate::{
    common::{
        errors::CrawlError,
        http::HttpClient,
        types::{AnyResult, ListingId, MediaId},
    },
    configs::YouTubeConfig,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistEntry {
    pub media_id: MediaId,
    pub title: String,
    pub duration_seconds: u64,
    pub author: Option<String>,
    /// 1-based discovery order within the crawl.
    pub position: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlResult {
    pub title: Option<String>,
    pub author: Option<String>,
    pub entries: Vec<PlaylistEntry>,
}

/// Where listing pages come from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn first_page(&self, listing_id: &ListingId) -> AnyResult<Value>;
    async fn next_page(&self, token: &str) -> AnyResult<Value>;
}

/// Browse endpoint client, speaking as the WEB profile.
pub struct InnerTubeBrowser {
    profile: &'static ClientProfile,
    http: reqwest::Client,
    api_base: String,
    visitor_data: Option<String>,
}

impl InnerTubeBrowser {
    pub fn new(
        http: reqwest::Client,
        api_base: impl Into<String>,
        visitor_data: Option<String>,
    ) -> AnyResult<Self> {
        let profile = profile_by_name("WEB").ok_or("WEB client profile is not registered")?;
        Ok(Self {
            profile,
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            visitor_data,
        })
    }

    pub fn from_config(config: &YouTubeConfig) -> AnyResult<Self> {
        let http = HttpClient::new(Duration::from_secs(config.timeout_secs))?;
        Self::new(http, config.api_base.clone(), config.visitor_data.clone())
    }

    async fn browse(&self, mut body: Value) -> AnyResult<Value> {
        if let Some(obj) = body.as_object_mut() {
            obj.insert(
                "context".to_string(),
                build_context(self.profile, self.visitor_data.as_deref()),
            );
        }

        let url = format!("{}/youtubei/v1/browse?prettyPrint=false", self.api_base);
        let req = with_identity(
            self.http.post(&url),
            self.profile,
            self.visitor_data.as_deref(),
        );

        let res = req.json(&body).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(format!("browse request returned {}", status).into());
        }
        Ok(res.json().await?)
    }
}

#[async_trait]
impl ListingSource for InnerTubeBrowser {
    async fn first_page(&self, listing_id: &ListingId) -> AnyResult<Value> {
        let browse_id = if listing_id.starts_with("VL") {
            listing_id.to_string()
        } else {
            format!("VL{}", listing_id)
        };
        self.browse(json!({ "browseId": browse_id })).await
    }

    async fn next_page(&self, token: &str) -> AnyResult<Value> {
        self.browse(json!({ "continuation": token })).await
    }
}

/// Per-crawl bookkeeping. Lives only for one `crawl` call.
#[derive(Default)]
struct CrawlState {
    seen_tokens: HashSet<String>,
    seen_ids: HashSet<String>,
    entries: Vec<PlaylistEntry>,
    pages: usize,
}

impl CrawlState {
    /// Adds the page's new entries and returns the first continuation token.
    fn absorb(&mut self, page: &Value) -> Option<String> {
        self.pages += 1;
        let scan = scan_page(page);
        let before = self.entries.len();

        for raw in scan.entries.iter().filter_map(|r| extract_entry(r)) {
            if !self.seen_ids.insert(raw.media_id.clone()) {
                continue;
            }
            self.entries.push(PlaylistEntry {
                position: self.entries.len() + 1,
                media_id: MediaId(raw.media_id),
                title: raw.title,
                duration_seconds: raw.duration_seconds,
                author: raw.author,
            });
        }

        if scan.entries.is_empty()
            && scan.tokens.is_empty()
            && page.as_object().is_some_and(|o| !o.is_empty())
        {
            tracing::warn!(
                "Page {} had content but no entries or continuation; the upstream layout may have changed",
                self.pages
            );
        }

        tracing::debug!(
            "Crawl page {}: {} records, {} new entries, {} tokens",
            self.pages,
            scan.entries.len(),
            self.entries.len() - before,
            scan.tokens.len()
        );

        scan.tokens.into_iter().next()
    }
}

pub struct PlaylistCrawler {
    source: Box<dyn ListingSource>,
}

impl PlaylistCrawler {
    pub fn new(source: Box<dyn ListingSource>) -> Self {
        Self { source }
    }

    pub fn from_config(config: &YouTubeConfig) -> AnyResult<Self> {
        Ok(Self::new(Box::new(InnerTubeBrowser::from_config(config)?)))
    }

    /// Walks the listing until it runs out of continuations, a token repeats,
    /// a continuation fetch fails or `max_pages` pages were read. Only a
    /// failure on the first page is an error.
    pub async fn crawl(
        &self,
        listing_id: &ListingId,
        max_pages: usize,
    ) -> Result<CrawlResult, CrawlError> {
        let max_pages = max_pages.max(1);

        let first = self
            .source
            .first_page(listing_id)
            .await
            .map_err(|e| CrawlError::FirstPage {
                listing_id: listing_id.to_string(),
                reason: e.to_string(),
            })?;

        let header = extract_header(&first);
        let mut state = CrawlState::default();
        let mut page = first;

        loop {
            let next = state.absorb(&page);

            if state.pages >= max_pages {
                tracing::debug!("Crawl of {} stopped at page limit {}", listing_id, max_pages);
                break;
            }

            let token = match next {
                Some(token) if !token.is_empty() => token,
                _ => break,
            };

            if !state.seen_tokens.insert(token.clone()) {
                tracing::warn!(
                    "Continuation token repeated while crawling {}; stopping",
                    listing_id
                );
                break;
            }

            page = match self.source.next_page(&token).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!(
                        "Continuation fetch failed for {} after {} pages: {}",
                        listing_id,
                        state.pages,
                        e
                    );
                    break;
                }
            };
        }

        tracing::info!(
            "Crawled {}: {} entries over {} pages",
            listing_id,
            state.entries.len(),
            state.pages
        );

        Ok(CrawlResult {
            title: header.title,
            author: header.author,
            entries: state.entries,
        })
    }
}
