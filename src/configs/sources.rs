use serde::{Deserialize, Serialize};

/// InnerTube API base endpoint (googleapis is more stable and avoids
/// some geo-restrictions that www.youtube.com may impose).
pub const INNERTUBE_API: &str = "https://youtubei.googleapis.com";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YouTubeConfig {
    /// Client profile names in the order they are tried. Empty means the
    /// registry's own priority order.
    #[serde(default)]
    pub clients: Vec<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub visitor_data: Option<String>,
}

fn default_api_base() -> String {
    INNERTUBE_API.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for YouTubeConfig {
    fn default() -> Self {
        Self {
            clients: Vec::new(),
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            visitor_data: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CrawlerConfig {
    /// Hard upper bound on pages fetched per crawl, first page included.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_max_pages() -> usize {
    100
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
        }
    }
}
