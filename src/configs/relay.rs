use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    /// Size of each ranged upstream fetch. Kept small because the CDN tends
    /// to drop long-lived single-range connections.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,
    /// Retries per chunk, on top of the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
    #[serde(default = "default_retry_max_ms")]
    pub retry_max_ms: u64,
    #[serde(default = "default_chunk_timeout_secs")]
    pub chunk_timeout_secs: u64,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    /// CDN domains that may be relayed. Subdomains match.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,
}

fn default_chunk_size() -> u64 {
    4 * 1024 * 1024
}

fn default_max_retries() -> u32 {
    5
}

fn default_retry_base_ms() -> u64 {
    250
}

fn default_retry_max_ms() -> u64 {
    4000
}

fn default_chunk_timeout_secs() -> u64 {
    20
}

fn default_probe_timeout_secs() -> u64 {
    10
}

fn default_allowed_hosts() -> Vec<String> {
    [
        "googlevideo.com",
        "youtube.com",
        "googleusercontent.com",
        "ytimg.com",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl RelayConfig {
    pub fn chunk_timeout(&self) -> Duration {
        Duration::from_secs(self.chunk_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            retry_max_ms: default_retry_max_ms(),
            chunk_timeout_secs: default_chunk_timeout_secs(),
            probe_timeout_secs: default_probe_timeout_secs(),
            allowed_hosts: default_allowed_hosts(),
        }
    }
}
