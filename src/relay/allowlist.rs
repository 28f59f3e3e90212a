use reqwest::Url;

use crate::common::errors::RelayError;

/// CDN hosts the relay may fetch from. Anything else is refused before any
/// network call is made.
#[derive(Debug, Clone)]
pub struct HostAllowList {
    hosts: Vec<String>,
}

impl HostAllowList {
    pub fn new(hosts: &[String]) -> Self {
        let hosts = hosts
            .iter()
            .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();
        Self { hosts }
    }

    /// Exact match or any subdomain of an allowed entry.
    pub fn allows(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.hosts.iter().any(|allowed| {
            host == *allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Parses `raw` and checks scheme and host.
    pub fn check(&self, raw: &str) -> Result<Url, RelayError> {
        let url = Url::parse(raw.trim()).map_err(|e| RelayError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(RelayError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| RelayError::InvalidUrl("url has no host".to_string()))?;

        if !self.allows(host) {
            tracing::warn!("Refusing to relay from host {}", host);
            return Err(RelayError::DisallowedHost(host.to_string()));
        }

        Ok(url)
    }
}
