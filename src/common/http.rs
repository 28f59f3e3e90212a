use std::time::Duration;

use reqwest::{Client, Error};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
    pub fn default_user_agent() -> String {
        DEFAULT_USER_AGENT.to_string()
    }

    /// Client for JSON API calls. Identity headers are set per request, so
    /// one client is shared by every profile.
    pub fn new(timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(Self::default_user_agent())
            .timeout(timeout)
            .build()
    }

    /// Client for CDN byte fetches. No global timeout: long media is streamed
    /// for as long as it takes, and each chunk carries its own deadline.
    pub fn new_streaming(connect_timeout: Duration) -> Result<Client, Error> {
        Client::builder()
            .user_agent(Self::default_user_agent())
            .connect_timeout(connect_timeout)
            .no_gzip()
            .no_deflate()
            .build()
    }
}
