use crate::{
    common::types::AnyResult,
    configs::Config,
    relay::RangeRelay,
    sources::youtube::{PlaylistCrawler, StreamResolver},
};

/// Top-level application state, built once at startup and shared by every
/// request behind an `Arc`. Nothing in here is mutated after construction.
pub struct AppState {
    pub config: Config,
    pub resolver: StreamResolver,
    pub crawler: PlaylistCrawler,
    pub relay: RangeRelay,
}

impl AppState {
    pub fn new(config: Config) -> AnyResult<Self> {
        let resolver = StreamResolver::from_config(&config.youtube)?;
        let crawler = PlaylistCrawler::from_config(&config.youtube)?;
        let relay = RangeRelay::new(config.relay.clone())?;

        tracing::debug!(
            "Client profile order: {}",
            resolver.provider_names().join(", ")
        );

        Ok(Self {
            config,
            resolver,
            crawler,
            relay,
        })
    }
}
