use std::time::Duration;

use super::{
    clients::{InnerTubeClient, Negotiation, PlayerProvider, profiles_from_names},
    formats::{QualityCeiling, StreamKind, StreamResolution, select_stream},
};
use crate::{
    common::{
        errors::ResolveError,
        http::HttpClient,
        types::{AnyResult, MediaId},
    },
    configs::YouTubeConfig,
};

#[derive(Debug, Clone)]
pub struct ResolvedStream {
    pub resolution: StreamResolution,
    pub duration_seconds: u64,
    /// Name of the identity that was served.
    pub client: String,
}

/// Tries each provider once, in order, until one is served.
pub struct StreamResolver {
    providers: Vec<Box<dyn PlayerProvider>>,
}

impl StreamResolver {
    pub fn new(providers: Vec<Box<dyn PlayerProvider>>) -> Self {
        Self { providers }
    }

    pub fn from_config(config: &YouTubeConfig) -> AnyResult<Self> {
        let http = HttpClient::new(Duration::from_secs(config.timeout_secs))?;

        let providers = profiles_from_names(&config.clients)
            .into_iter()
            .map(|profile| {
                Box::new(InnerTubeClient::new(
                    profile,
                    http.clone(),
                    config.api_base.clone(),
                    config.visitor_data.clone(),
                )) as Box<dyn PlayerProvider>
            })
            .collect();

        Ok(Self::new(providers))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve(
        &self,
        media_id: &MediaId,
        kind: StreamKind,
        ceiling: QualityCeiling,
    ) -> Result<ResolvedStream, ResolveError> {
        let mut last_reason = String::from("no client profiles configured");

        for provider in &self.providers {
            tracing::debug!("Resolving {} with client {}", media_id, provider.name());

            let data = match provider.negotiate(media_id).await {
                Negotiation::Success(data) => data,
                Negotiation::Reject(reason) => {
                    tracing::warn!(
                        "Client {} rejected for {}: {}",
                        provider.name(),
                        media_id,
                        reason
                    );
                    last_reason = format!("{}: {}", provider.name(), reason);
                    continue;
                }
            };

            tracing::debug!(
                "Client {} served {} descriptors for {}",
                provider.name(),
                data.descriptors.len(),
                media_id
            );

            let resolution = select_stream(&data.descriptors, kind, ceiling).ok_or_else(|| {
                ResolveError::NoStreamAvailable {
                    media_id: media_id.to_string(),
                    kind: kind.as_str().to_string(),
                }
            })?;

            return Ok(ResolvedStream {
                resolution,
                duration_seconds: data.duration_seconds,
                client: provider.name().to_string(),
            });
        }

        Err(ResolveError::ClientProfileExhausted {
            media_id: media_id.to_string(),
            last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::*;
    use crate::sources::youtube::{clients::PlayerData, formats::FormatDescriptor};

    struct FakeProvider {
        name: &'static str,
        outcome: Option<Vec<FormatDescriptor>>,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl PlayerProvider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        async fn negotiate(&self, _media_id: &MediaId) -> Negotiation {
            self.calls.lock().unwrap().push(self.name);
            match &self.outcome {
                Some(descriptors) => Negotiation::Success(PlayerData {
                    descriptors: descriptors.clone(),
                    duration_seconds: 212,
                    ..Default::default()
                }),
                None => Negotiation::Reject(format!("{} says no", self.name)),
            }
        }
    }

    fn m4a(bitrate: u64) -> FormatDescriptor {
        FormatDescriptor {
            itag: Some(140),
            mime_type: "audio/mp4; codecs=\"mp4a.40.2\"".to_string(),
            container: "mp4".to_string(),
            codec_tag: "mp4a.40.2".to_string(),
            is_video: false,
            is_audio: true,
            height: None,
            bitrate: Some(bitrate),
            content_length: None,
            url: format!("https://rr1.googlevideo.com/videoplayback?br={bitrate}"),
        }
    }

    fn resolver(
        outcomes: Vec<(&'static str, Option<Vec<FormatDescriptor>>)>,
    ) -> (StreamResolver, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let providers = outcomes
            .into_iter()
            .map(|(name, outcome)| {
                Box::new(FakeProvider {
                    name,
                    outcome,
                    calls: calls.clone(),
                }) as Box<dyn PlayerProvider>
            })
            .collect();
        (StreamResolver::new(providers), calls)
    }

    #[tokio::test]
    async fn falls_through_rejections_and_stops_at_first_success() {
        let (resolver, calls) = resolver(vec![
            ("one", None),
            ("two", None),
            ("three", Some(vec![m4a(128_000)])),
            ("four", Some(vec![m4a(256_000)])),
        ]);

        let resolved = resolver
            .resolve(
                &MediaId("abc123".into()),
                StreamKind::Audio,
                QualityCeiling::HIGHEST,
            )
            .await
            .unwrap();

        assert_eq!(resolved.client, "three");
        assert_eq!(resolved.duration_seconds, 212);
        assert_eq!(
            resolved.resolution,
            StreamResolution::Single(m4a(128_000))
        );
        assert_eq!(*calls.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_last_reason() {
        let (resolver, calls) = resolver(vec![("one", None), ("two", None)]);

        let err = resolver
            .resolve(
                &MediaId("abc123".into()),
                StreamKind::Video,
                QualityCeiling::HIGHEST,
            )
            .await
            .unwrap_err();

        match err {
            ResolveError::ClientProfileExhausted {
                media_id,
                last_reason,
            } => {
                assert_eq!(media_id, "abc123");
                assert_eq!(last_reason, "two: two says no");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn accepted_profile_without_matching_kind_is_no_stream() {
        let (resolver, calls) = resolver(vec![
            ("one", Some(vec![m4a(128_000)])),
            ("two", Some(vec![m4a(256_000)])),
        ]);

        let err = resolver
            .resolve(
                &MediaId("abc123".into()),
                StreamKind::Video,
                QualityCeiling::HIGHEST,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ResolveError::NoStreamAvailable { .. }));
        assert_eq!(*calls.lock().unwrap(), vec!["one"]);
    }

    #[tokio::test]
    async fn empty_provider_list_is_exhausted() {
        let resolver = StreamResolver::new(Vec::new());
        let err = resolver
            .resolve(
                &MediaId("abc123".into()),
                StreamKind::Audio,
                QualityCeiling::HIGHEST,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ResolveError::ClientProfileExhausted { .. }));
    }

    #[test]
    fn config_builds_providers_in_order() {
        let config = YouTubeConfig {
            clients: vec!["IOS".to_string(), "WEB".to_string()],
            ..Default::default()
        };
        let resolver = StreamResolver::from_config(&config).unwrap();
        assert_eq!(resolver.provider_names(), vec!["IOS", "WEB"]);
    }
}
