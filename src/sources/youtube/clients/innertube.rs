use async_trait::async_trait;
use serde_json::{Value, json};

use super::{
    ClientProfile, Negotiation, PlayerProvider,
    common::{build_context, extract_player_data, with_identity},
};
use crate::common::types::{AnyResult, MediaId};

/// Player endpoint client speaking as one `ClientProfile`.
pub struct InnerTubeClient {
    profile: &'static ClientProfile,
    http: reqwest::Client,
    api_base: String,
    visitor_data: Option<String>,
}

impl InnerTubeClient {
    pub fn new(
        profile: &'static ClientProfile,
        http: reqwest::Client,
        api_base: impl Into<String>,
        visitor_data: Option<String>,
    ) -> Self {
        Self {
            profile,
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            visitor_data,
        }
    }

    pub fn profile(&self) -> &'static ClientProfile {
        self.profile
    }

    async fn player_request(&self, media_id: &MediaId) -> AnyResult<Value> {
        let body = json!({
            "context": build_context(self.profile, self.visitor_data.as_deref()),
            "videoId": media_id.0.as_str(),
            "contentCheckOk": true,
            "racyCheckOk": true
        });

        let url = format!("{}/youtubei/v1/player?prettyPrint=false", self.api_base);

        let req = with_identity(
            self.http.post(&url),
            self.profile,
            self.visitor_data.as_deref(),
        );

        tracing::debug!(
            "{} player request for {}: {}",
            self.profile.name,
            media_id,
            url
        );

        let res = req.json(&body).send().await?;
        let status = res.status();
        let body_text = res.text().await?;

        tracing::trace!("{} player response body: {}", self.profile.name, body_text);

        if !status.is_success() {
            return Err(format!("player request returned {}", status).into());
        }

        Ok(serde_json::from_str(&body_text)?)
    }
}

#[async_trait]
impl PlayerProvider for InnerTubeClient {
    fn name(&self) -> &str {
        self.profile.name
    }

    async fn negotiate(&self, media_id: &MediaId) -> Negotiation {
        let body = match self.player_request(media_id).await {
            Ok(body) => body,
            Err(e) => return Negotiation::Reject(e.to_string()),
        };

        match extract_player_data(&body) {
            Ok(data) => Negotiation::Success(data),
            Err(reason) => Negotiation::Reject(reason),
        }
    }
}
