use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::gateway::{GatewayError, GatewayResult};

/// Video platform seam: hands over a reachable source file, gets a playback url back.
#[async_trait]
pub trait VideoHost: std::fmt::Debug + Send + Sync {
    async fn upload(&self, source_url: &str) -> GatewayResult<String>;
}

#[derive(Debug, Clone)]
pub struct MuxVideoHost {
    client: reqwest::Client,
    api_base: String,
    token_id: String,
    token_secret: String,
}

#[derive(Debug, Deserialize)]
struct MuxEnvelope {
    data: MuxAsset,
}

#[derive(Debug, Deserialize)]
struct MuxAsset {
    id: String,
    #[serde(default)]
    playback_ids: Vec<MuxPlaybackId>,
}

#[derive(Debug, Deserialize)]
struct MuxPlaybackId {
    id: String,
}

impl MuxAsset {
    fn playback_url(&self) -> GatewayResult<String> {
        let playback = self.playback_ids.first().ok_or_else(|| {
            GatewayError::MalformedResponse(format!("asset {} has no playback id", self.id))
        })?;
        Ok(format!("https://stream.mux.com/{}.m3u8", playback.id))
    }
}

impl MuxVideoHost {
    pub fn new(client: reqwest::Client, api_base: &str, token_id: &str, token_secret: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_id: token_id.to_string(),
            token_secret: token_secret.to_string(),
        }
    }
}

#[async_trait]
impl VideoHost for MuxVideoHost {
    #[tracing::instrument(skip(self))]
    async fn upload(&self, source_url: &str) -> GatewayResult<String> {
        let response = self
            .client
            .post(format!("{}/video/v1/assets", self.api_base))
            .basic_auth(&self.token_id, Some(&self.token_secret))
            .json(&json!({
                "input": [{ "url": source_url }],
                "playback_policy": ["public"],
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::from_response(response).await);
        }

        let envelope: MuxEnvelope = response.json().await?;
        let url = envelope.data.playback_url()?;

        tracing::debug!(asset_id = %envelope.data.id, "video asset created");
        Ok(url)
    }
}
