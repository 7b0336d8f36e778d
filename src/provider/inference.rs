//! Hosted inference endpoint adapter (flux, stability, boreal, phantasma-anime)
//!
//! All four providers share the same protocol: a single-field JSON payload
//! posted to a per-model URL with a bearer token, raw image bytes back.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::InferenceConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::{MediaProvider, MediaRequest, ProviderId};

/// Adapter for a single model hosted on the inference endpoint
pub struct InferenceProvider {
    id: ProviderId,
    client: Client,
    url: String,
    api_token: String,
}

#[derive(Serialize)]
struct InferencePayload<'a> {
    inputs: &'a str,
}

impl InferenceProvider {
    /// Create an adapter bound to one model path
    pub fn new(id: ProviderId, config: &InferenceConfig, model: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            id,
            client,
            url: format!("{}/{}", config.base_url.trim_end_matches('/'), model),
            api_token: config.api_token.clone(),
        })
    }
}

#[async_trait]
impl MediaProvider for InferenceProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate(&self, request: &MediaRequest) -> Result<Vec<u8>> {
        debug!(provider = %self.id, url = %self.url, "Sending inference request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .json(&InferencePayload {
                inputs: &request.prompt,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = %self.id, status = %status, "Inference endpoint returned an error");
            return Err(AppError::Upstream(format!(
                "{} returned {}: {}",
                self.id, status, body
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::EmptyResponse(self.id.to_string()));
        }

        debug!(provider = %self.id, size = bytes.len(), "Received image bytes");
        Ok(bytes.to_vec())
    }
}
