//! Commercial image API adapter
//!
//! Two-leg protocol: the generation request returns a short-lived URL (or an
//! inline base64 payload), and a second fetch retrieves the actual bytes.
//! Each leg fails independently.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::OpenAiConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::{MediaProvider, MediaRequest, ProviderId};

/// Adapter for the commercial image generation API
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    size: String,
    quality: String,
}

#[derive(Serialize)]
struct ImagesRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
    response_format: &'a str,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Deserialize)]
struct ImageData {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    b64_json: Option<String>,
}

impl OpenAiProvider {
    pub fn new(config: &OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            size: config.size.clone(),
            quality: config.quality.clone(),
        })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(provider = "openai", status = %status, "Image download failed");
            return Err(AppError::Upstream(format!(
                "failed to download generated image: {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::EmptyResponse("openai download".to_string()));
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl MediaProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Openai
    }

    async fn generate(&self, request: &MediaRequest) -> Result<Vec<u8>> {
        let url = format!("{}/v1/images/generations", self.base_url);
        debug!(provider = "openai", model = %self.model, "Sending generation request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&ImagesRequest {
                model: &self.model,
                prompt: &request.prompt,
                n: 1,
                size: &self.size,
                quality: &self.quality,
                response_format: "url",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = "openai", status = %status, "Generation request failed");
            return Err(AppError::Upstream(format!(
                "openai returned {}: {}",
                status, body
            )));
        }

        let parsed: ImagesResponse = response.json().await?;
        let first = parsed
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AppError::EmptyResponse("openai".to_string()))?;

        if let Some(b64) = first.b64_json {
            return STANDARD
                .decode(b64.trim())
                .map_err(|e| AppError::Decode(format!("invalid base64 image data: {}", e)));
        }

        match first.url {
            Some(image_url) => self.download(&image_url).await,
            None => Err(AppError::EmptyResponse(
                "openai returned neither url nor b64_json".to_string(),
            )),
        }
    }
}
