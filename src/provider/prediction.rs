//! Prediction-job adapter (upscaling, video generation)
//!
//! Jobs at the prediction service are asynchronous: create, poll until a
//! terminal state, then fetch the output URL. The poll runs on a configured
//! interval and is bounded by a configured deadline, so a hung upstream job
//! surfaces as a timeout instead of blocking the request forever.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::PredictionConfig;
use crate::error::{AppError, Result};
use crate::provider::traits::{MediaProvider, MediaRequest, ProviderId};

/// What the prediction input should ask the model to do
#[derive(Debug, Clone, Copy)]
pub enum PredictionKind {
    Upscale,
    Video,
}

/// Adapter for one model version at the prediction service
pub struct PredictionProvider {
    id: ProviderId,
    kind: PredictionKind,
    client: Client,
    base_url: String,
    api_token: String,
    version: String,
    poll_interval: Duration,
    poll_deadline: Duration,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
}

impl PredictionStatus {
    fn is_terminal(self) -> bool {
        matches!(
            self,
            PredictionStatus::Succeeded | PredictionStatus::Failed | PredictionStatus::Canceled
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
        }
    }
}

impl PredictionProvider {
    pub fn new(id: ProviderId, kind: PredictionKind, config: &PredictionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let version = match kind {
            PredictionKind::Upscale => config.upscale_version.clone(),
            PredictionKind::Video => config.video_version.clone(),
        };

        Ok(Self {
            id,
            kind,
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
            version,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            poll_deadline: Duration::from_millis(config.poll_deadline_ms),
        })
    }

    fn build_input(&self, source_image: &str) -> Value {
        match self.kind {
            PredictionKind::Upscale => json!({
                "image": source_image,
                "scale_factor": 2,
                "creativity": 0.35,
                "resemblance": 0.6,
                "preserve_aspect_ratio": true,
            }),
            PredictionKind::Video => json!({
                "input_image": source_image,
                "sizing_strategy": "maintain_aspect_ratio",
                "motion_bucket_id": 127,
                "frames_per_second": 6,
            }),
        }
    }

    async fn create(&self, input: Value) -> Result<Prediction> {
        let url = format!("{}/v1/predictions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .json(&json!({ "version": self.version, "input": input }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(provider = %self.id, status = %status, "Prediction create failed");
            return Err(AppError::Upstream(format!(
                "{} prediction create returned {}: {}",
                self.id, status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch(&self, prediction_id: &str) -> Result<Prediction> {
        let url = format!("{}/v1/predictions/{}", self.base_url, prediction_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Token {}", self.api_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "{} prediction poll returned {}",
                self.id, status
            )));
        }

        Ok(response.json().await?)
    }

    /// Poll the job until it reaches a terminal state or the deadline passes
    async fn wait_for_terminal(&self, mut prediction: Prediction) -> Result<Prediction> {
        let deadline = Instant::now() + self.poll_deadline;

        while !prediction.status.is_terminal() {
            if Instant::now() >= deadline {
                return Err(AppError::Timeout(format!(
                    "prediction {} did not complete in time",
                    prediction.id
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
            prediction = self.fetch(&prediction.id).await?;
            debug!(
                provider = %self.id,
                prediction = %prediction.id,
                status = prediction.status.as_str(),
                "Polled prediction"
            );
        }

        Ok(prediction)
    }
}

/// Extract the result URL from a terminal prediction's output field.
/// Providers return either a single URL string or an array of URLs, in which
/// case the last element is the final artifact.
fn output_url(output: Option<Value>) -> Result<String> {
    match output {
        Some(Value::String(url)) => Ok(url),
        Some(Value::Array(items)) => items
            .into_iter()
            .rev()
            .find_map(|v| match v {
                Value::String(url) => Some(url),
                _ => None,
            })
            .ok_or_else(|| AppError::EmptyResponse("prediction output array".to_string())),
        _ => Err(AppError::EmptyResponse("prediction output".to_string())),
    }
}

#[async_trait]
impl MediaProvider for PredictionProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn generate(&self, request: &MediaRequest) -> Result<Vec<u8>> {
        let source = request.source_image.as_deref().ok_or_else(|| {
            AppError::InvalidRequest("a source image is required".to_string())
        })?;

        let created = self.create(self.build_input(source)).await?;
        debug!(provider = %self.id, prediction = %created.id, "Created prediction");

        let finished = self.wait_for_terminal(created).await?;

        if finished.status != PredictionStatus::Succeeded {
            let detail = finished
                .error
                .unwrap_or_else(|| finished.status.as_str().to_string());
            warn!(provider = %self.id, prediction = %finished.id, "Prediction did not succeed");
            return Err(AppError::Upstream(format!(
                "{} prediction {}: {}",
                self.id, finished.id, detail
            )));
        }

        let url = output_url(finished.output)?;
        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Upstream(format!(
                "failed to download prediction output: {}",
                status
            )));
        }

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::EmptyResponse(self.id.to_string()));
        }
        Ok(bytes.to_vec())
    }
}
