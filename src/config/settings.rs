//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthServiceConfig,
    #[serde(default)]
    pub inference: InferenceConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub predictions: PredictionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// External authentication service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthServiceConfig {
    /// Base URL of the authentication microservice
    #[serde(default = "default_auth_api_url")]
    pub api_url: String,
    /// Where `/register` sends the browser
    #[serde(default = "default_register_url")]
    pub register_url: String,
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            api_url: default_auth_api_url(),
            register_url: default_register_url(),
        }
    }
}

fn default_auth_api_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_register_url() -> String {
    "https://example.com/register".to_string()
}

/// Hosted inference endpoint configuration (flux, stability, boreal,
/// phantasma-anime)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_flux_model")]
    pub flux_model: String,
    #[serde(default = "default_stability_model")]
    pub stability_model: String,
    #[serde(default = "default_boreal_model")]
    pub boreal_model: String,
    #[serde(default = "default_phantasma_anime_model")]
    pub phantasma_anime_model: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            base_url: default_inference_base_url(),
            api_token: String::new(),
            flux_model: default_flux_model(),
            stability_model: default_stability_model(),
            boreal_model: default_boreal_model(),
            phantasma_anime_model: default_phantasma_anime_model(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_inference_base_url() -> String {
    "https://api-inference.huggingface.co/models".to_string()
}

fn default_flux_model() -> String {
    "black-forest-labs/FLUX.1-dev".to_string()
}

fn default_stability_model() -> String {
    "stabilityai/stable-diffusion-xl-base-1.0".to_string()
}

fn default_boreal_model() -> String {
    "kudzueye/boreal".to_string()
}

fn default_phantasma_anime_model() -> String {
    "alvdansen/phantasma-anime".to_string()
}

fn default_timeout() -> u64 {
    60000
}

/// Commercial image generation API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_size")]
    pub size: String,
    #[serde(default = "default_openai_quality")]
    pub quality: String,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: String::new(),
            model: default_openai_model(),
            size: default_openai_size(),
            quality: default_openai_quality(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_openai_model() -> String {
    "dall-e-3".to_string()
}

fn default_openai_size() -> String {
    "1024x1024".to_string()
}

fn default_openai_quality() -> String {
    "standard".to_string()
}

/// Prediction-job service configuration (upscaling and video generation)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionConfig {
    #[serde(default = "default_predictions_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_upscale_version")]
    pub upscale_version: String,
    #[serde(default = "default_video_version")]
    pub video_version: String,
    /// Interval between poll requests while a job is pending
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Deadline for a job to reach a terminal state
    #[serde(default = "default_poll_deadline")]
    pub poll_deadline_ms: u64,
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            base_url: default_predictions_base_url(),
            api_token: String::new(),
            upscale_version: default_upscale_version(),
            video_version: default_video_version(),
            poll_interval_ms: default_poll_interval(),
            poll_deadline_ms: default_poll_deadline(),
            timeout_ms: default_timeout(),
        }
    }
}

fn default_predictions_base_url() -> String {
    "https://api.replicate.com".to_string()
}

fn default_upscale_version() -> String {
    "philz1337x/clarity-upscaler".to_string()
}

fn default_video_version() -> String {
    "stability-ai/stable-video-diffusion".to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_poll_deadline() -> u64 {
    300_000
}

/// Storage configuration for generated assets
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub base_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "./static/generated".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from configuration files and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/default.toml")
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            // Load from configuration file
            .add_source(
                File::with_name(path.as_ref().to_str().unwrap_or("config/default"))
                    .required(false),
            )
            // Override with environment variables (prefixed with MEDIA_GATEWAY_)
            .add_source(
                Environment::with_prefix("MEDIA_GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            // Well-known deployment variables take precedence
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option(
                "inference.api_token",
                std::env::var("HUGGINGFACEHUB_API_TOKEN").ok(),
            )?
            .set_override_option("openai.api_key", std::env::var("OPENAI_API_KEY").ok())?
            .set_override_option(
                "predictions.api_token",
                std::env::var("REPLICATE_API_TOKEN").ok(),
            )?
            .set_override_option("auth.api_url", std::env::var("API_URL").ok())?
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Server port cannot be 0".to_string(),
            )));
        }

        if self.storage.base_path.is_empty() {
            return Err(AppError::Config(config::ConfigError::Message(
                "Storage base path cannot be empty".to_string(),
            )));
        }

        if self.predictions.poll_interval_ms == 0 {
            return Err(AppError::Config(config::ConfigError::Message(
                "Prediction poll interval cannot be 0".to_string(),
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.openai.model, "dall-e-3");
        assert_eq!(settings.openai.size, "1024x1024");
        assert!(settings.inference.base_url.contains("api-inference"));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let mut settings = Settings::default();
        settings.predictions.poll_interval_ms = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_storage_path() {
        let mut settings = Settings::default();
        settings.storage.base_path = String::new();
        assert!(settings.validate().is_err());
    }
}
