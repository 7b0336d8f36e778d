//! Common traits and types for media generation providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Closed set of registered providers. Resolved once at the HTTP boundary;
/// unrecognized tags never reach an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderId {
    Flux,
    Openai,
    Stability,
    Boreal,
    PhantasmaAnime,
    Upscale,
    Video,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Flux => "flux",
            ProviderId::Openai => "openai",
            ProviderId::Stability => "stability",
            ProviderId::Boreal => "boreal",
            ProviderId::PhantasmaAnime => "phantasma-anime",
            ProviderId::Upscale => "upscale",
            ProviderId::Video => "video",
        }
    }

    /// Providers selectable through the `generator` field of a generate
    /// request. Upscale and video have dedicated routes.
    pub fn is_image_generator(&self) -> bool {
        matches!(
            self,
            ProviderId::Flux
                | ProviderId::Openai
                | ProviderId::Stability
                | ProviderId::Boreal
                | ProviderId::PhantasmaAnime
        )
    }

    /// Non-premium sessions may only use the commercial provider.
    pub fn requires_premium(&self) -> bool {
        self.is_image_generator() && *self != ProviderId::Openai
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "flux" => Ok(ProviderId::Flux),
            "openai" => Ok(ProviderId::Openai),
            "stability" => Ok(ProviderId::Stability),
            "boreal" => Ok(ProviderId::Boreal),
            "phantasma-anime" => Ok(ProviderId::PhantasmaAnime),
            "upscale" => Ok(ProviderId::Upscale),
            "video" => Ok(ProviderId::Video),
            _ => Err(AppError::UnknownGenerator),
        }
    }
}

/// Request passed to a provider adapter
#[derive(Debug, Clone)]
pub struct MediaRequest {
    /// The text prompt (empty for image-to-image providers)
    pub prompt: String,

    /// Source image as a data URL, for upscaling and video generation
    pub source_image: Option<String>,
}

impl MediaRequest {
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            source_image: None,
        }
    }

    pub fn from_image(data_url: impl Into<String>) -> Self {
        Self {
            prompt: String::new(),
            source_image: Some(data_url.into()),
        }
    }
}

/// Trait for media generation providers
#[async_trait]
pub trait MediaProvider: Send + Sync {
    /// The provider this adapter serves
    fn id(&self) -> ProviderId;

    /// Turn a request into raw media bytes
    async fn generate(&self, request: &MediaRequest) -> Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id_round_trip() {
        for id in [
            ProviderId::Flux,
            ProviderId::Openai,
            ProviderId::Stability,
            ProviderId::Boreal,
            ProviderId::PhantasmaAnime,
            ProviderId::Upscale,
            ProviderId::Video,
        ] {
            assert_eq!(id.as_str().parse::<ProviderId>().unwrap(), id);
        }
    }

    #[test]
    fn test_unknown_tag_rejected() {
        assert!(matches!(
            "bogus".parse::<ProviderId>(),
            Err(AppError::UnknownGenerator)
        ));
    }

    #[test]
    fn test_premium_gate_set() {
        assert!(ProviderId::Flux.requires_premium());
        assert!(ProviderId::Stability.requires_premium());
        assert!(!ProviderId::Openai.requires_premium());
        assert!(!ProviderId::Upscale.requires_premium());
        assert!(!ProviderId::Video.requires_premium());
    }

    #[test]
    fn test_serde_matches_as_str() {
        let json = serde_json::to_string(&ProviderId::PhantasmaAnime).unwrap();
        assert_eq!(json, "\"phantasma-anime\"");
    }
}
