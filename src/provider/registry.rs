//! Registry of provider adapters, built once from configuration

use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::error::Result;
use crate::provider::inference::InferenceProvider;
use crate::provider::openai::OpenAiProvider;
use crate::provider::prediction::{PredictionKind, PredictionProvider};
use crate::provider::traits::{MediaProvider, ProviderId};

/// Maps provider ids to adapter instances
pub struct ProviderRegistry {
    providers: DashMap<ProviderId, Arc<dyn MediaProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: DashMap::new(),
        }
    }

    /// Build the full closed set of adapters from settings
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let registry = Self::new();

        registry.register(Arc::new(InferenceProvider::new(
            ProviderId::Flux,
            &settings.inference,
            &settings.inference.flux_model,
        )?));
        registry.register(Arc::new(InferenceProvider::new(
            ProviderId::Stability,
            &settings.inference,
            &settings.inference.stability_model,
        )?));
        registry.register(Arc::new(InferenceProvider::new(
            ProviderId::Boreal,
            &settings.inference,
            &settings.inference.boreal_model,
        )?));
        registry.register(Arc::new(InferenceProvider::new(
            ProviderId::PhantasmaAnime,
            &settings.inference,
            &settings.inference.phantasma_anime_model,
        )?));
        registry.register(Arc::new(OpenAiProvider::new(&settings.openai)?));
        registry.register(Arc::new(PredictionProvider::new(
            ProviderId::Upscale,
            PredictionKind::Upscale,
            &settings.predictions,
        )?));
        registry.register(Arc::new(PredictionProvider::new(
            ProviderId::Video,
            PredictionKind::Video,
            &settings.predictions,
        )?));

        info!(count = registry.providers.len(), "Registered providers");
        Ok(registry)
    }

    pub fn register(&self, provider: Arc<dyn MediaProvider>) {
        self.providers.insert(provider.id(), provider);
    }

    pub fn get(&self, id: ProviderId) -> Option<Arc<dyn MediaProvider>> {
        self.providers.get(&id).map(|p| p.clone())
    }

    pub fn ids(&self) -> Vec<ProviderId> {
        self.providers.iter().map(|e| *e.key()).collect()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
