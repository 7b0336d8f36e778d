//! Configuration module

pub mod settings;

pub use settings::{
    AuthServiceConfig, InferenceConfig, LoggingConfig, OpenAiConfig, PredictionConfig,
    ServerConfig, Settings, StorageConfig,
};
