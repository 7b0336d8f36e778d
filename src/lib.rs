//! Multi-Provider Media Generation Gateway
//!
//! An HTTP gateway that dispatches text prompts to external image/video
//! generation providers, stores returned assets on disk, and keeps a
//! per-session ledger of prompt/asset pairs behind a delegated login.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod provider;
pub mod session;
pub mod storage;

pub use error::{AppError, Result};

use std::sync::Arc;

use auth::AuthClient;
use config::Settings;
use provider::ProviderRegistry;
use session::SessionStore;
use storage::AssetStore;

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Settings,
    pub providers: Arc<ProviderRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub assets: AssetStore,
    pub auth: AuthClient,
}
