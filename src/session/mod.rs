//! Session ledger - per-browser conversation state and auth token
//!
//! Sessions are keyed by an opaque cookie-held id and live in a store behind
//! the [`SessionStore`] trait, so the backend is swappable without touching
//! route logic.

pub mod layer;
pub mod memory;

pub use layer::SessionLayer;
pub use memory::MemorySessionStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::provider::ProviderId;

/// Opaque per-browser session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(Self)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One successful generation. Never mutated; destroyed on session clear.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub prompt: String,
    pub provider: ProviderId,
    pub asset_name: String,
}

/// Everything a session holds
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionData {
    /// Ordered image generation records
    pub records: Vec<GenerationRecord>,
    /// Ordered video asset names, kept separately from image records
    pub videos: Vec<String>,
    /// Bearer token from the external auth service
    pub auth_token: Option<String>,
}

/// Entry shape returned by the conversation-history route
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HistoryEntry {
    Image {
        prompt: String,
        generator: ProviderId,
        image_url: String,
    },
    Video {
        video_url: String,
    },
}

impl SessionData {
    /// Displayed order: image records in insertion order, then video entries
    /// synthesized at read time. Differs from persisted order for mixed
    /// content on purpose.
    pub fn history(&self) -> Vec<HistoryEntry> {
        let mut entries: Vec<HistoryEntry> = self
            .records
            .iter()
            .map(|r| HistoryEntry::Image {
                prompt: r.prompt.clone(),
                generator: r.provider,
                image_url: r.asset_name.clone(),
            })
            .collect();

        entries.extend(self.videos.iter().map(|name| HistoryEntry::Video {
            video_url: name.clone(),
        }));

        entries
    }
}

/// Server-side session storage, injected into handlers and middleware
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch a session's state, if the session exists
    async fn load(&self, id: &SessionId) -> Option<SessionData>;

    /// Replace a session's state (last write wins)
    async fn save(&self, id: &SessionId, data: SessionData);

    /// Discard a session entirely
    async fn delete(&self, id: &SessionId);
}
