//! Provider adapters - uniform dispatch from (prompt, provider) to media bytes

pub mod inference;
pub mod openai;
pub mod prediction;
pub mod registry;
pub mod traits;

pub use registry::ProviderRegistry;
pub use traits::{MediaProvider, MediaRequest, ProviderId};
