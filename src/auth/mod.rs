//! Access gate - delegated login and per-request token revalidation

pub mod client;
pub mod gate;

pub use client::AuthClient;
pub use gate::AccessGateLayer;
