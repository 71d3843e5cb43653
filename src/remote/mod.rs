//! Remote character API subsystem.
//!
//! # Data Flow
//! ```text
//! FallbackOrchestrator (store missed or failed)
//!     → client.rs (RemoteGateway: breaker-wrapped GET ?name=<key>)
//!     → JSON array of zero or more characters
//!     → first record, or "character not found"
//! ```
//!
//! # Design Decisions
//! - Transport details are logged, never returned to callers
//! - 4xx answers are the caller's problem and do not count against the breaker
//! - An empty result is a completed call: the breaker records a success

pub mod client;

use async_trait::async_trait;

use crate::domain::{Character, LookupResult};

pub use client::RemoteGateway;

/// A source that resolves a character by name, failing when it has none.
#[async_trait]
pub trait CharacterSource: Send + Sync {
    async fn get(&self, name: &str) -> LookupResult<Character>;
}
