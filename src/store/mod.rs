//! Persistent store subsystem.
//!
//! # Data Flow
//! ```text
//! FallbackOrchestrator
//!     → gateway.rs (StoreGateway: breaker + timeout + outcome classification)
//!     → CharacterCollection (physical store: find_one / insert_one)
//!     → file.rs (FileCollection: in-memory map persisted as JSON)
//! ```
//!
//! # Design Decisions
//! - "No documents" is data, not a failure: it never counts against the breaker
//! - Duplicate-key inserts are already-satisfied writes, never surfaced as errors
//! - The physical store is shared by all lookups and assumed safe for concurrent use

pub mod file;
pub mod gateway;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Character, LookupResult};

pub use file::FileCollection;
pub use gateway::StoreGateway;

/// Errors reported by a physical collection.
#[derive(Debug, Error)]
pub enum CollectionError {
    /// No record matches the key.
    #[error("no documents in result")]
    NotFound,

    /// A record with the same key already exists.
    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store cannot serve requests right now.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Physical character collection, keyed by exact name.
#[async_trait]
pub trait CharacterCollection: Send + Sync {
    /// Collection name, used for breaker naming and logs.
    fn name(&self) -> &str;

    async fn find_one(&self, name: &str) -> Result<Character, CollectionError>;

    async fn insert_one(&self, character: &Character) -> Result<(), CollectionError>;
}

/// Local store as seen by the lookup core.
#[async_trait]
pub trait CharacterStore: Send + Sync {
    /// Point lookup by name. `Ok(None)` when no record matches.
    async fn get(&self, name: &str) -> LookupResult<Option<Character>>;

    /// Insert-only. A record that already exists is not an error.
    async fn create(&self, character: &Character) -> LookupResult<()>;
}
