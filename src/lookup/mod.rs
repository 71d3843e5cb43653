//! Lookup subsystem: the "resolve by name" use case.
//!
//! # Data Flow
//! ```text
//! LookupService::get_by_name(name)
//!     → reject empty names
//!     → orchestrator.rs: store.get(name)
//!         hit  → return record (no write-back)
//!         miss/error → remote.get(name)
//!             ok  → return record + detached write-back into the store
//!             err → return remote error verbatim
//!     → project Character into CharacterDto
//! ```
//!
//! # Design Decisions
//! - Store and remote are traits; the orchestrator never sees breakers or wire formats
//! - The write-back runs on its own task with its own deadline and can
//!   outlive the request that triggered it
//! - Write-back failures are logged and counted, never returned

pub mod orchestrator;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::{FallbackOrchestrator, Resolution, Source, WriteBackPolicy};
pub use service::LookupService;
