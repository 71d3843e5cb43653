//! Domain subsystem.
//!
//! # Data Flow
//! ```text
//! store / remote adapters
//!     → character.rs (Character, read verbatim or decoded from the API)
//!     → lookup service projects into CharacterDto
//!     → HTTP boundary serializes the DTO
//!
//! Any failure along the way:
//!     → error.rs (LookupError, message safe for end users)
//! ```
//!
//! # Design Decisions
//! - `name` is the only lookup key (case-sensitive exact match)
//! - Entities are never mutated after construction
//! - The DTO decouples the persisted/wire shape from the public contract

pub mod character;
pub mod error;

pub use character::{Character, CharacterDto};
pub use error::{Dependency, LookupError, LookupResult};
