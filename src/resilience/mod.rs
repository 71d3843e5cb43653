//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Lookup request:
//!     → fallback.rs (store first, remote on failure)
//!     → circuit_breaker.rs (one breaker per dependency, fail fast when open)
//!     → dependency call bounded by its own timeout
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every dependency call has a deadline
//! - No automatic retries beyond the single store → remote fallback
//! - Half-open probing is the only built-in retry, and it is time-gated

pub mod circuit_breaker;
pub mod fallback;

pub use circuit_breaker::{
    BreakerSettings, BreakerSnapshot, CircuitBreaker, CircuitError, CircuitState, Counts,
};
pub use fallback::{with_fallback, FallbackPredicate, Tier};
