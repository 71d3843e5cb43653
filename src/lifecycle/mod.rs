//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Collection → Breakers → Gateways → Orchestrator → AppState
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Broadcast → Server stops accepting → In-flight requests drain
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: a store file that cannot be read or a bad remote URL is fatal
//! - Write-backs still pending at exit are abandoned

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build_state, StartupError};
