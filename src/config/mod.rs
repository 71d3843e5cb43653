//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (APP_ENV, APP_PORT, DB_PATH, API_URI, LOG_LEVEL)
//!     → validation.rs (semantic checks)
//!     → LookupConfig (validated, immutable)
//!     → shared by value/Arc with all subsystems
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Environment wins over the file, so containers need no config file
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, BreakerConfig, BreakersConfig, LookupConfig, ObservabilityConfig, RemoteConfig,
    StoreConfig, TimeoutConfig, WriteBackConfig,
};
