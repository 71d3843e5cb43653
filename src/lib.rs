//! Character lookup service library.
//!
//! Resolves Dragon Ball characters by name from a local store, falling back
//! to the public character API and writing remote results back to the store.

pub mod config;
pub mod domain;
pub mod http;
pub mod lifecycle;
pub mod lookup;
pub mod observability;
pub mod remote;
pub mod resilience;
pub mod store;

pub use config::schema::LookupConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use lookup::LookupService;
