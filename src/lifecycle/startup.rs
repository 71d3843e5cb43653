//! Startup orchestration.
//!
//! Wires the subsystems in dependency order: the physical collection, one
//! breaker per dependency, the two gateways, then the orchestrator and the
//! service on top.

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::config::LookupConfig;
use crate::domain::LookupError;
use crate::http::AppState;
use crate::lookup::{FallbackOrchestrator, LookupService};
use crate::remote::RemoteGateway;
use crate::resilience::CircuitBreaker;
use crate::store::{CharacterCollection, CollectionError, FileCollection, StoreGateway};

/// Breaker name for the HTTP dependency.
pub const REMOTE_BREAKER: &str = "http-breaker";

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("opening store: {0}")]
    Store(#[from] CollectionError),

    #[error("building remote client: {0}")]
    Remote(#[from] LookupError),
}

/// Breaker name for a store collection.
pub fn store_breaker_name(collection: &str) -> String {
    format!("db-breaker:{collection}")
}

/// Build the application state from configuration.
pub fn build_state(config: &LookupConfig) -> Result<AppState, StartupError> {
    let collection: Arc<dyn CharacterCollection> = match &config.store.path {
        Some(path) => Arc::new(FileCollection::open(&config.store.collection, Path::new(path))?),
        None => {
            tracing::warn!(
                collection = %config.store.collection,
                "No store path configured, characters are kept in memory only"
            );
            Arc::new(FileCollection::new(&config.store.collection, None))
        }
    };

    let store_breaker = Arc::new(CircuitBreaker::new(
        config
            .breakers
            .store
            .settings(store_breaker_name(&config.store.collection)),
    ));
    let remote_breaker = Arc::new(CircuitBreaker::new(
        config.breakers.remote.settings(REMOTE_BREAKER),
    ));

    let store = StoreGateway::new(collection, store_breaker.clone(), config.store.op_timeout());
    let remote = RemoteGateway::new(
        &config.remote.base_url,
        config.remote.timeout(),
        remote_breaker.clone(),
    )?;

    let orchestrator =
        FallbackOrchestrator::new(Arc::new(store), Arc::new(remote), config.write_back.policy());

    tracing::info!(
        collection = %config.store.collection,
        remote = %config.remote.base_url,
        write_back = config.write_back.enabled,
        "Lookup service wired"
    );

    Ok(AppState {
        service: Arc::new(LookupService::new(orchestrator)),
        breakers: vec![store_breaker, remote_breaker],
    })
}
