//! Breaker-wrapped store adapter.
//!
//! # Responsibilities
//! - Bound every physical call with the store operation timeout
//! - Classify outcomes for the breaker (absence and duplicates are successes)
//! - Translate collection errors into the lookup error taxonomy

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::domain::{Character, Dependency, LookupError, LookupResult};
use crate::resilience::CircuitBreaker;
use crate::store::{CharacterCollection, CharacterStore, CollectionError};

/// Outcome of an insert that passed through the breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Store adapter guarded by its own circuit breaker.
#[derive(Clone)]
pub struct StoreGateway {
    collection: Arc<dyn CharacterCollection>,
    breaker: Arc<CircuitBreaker>,
    op_timeout: Duration,
}

impl StoreGateway {
    pub fn new(
        collection: Arc<dyn CharacterCollection>,
        breaker: Arc<CircuitBreaker>,
        op_timeout: Duration,
    ) -> Self {
        Self {
            collection,
            breaker,
            op_timeout,
        }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    fn store_error(e: CollectionError) -> LookupError {
        LookupError::Store(e.to_string())
    }
}

#[async_trait]
impl CharacterStore for StoreGateway {
    async fn get(&self, name: &str) -> LookupResult<Option<Character>> {
        let lookup = async {
            match timeout(self.op_timeout, self.collection.find_one(name)).await {
                Err(_) => Err(LookupError::Timeout { dependency: Dependency::Store }),
                Ok(Ok(character)) => Ok(Some(character)),
                Ok(Err(CollectionError::NotFound)) => Ok(None),
                Ok(Err(e)) => Err(Self::store_error(e)),
            }
        };

        self.breaker
            .call(|r| r.is_err(), lookup)
            .await
            .map_err(|e| LookupError::from_circuit(Dependency::Store, e))
    }

    async fn create(&self, character: &Character) -> LookupResult<()> {
        let insert = async {
            match timeout(self.op_timeout, self.collection.insert_one(character)).await {
                Err(_) => Err(LookupError::Timeout { dependency: Dependency::Store }),
                Ok(Ok(())) => Ok(InsertOutcome::Inserted),
                Ok(Err(CollectionError::DuplicateKey(_))) => Ok(InsertOutcome::AlreadyPresent),
                Ok(Err(e)) => Err(Self::store_error(e)),
            }
        };

        let outcome = self
            .breaker
            .call(|r| r.is_err(), insert)
            .await
            .map_err(|e| LookupError::from_circuit(Dependency::Store, e))?;

        if outcome == InsertOutcome::AlreadyPresent {
            tracing::debug!(
                collection = %self.collection.name(),
                name = %character.name,
                "Character already stored, insert skipped"
            );
        }
        Ok(())
    }
}
