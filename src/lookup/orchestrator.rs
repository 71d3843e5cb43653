//! Read-through fallback with detached write-back.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::domain::{Character, LookupError, LookupResult};
use crate::observability::metrics;
use crate::remote::CharacterSource;
use crate::resilience::fallback::{self, with_fallback, FallbackPredicate, Tier};
use crate::store::CharacterStore;

/// Where a resolved character came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Store,
    Remote,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Store => "store",
            Source::Remote => "remote",
        }
    }
}

/// A successful resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub character: Character,
    pub source: Source,
}

/// Controls the asynchronous store fill after a remote hit.
#[derive(Debug, Clone, Copy)]
pub struct WriteBackPolicy {
    pub enabled: bool,
    /// Deadline for the insert, independent of the triggering request.
    pub timeout: Duration,
}

impl Default for WriteBackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout: Duration::from_millis(500),
        }
    }
}

/// Store first, remote second, and self-heal the store from remote hits.
pub struct FallbackOrchestrator {
    store: Arc<dyn CharacterStore>,
    remote: Arc<dyn CharacterSource>,
    should_fallback: FallbackPredicate<LookupError>,
    write_back: WriteBackPolicy,
}

impl FallbackOrchestrator {
    /// Falls back to the remote on every store error.
    pub fn new(
        store: Arc<dyn CharacterStore>,
        remote: Arc<dyn CharacterSource>,
        write_back: WriteBackPolicy,
    ) -> Self {
        Self {
            store,
            remote,
            should_fallback: fallback::always(),
            write_back,
        }
    }

    /// Replace the predicate deciding which store errors reach the remote.
    pub fn with_fallback_predicate(mut self, predicate: FallbackPredicate<LookupError>) -> Self {
        self.should_fallback = predicate;
        self
    }

    pub async fn resolve(&self, name: &str) -> LookupResult<Resolution> {
        let (character, tier) = with_fallback(
            || self.from_store(name),
            || self.remote.get(name),
            &*self.should_fallback,
        )
        .await?;

        let source = match tier {
            Tier::Primary => Source::Store,
            Tier::Secondary => {
                self.schedule_write_back(character.clone());
                Source::Remote
            }
        };

        Ok(Resolution { character, source })
    }

    async fn from_store(&self, name: &str) -> LookupResult<Character> {
        match self.store.get(name).await {
            Ok(Some(character)) => Ok(character),
            Ok(None) => {
                tracing::debug!(name = %name, "Character not in store, falling back to API");
                Err(LookupError::Absent)
            }
            Err(e) => {
                tracing::warn!(name = %name, error = %e, "Store lookup failed, falling back to API");
                Err(e)
            }
        }
    }

    /// Persist a remote-sourced character without blocking the caller.
    ///
    /// The spawned task owns its data and deadline, so it keeps running when
    /// the request future is dropped or has already responded.
    fn schedule_write_back(&self, character: Character) {
        if !self.write_back.enabled {
            return;
        }

        let store = self.store.clone();
        let deadline = self.write_back.timeout;

        tokio::spawn(async move {
            match timeout(deadline, store.create(&character)).await {
                Ok(Ok(())) => {
                    tracing::debug!(id = character.id, name = %character.name, "Saved character from API");
                    metrics::record_write_back("stored");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        id = character.id,
                        name = %character.name,
                        error = %e,
                        "Failed to save character from API"
                    );
                    metrics::record_write_back("failed");
                }
                Err(_) => {
                    tracing::warn!(
                        id = character.id,
                        name = %character.name,
                        timeout_ms = deadline.as_millis() as u64,
                        "Saving character from API timed out"
                    );
                    metrics::record_write_back("timeout");
                }
            }
        });
    }
}
