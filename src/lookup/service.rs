//! The caller-facing lookup use case.

use std::time::Instant;

use crate::domain::{CharacterDto, LookupError, LookupResult};
use crate::lookup::orchestrator::FallbackOrchestrator;
use crate::observability::metrics;

/// Resolves characters by name for the HTTP boundary.
pub struct LookupService {
    orchestrator: FallbackOrchestrator,
}

impl LookupService {
    pub fn new(orchestrator: FallbackOrchestrator) -> Self {
        Self { orchestrator }
    }

    /// Resolve a character by exact name.
    ///
    /// Empty names are rejected before any dependency is touched. Errors
    /// are returned unchanged; mapping them to status codes is the
    /// boundary's job.
    pub async fn get_by_name(&self, name: &str) -> LookupResult<CharacterDto> {
        if name.is_empty() {
            metrics::record_lookup("none", "invalid", Instant::now());
            return Err(LookupError::InvalidInput);
        }

        let start = Instant::now();
        match self.orchestrator.resolve(name).await {
            Ok(resolution) => {
                metrics::record_lookup(resolution.source.as_str(), "found", start);
                Ok(CharacterDto::from(&resolution.character))
            }
            Err(e) => {
                let outcome = if e.is_not_found() { "not_found" } else { "error" };
                metrics::record_lookup("none", outcome, start);
                tracing::debug!(name = %name, error = %e, "Lookup failed");
                Err(e)
            }
        }
    }
}
