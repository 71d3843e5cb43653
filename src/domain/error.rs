//! Error taxonomy for the lookup core.
//!
//! Every message is safe to show to an end user; transport details are
//! logged, never returned.

use std::fmt;

use thiserror::Error;

use crate::resilience::circuit_breaker::CircuitError;

/// Downstream dependency a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    Store,
    Remote,
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dependency::Store => write!(f, "database"),
            Dependency::Remote => write!(f, "external api"),
        }
    }
}

/// Errors surfaced by the lookup core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Missing or malformed lookup key.
    #[error("The data submitted is invalid.")]
    InvalidInput,

    /// The dependency's breaker is shedding load.
    #[error("{dependency} circuit breaker is open")]
    CircuitOpen { dependency: Dependency },

    /// Half-open trial budget exhausted.
    #[error("{dependency} circuit breaker: too many requests")]
    TooManyRequests { dependency: Dependency },

    /// The dependency did not answer within its deadline.
    #[error("{dependency} request timed out")]
    Timeout { dependency: Dependency },

    /// Generic persistent store failure.
    #[error("database error: {0}")]
    Store(String),

    /// The store has no record for the key.
    #[error("no documents in result")]
    Absent,

    /// Transport-level failure talking to the remote API.
    #[error("service temporarily unavailable, please try again later")]
    Unavailable,

    /// The outbound request could not be built.
    #[error("creating request: {0}")]
    Request(String),

    /// The remote API answered with a non-success status.
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),

    /// The remote API body could not be decoded.
    #[error("decoding response: {0}")]
    Decode(String),

    /// The remote API returned no matching record.
    #[error("character not found")]
    NotFound,
}

impl LookupError {
    /// True when the failure means "no such character" rather than an
    /// infrastructure problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound | LookupError::Absent)
    }

    /// Convert a breaker rejection or inner error for the given dependency.
    pub fn from_circuit(dependency: Dependency, err: CircuitError<LookupError>) -> Self {
        match err {
            CircuitError::Open => LookupError::CircuitOpen { dependency },
            CircuitError::TooManyRequests => LookupError::TooManyRequests { dependency },
            CircuitError::Inner(e) => e,
        }
    }
}

/// Result type for lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;
