//! Two-tier fallback.
//!
//! # Responsibilities
//! - Try a primary source, then a secondary one when the primary fails
//! - Let the caller decide which primary errors warrant the second attempt
//! - Report which tier produced the value
//!
//! # Design Decisions
//! - Strictly sequential: the secondary never starts before the primary ends
//! - No tier beyond the secondary; its result is returned as is

use std::future::Future;
use std::sync::Arc;

/// Decides whether a primary error should trigger the secondary tier.
pub type FallbackPredicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Predicate that falls back on every error.
pub fn always<E: 'static>() -> FallbackPredicate<E> {
    Arc::new(|_: &E| true)
}

/// Which tier produced a successful value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Secondary,
}

impl Tier {
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        }
    }
}

/// Run `primary`; on error consult `should_fallback` and, if it agrees, run
/// `secondary` and return its outcome unchanged.
pub async fn with_fallback<T, E, P, PF, S, SF>(
    primary: P,
    secondary: S,
    should_fallback: &(dyn Fn(&E) -> bool + Send + Sync),
) -> Result<(T, Tier), E>
where
    P: FnOnce() -> PF,
    PF: Future<Output = Result<T, E>>,
    S: FnOnce() -> SF,
    SF: Future<Output = Result<T, E>>,
{
    let err = match primary().await {
        Ok(value) => return Ok((value, Tier::Primary)),
        Err(err) => err,
    };

    if !should_fallback(&err) {
        return Err(err);
    }

    secondary().await.map(|value| (value, Tier::Secondary))
}
