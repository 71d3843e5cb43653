//! Circuit breaker for downstream dependency protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and are counted
//! - Open: dependency assumed down, calls fail fast
//! - Half-Open: a limited number of trial calls test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: requests >= min_requests && failures/requests >= failure_ratio
//! Open → Half-Open: after open_timeout
//! Half-Open → Closed: a trial call succeeds
//! Half-Open → Open: a trial call fails
//! ```
//!
//! # Design Decisions
//! - One breaker per dependency, shared via `Arc` by every caller
//! - Counts reset on every transition (each transition starts a new generation)
//! - Outcomes of calls from an older generation are discarded
//! - Success/failure classification is supplied by the caller, not hardcoded
//! - The lock is never held across an await point

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use metrics::{counter, gauge};
use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CircuitState {
    Closed = 0,
    Open = 1,
    HalfOpen = 2,
}

impl CircuitState {
    fn as_str(self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Rejection or inner error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CircuitError<E> {
    /// The circuit is open; the dependency was not contacted.
    #[error("circuit breaker is open")]
    Open,

    /// Half-open and the trial budget is used up.
    #[error("too many requests")]
    TooManyRequests,

    /// Error produced by the wrapped call, unchanged.
    #[error("{0}")]
    Inner(E),
}

/// Request/failure counters for the current generation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub requests: u32,
    pub total_successes: u32,
    pub total_failures: u32,
    pub consecutive_successes: u32,
    pub consecutive_failures: u32,
}

impl Counts {
    fn on_request(&mut self) {
        self.requests = self.requests.saturating_add(1);
    }

    fn on_success(&mut self) {
        self.total_successes = self.total_successes.saturating_add(1);
        self.consecutive_successes = self.consecutive_successes.saturating_add(1);
        self.consecutive_failures = 0;
    }

    fn on_failure(&mut self) {
        self.total_failures = self.total_failures.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.consecutive_successes = 0;
    }

    fn failure_ratio(&self) -> f64 {
        if self.requests == 0 {
            return 0.0;
        }
        self.total_failures as f64 / self.requests as f64
    }
}

/// Tuning for a single breaker.
#[derive(Debug, Clone)]
pub struct BreakerSettings {
    /// Name used in logs and metric labels.
    pub name: String,
    /// Trial calls allowed through while half-open.
    pub max_requests: u32,
    /// Cool-down spent open before probing.
    pub open_timeout: Duration,
    /// Minimum requests in a generation before the ratio is considered.
    pub min_requests: u32,
    /// Failure ratio at or above which the circuit trips.
    pub failure_ratio: f64,
    /// Period after which closed-state counts are cleared. `None` keeps
    /// counting until the next transition.
    pub interval: Option<Duration>,
}

impl BreakerSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    pub fn with_max_requests(mut self, max: u32) -> Self {
        self.max_requests = max;
        self
    }

    pub fn with_interval(mut self, interval: Option<Duration>) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_trip_threshold(mut self, min_requests: u32, failure_ratio: f64) -> Self {
        self.min_requests = min_requests;
        self.failure_ratio = failure_ratio;
        self
    }

    fn ready_to_trip(&self, counts: &Counts) -> bool {
        counts.requests >= self.min_requests && counts.failure_ratio() >= self.failure_ratio
    }
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            name: "breaker".to_string(),
            max_requests: 5,
            open_timeout: Duration::from_secs(5),
            min_requests: 10,
            failure_ratio: 0.5,
            interval: None,
        }
    }
}

/// Point-in-time view of a breaker, for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub counts: Counts,
}

struct Circuit {
    state: CircuitState,
    generation: u64,
    counts: Counts,
    /// Open: when probing may start. Closed: when counts are cleared.
    expiry: Option<Instant>,
}

/// Failure-rate tripped gate around a single dependency.
pub struct CircuitBreaker {
    settings: BreakerSettings,
    circuit: Mutex<Circuit>,
}

impl CircuitBreaker {
    pub fn new(settings: BreakerSettings) -> Self {
        let expiry = settings.interval.map(|i| Instant::now() + i);
        gauge!("lookup_breaker_state", "breaker" => settings.name.clone())
            .set(CircuitState::Closed as u8 as f64);
        Self {
            settings,
            circuit: Mutex::new(Circuit {
                state: CircuitState::Closed,
                generation: 0,
                counts: Counts::default(),
                expiry,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.settings.name
    }

    /// Current state, accounting for an elapsed cool-down.
    pub fn state(&self) -> CircuitState {
        let mut circuit = self.lock();
        self.current_state(&mut circuit, Instant::now());
        circuit.state
    }

    pub fn counts(&self) -> Counts {
        self.lock().counts
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let mut circuit = self.lock();
        self.current_state(&mut circuit, Instant::now());
        BreakerSnapshot {
            name: self.settings.name.clone(),
            state: circuit.state,
            counts: circuit.counts,
        }
    }

    /// Run `fut` through the breaker.
    ///
    /// `is_failure` decides whether the outcome counts against the
    /// dependency. The wrapped result is returned unchanged; the breaker only
    /// substitutes its own error when it refuses to run the call.
    pub async fn call<T, E, Fut, C>(&self, is_failure: C, fut: Fut) -> Result<T, CircuitError<E>>
    where
        Fut: Future<Output = Result<T, E>>,
        C: FnOnce(&Result<T, E>) -> bool,
    {
        let generation = self.before_request::<E>()?;
        let permit = CallPermit {
            breaker: self,
            generation,
            settled: false,
        };

        let result = fut.await;
        permit.settle(!is_failure(&result));

        result.map_err(CircuitError::Inner)
    }

    fn lock(&self) -> MutexGuard<'_, Circuit> {
        self.circuit.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn before_request<E>(&self) -> Result<u64, CircuitError<E>> {
        let mut circuit = self.lock();
        self.current_state(&mut circuit, Instant::now());

        match circuit.state {
            CircuitState::Open => {
                counter!("lookup_breaker_rejections_total", "breaker" => self.settings.name.clone())
                    .increment(1);
                return Err(CircuitError::Open);
            }
            CircuitState::HalfOpen if circuit.counts.requests >= self.settings.max_requests => {
                counter!("lookup_breaker_rejections_total", "breaker" => self.settings.name.clone())
                    .increment(1);
                return Err(CircuitError::TooManyRequests);
            }
            _ => {}
        }

        circuit.counts.on_request();
        Ok(circuit.generation)
    }

    fn after_request(&self, before: u64, success: bool) {
        let mut circuit = self.lock();
        let now = Instant::now();
        self.current_state(&mut circuit, now);

        if circuit.generation != before {
            return;
        }

        if success {
            self.on_success(&mut circuit, now);
        } else {
            self.on_failure(&mut circuit, now);
        }
    }

    fn on_success(&self, circuit: &mut Circuit, now: Instant) {
        circuit.counts.on_success();
        if circuit.state == CircuitState::HalfOpen {
            self.set_state(circuit, CircuitState::Closed, now);
        }
    }

    fn on_failure(&self, circuit: &mut Circuit, now: Instant) {
        circuit.counts.on_failure();
        match circuit.state {
            CircuitState::Closed => {
                if self.settings.ready_to_trip(&circuit.counts) {
                    tracing::warn!(
                        breaker = %self.settings.name,
                        requests = circuit.counts.requests,
                        failures = circuit.counts.total_failures,
                        "Failure ratio exceeded, tripping circuit"
                    );
                    self.set_state(circuit, CircuitState::Open, now);
                }
            }
            CircuitState::HalfOpen => self.set_state(circuit, CircuitState::Open, now),
            CircuitState::Open => {}
        }
    }

    fn current_state(&self, circuit: &mut Circuit, now: Instant) {
        match circuit.state {
            CircuitState::Closed => {
                if circuit.expiry.is_some_and(|e| e <= now) {
                    self.new_generation(circuit, now);
                }
            }
            CircuitState::Open => {
                if circuit.expiry.is_some_and(|e| e <= now) {
                    self.set_state(circuit, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn set_state(&self, circuit: &mut Circuit, state: CircuitState, now: Instant) {
        if circuit.state == state {
            return;
        }

        let from = circuit.state;
        circuit.state = state;
        self.new_generation(circuit, now);

        tracing::info!(
            breaker = %self.settings.name,
            from = from.as_str(),
            to = state.as_str(),
            "Circuit state transition"
        );
        counter!(
            "lookup_breaker_transitions_total",
            "breaker" => self.settings.name.clone(),
            "from" => from.as_str(),
            "to" => state.as_str()
        )
        .increment(1);
        gauge!("lookup_breaker_state", "breaker" => self.settings.name.clone())
            .set(state as u8 as f64);
    }

    fn new_generation(&self, circuit: &mut Circuit, now: Instant) {
        circuit.generation += 1;
        circuit.counts = Counts::default();
        circuit.expiry = match circuit.state {
            CircuitState::Closed => self.settings.interval.map(|i| now + i),
            CircuitState::Open => Some(now + self.settings.open_timeout),
            CircuitState::HalfOpen => None,
        };
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.settings.name)
            .field("state", &self.lock().state)
            .finish()
    }
}

/// Outstanding admission for one call.
///
/// Dropped without being settled (the caller's future was cancelled), the
/// call is recorded as a failure so a half-open trial slot is never leaked.
struct CallPermit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl CallPermit<'_> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.after_request(self.generation, success);
    }
}

impl Drop for CallPermit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.after_request(self.generation, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(
            BreakerSettings::new("test")
                .with_open_timeout(Duration::from_secs(3))
                .with_max_requests(1),
        )
    }

    async fn fail(cb: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        cb.call(|r: &Result<(), &'static str>| r.is_err(), async { Err("boom") })
            .await
    }

    async fn succeed(cb: &CircuitBreaker) -> Result<(), CircuitError<&'static str>> {
        cb.call(|r: &Result<(), &'static str>| r.is_err(), async { Ok(()) }).await
    }

    #[tokio::test]
    async fn test_stays_closed_below_min_requests() {
        let cb = breaker();
        for _ in 0..9 {
            assert_eq!(fail(&cb).await, Err(CircuitError::Inner("boom")));
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.counts().total_failures, 9);
    }

    #[tokio::test]
    async fn test_trips_at_failure_ratio() {
        let cb = breaker();
        for _ in 0..5 {
            succeed(&cb).await.unwrap();
        }
        for _ in 0..4 {
            let _ = fail(&cb).await;
        }
        assert_eq!(cb.state(), CircuitState::Closed);

        // 10th request, 5/10 failures
        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.counts(), Counts::default());
    }

    #[tokio::test]
    async fn test_ratio_below_threshold_stays_closed() {
        let cb = breaker();
        for _ in 0..20 {
            succeed(&cb).await.unwrap();
        }
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_open_rejects_without_calling() {
        let cb = breaker();
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }

        let calls = AtomicU32::new(0);
        let res = cb
            .call(|r: &Result<(), ()>| r.is_err(), async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await;

        assert_eq!(res, Err(CircuitError::Open));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_success_closes() {
        let cb = breaker();
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }
        assert_eq!(cb.state(), CircuitState::Open);

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        succeed(&cb).await.unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_failure_reopens() {
        let cb = breaker();
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(fail(&cb).await, Err(CircuitError::Inner("boom")));
        assert_eq!(cb.state(), CircuitState::Open);

        // Cool-down restarts
        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(succeed(&cb).await, Err(CircuitError::Open));
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_limits_trial_calls() {
        let cb = Arc::new(breaker());
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(3)).await;

        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let trial = {
            let cb = cb.clone();
            tokio::spawn(async move {
                cb.call(|r: &Result<(), ()>| r.is_err(), async {
                    let _ = release_rx.await;
                    Ok(())
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        // Only one trial permitted while the first is in flight
        assert_eq!(succeed(&cb).await, Err(CircuitError::TooManyRequests));

        release_tx.send(()).unwrap();
        assert!(trial.await.unwrap().is_ok());
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_half_open_admits_default_trial_budget() {
        let cb = Arc::new(CircuitBreaker::new(
            BreakerSettings::new("budget").with_open_timeout(Duration::from_secs(3)),
        ));
        for _ in 0..10 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        let gate = Arc::new(tokio::sync::Semaphore::new(0));
        let mut trials = Vec::new();
        for _ in 0..5 {
            let cb = cb.clone();
            let gate = gate.clone();
            trials.push(tokio::spawn(async move {
                cb.call(|r: &Result<(), ()>| r.is_err(), async move {
                    let _permit = gate.acquire().await;
                    Ok(())
                })
                .await
            }));
        }
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
        assert_eq!(cb.counts().requests, 5);

        // Sixth caller is over the budget
        assert_eq!(succeed(&cb).await, Err(CircuitError::TooManyRequests));

        gate.add_permits(5);
        for trial in trials {
            assert!(trial.await.unwrap().is_ok());
        }
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_counts_saturate() {
        let mut counts = Counts {
            requests: u32::MAX,
            total_successes: u32::MAX,
            total_failures: u32::MAX,
            consecutive_successes: u32::MAX,
            consecutive_failures: u32::MAX,
        };
        counts.on_request();
        counts.on_success();
        counts.on_failure();
        assert_eq!(counts.requests, u32::MAX);
        assert_eq!(counts.total_successes, u32::MAX);
        assert_eq!(counts.total_failures, u32::MAX);
        assert_eq!(counts.consecutive_failures, u32::MAX);
    }

    #[tokio::test]
    async fn test_classifier_decides_failure() {
        let cb = breaker();
        for _ in 0..20 {
            let res = cb
                .call(|r: &Result<(), u16>| !matches!(r, Err(404)), async { Err(404u16) })
                .await;
            assert_eq!(res, Err(CircuitError::Inner(404)));
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.counts().total_successes, 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_clears_closed_counts() {
        let cb = CircuitBreaker::new(
            BreakerSettings::new("interval").with_interval(Some(Duration::from_secs(60))),
        );
        for _ in 0..9 {
            let _ = fail(&cb).await;
        }
        tokio::time::advance(Duration::from_secs(61)).await;

        let _ = fail(&cb).await;
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.counts().requests, 1);
    }

    #[tokio::test]
    async fn test_cancelled_call_counts_as_failure() {
        let cb = breaker();
        {
            let fut = cb.call(|r: &Result<(), ()>| r.is_err(), std::future::pending());
            let _ = tokio::time::timeout(Duration::from_millis(1), fut).await;
        }
        let counts = cb.counts();
        assert_eq!(counts.requests, 1);
        assert_eq!(counts.total_failures, 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_do_not_lose_counts() {
        let cb = Arc::new(CircuitBreaker::new(
            BreakerSettings::new("concurrent").with_trip_threshold(1_000, 0.5),
        ));
        let mut handles = Vec::new();
        for i in 0..100u32 {
            let cb = cb.clone();
            handles.push(tokio::spawn(async move {
                let _ = cb
                    .call(|r: &Result<(), ()>| r.is_err(), async move {
                        if i % 2 == 0 { Ok(()) } else { Err(()) }
                    })
                    .await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let counts = cb.counts();
        assert_eq!(counts.requests, 100);
        assert_eq!(counts.total_failures, 50);
        assert_eq!(counts.total_successes, 50);
    }
}
