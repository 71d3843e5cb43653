//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lookup::WriteBackPolicy;
use crate::resilience::BreakerSettings;

/// Root configuration for the lookup service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct LookupConfig {
    /// Process-level settings (environment, bind address).
    pub app: AppConfig,

    /// Local persistent store.
    pub store: StoreConfig,

    /// External character API.
    pub remote: RemoteConfig,

    /// One breaker per dependency.
    pub breakers: BreakersConfig,

    /// Asynchronous store fill after remote hits.
    pub write_back: WriteBackConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name (e.g. "development").
    pub env: String,

    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            env: "production".to_string(),
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.env == "development"
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Collection name.
    pub collection: String,

    /// JSON file backing the collection. Memory-only when unset.
    pub path: Option<String>,

    /// Per-operation timeout in milliseconds.
    pub op_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: "characters".to_string(),
            path: Some("data/characters.json".to_string()),
            op_timeout_ms: 3000,
        }
    }
}

impl StoreConfig {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Base URI of the character API.
    pub base_url: String,

    /// Total request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dragonball-api.com".to_string(),
            timeout_ms: 3000,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakersConfig {
    pub store: BreakerConfig,
    pub remote: BreakerConfig,
}

impl Default for BreakersConfig {
    fn default() -> Self {
        Self {
            store: BreakerConfig {
                open_timeout_ms: 3000,
                ..BreakerConfig::default()
            },
            remote: BreakerConfig::default(),
        }
    }
}

/// Tuning for a single circuit breaker.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Trial calls allowed while half-open.
    pub max_requests: u32,

    /// Cool-down in the open state, in milliseconds.
    pub open_timeout_ms: u64,

    /// Requests needed before the failure ratio is evaluated.
    pub min_requests: u32,

    /// Failure ratio (0.0 - 1.0) that trips the circuit.
    pub failure_ratio: f64,

    /// Closed-state count reset period in milliseconds (0 = never).
    pub interval_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            max_requests: 5,
            open_timeout_ms: 5000,
            min_requests: 10,
            failure_ratio: 0.5,
            interval_ms: 0,
        }
    }
}

impl BreakerConfig {
    pub fn settings(&self, name: impl Into<String>) -> BreakerSettings {
        let interval = (self.interval_ms > 0).then(|| Duration::from_millis(self.interval_ms));
        BreakerSettings::new(name)
            .with_max_requests(self.max_requests)
            .with_open_timeout(Duration::from_millis(self.open_timeout_ms))
            .with_trip_threshold(self.min_requests, self.failure_ratio)
            .with_interval(interval)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WriteBackConfig {
    pub enabled: bool,

    /// Deadline for each write-back, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for WriteBackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            timeout_ms: 500,
        }
    }
}

impl WriteBackConfig {
    pub fn policy(&self) -> WriteBackPolicy {
        WriteBackPolicy {
            enabled: self.enabled,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
