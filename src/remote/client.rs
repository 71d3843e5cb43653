//! HTTP client for the external character API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::domain::{Character, Dependency, LookupError, LookupResult};
use crate::remote::CharacterSource;
use crate::resilience::CircuitBreaker;

/// Path of the search endpoint, relative to the API base URL.
const CHARACTERS_PATH: &str = "api/characters";

/// Breaker-wrapped adapter over the external character API.
#[derive(Debug, Clone)]
pub struct RemoteGateway {
    client: Client,
    endpoint: Url,
    breaker: Arc<CircuitBreaker>,
}

impl RemoteGateway {
    /// Build a gateway with its own HTTP client.
    pub fn new(base_url: &str, timeout: Duration, breaker: Arc<CircuitBreaker>) -> LookupResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Request(e.to_string()))?;
        Self::with_client(base_url, client, breaker)
    }

    /// Build a gateway around an existing, shared client.
    pub fn with_client(base_url: &str, client: Client, breaker: Arc<CircuitBreaker>) -> LookupResult<Self> {
        let mut base: Url = base_url
            .parse()
            .map_err(|e| LookupError::Request(format!("invalid API URI '{}': {}", base_url, e)))?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let endpoint = base
            .join(CHARACTERS_PATH)
            .map_err(|e| LookupError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            breaker,
        })
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    async fn fetch(&self, name: &str) -> LookupResult<Vec<Character>> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("name", name)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(endpoint = %self.endpoint, error = %e, "Character API request failed");
                LookupError::Unavailable
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::UnexpectedStatus(status.as_u16()));
        }

        response
            .json::<Vec<Character>>()
            .await
            .map_err(|e| LookupError::Decode(e.to_string()))
    }
}

/// Client errors are answered by a healthy API; everything else counts.
fn is_failure(result: &LookupResult<Vec<Character>>) -> bool {
    match result {
        Ok(_) => false,
        Err(LookupError::UnexpectedStatus(code)) => !(400..500).contains(code),
        Err(_) => true,
    }
}

#[async_trait]
impl CharacterSource for RemoteGateway {
    async fn get(&self, name: &str) -> LookupResult<Character> {
        let characters = self
            .breaker
            .call(is_failure, self.fetch(name))
            .await
            .map_err(|e| LookupError::from_circuit(Dependency::Remote, e))?;

        characters.into_iter().next().ok_or(LookupError::NotFound)
    }
}
