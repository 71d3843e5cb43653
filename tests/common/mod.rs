//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

use character_lookup::config::LookupConfig;
use character_lookup::http::HttpServer;
use character_lookup::lifecycle::{build_state, Shutdown};

type Responder = dyn Fn(&str) -> (StatusCode, Value) + Send + Sync;

/// A programmable stand-in for the public character API.
pub struct MockApi {
    pub addr: SocketAddr,
    calls: Arc<AtomicU32>,
}

impl MockApi {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct MockState {
    responder: Arc<Responder>,
    calls: Arc<AtomicU32>,
}

async fn characters(
    State(state): State<MockState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.calls.fetch_add(1, Ordering::SeqCst);
    let name = params.get("name").map(String::as_str).unwrap_or_default();
    let (status, body) = (state.responder)(name);
    (status, Json(body))
}

/// Start a mock API on an ephemeral port, answering with `responder`.
pub async fn start_mock_api<F>(responder: F) -> MockApi
where
    F: Fn(&str) -> (StatusCode, Value) + Send + Sync + 'static,
{
    let calls = Arc::new(AtomicU32::new(0));
    let state = MockState {
        responder: Arc::new(responder),
        calls: calls.clone(),
    };
    let app = Router::new()
        .route("/api/characters", get(characters))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockApi { addr, calls }
}

/// A mock API that knows exactly one character.
pub async fn start_mock_api_with(name: &'static str) -> MockApi {
    start_mock_api(move |query| {
        if query == name {
            (StatusCode::OK, json!([character_json(2, name)]))
        } else {
            (StatusCode::OK, json!([]))
        }
    })
    .await
}

pub fn character_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "ki": "54 Trillion",
        "maxKi": "19.84 Septillion",
        "race": "Saiyan",
        "gender": "Male",
        "description": "ignored by the service",
        "image": format!("https://dragonball-api.com/characters/{}.webp", name.to_lowercase()),
        "affiliation": "Z Fighter"
    })
}

pub fn temp_store_path() -> PathBuf {
    std::env::temp_dir().join(format!("lookup-it-{}.json", uuid::Uuid::new_v4()))
}

/// A running lookup service.
pub struct TestService {
    pub addr: SocketAddr,
    pub store_path: PathBuf,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestService {
    pub async fn lookup(&self, body: Value) -> (u16, Value) {
        let res = self
            .client
            .post(format!("http://{}/characters", self.addr))
            .json(&body)
            .send()
            .await
            .expect("service unreachable");
        let status = res.status().as_u16();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    pub async fn health(&self) -> Value {
        self.client
            .get(format!("http://{}/health", self.addr))
            .send()
            .await
            .expect("service unreachable")
            .json()
            .await
            .unwrap()
    }

    /// Names currently persisted in the store file.
    pub fn stored_names(&self) -> Vec<String> {
        let Ok(content) = std::fs::read(&self.store_path) else {
            return Vec::new();
        };
        let records: Vec<Value> = serde_json::from_slice(&content).unwrap();
        records
            .iter()
            .filter_map(|r| r["name"].as_str().map(str::to_string))
            .collect()
    }
}

impl Drop for TestService {
    fn drop(&mut self) {
        self.shutdown.trigger();
        let _ = std::fs::remove_file(&self.store_path);
    }
}

/// Start the service against `api`, seeding the store with `seed`.
pub async fn start_service(api: &MockApi, seed: &[Value]) -> TestService {
    start_service_at(&api.base_url(), seed).await
}

/// Base URL of a local port with nothing listening on it.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Start the service against an arbitrary API base URL.
pub async fn start_service_at(base_url: &str, seed: &[Value]) -> TestService {
    let store_path = temp_store_path();
    if !seed.is_empty() {
        std::fs::write(&store_path, serde_json::to_vec(seed).unwrap()).unwrap();
    }

    let mut config = LookupConfig::default();
    config.app.bind_address = "127.0.0.1:0".into();
    config.store.path = Some(store_path.display().to_string());
    config.remote.base_url = base_url.to_string();

    let state = build_state(&config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, state);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap();

    TestService {
        addr,
        store_path,
        client,
        shutdown,
    }
}

/// Poll `check` until it holds or two seconds pass.
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    for _ in 0..40 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}
