//! Stub upstream services and server helpers shared by the integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use veritas::config::{Config, SearchCredentials};
use veritas::llm::GeminiClient;
use veritas::orchestrator::FactChecker;
use veritas::search::CustomSearchRetriever;
use veritas::server::run_server_with_checker;

pub type Responder = Arc<dyn Fn(&Value) -> (StatusCode, Value) + Send + Sync>;

/// A recording stub: counts hits, keeps every request, answers via `responder`.
#[derive(Clone)]
pub struct Stub {
    inner: Arc<StubInner>,
}

struct StubInner {
    hits: AtomicUsize,
    requests: Mutex<Vec<Value>>,
    responder: Responder,
}

impl Stub {
    fn new(responder: Responder) -> Self {
        Self {
            inner: Arc::new(StubInner {
                hits: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                responder,
            }),
        }
    }

    fn record(&self, request: Value) -> (StatusCode, Json<Value>) {
        self.inner.hits.fetch_add(1, Ordering::SeqCst);
        let (status, body) = (self.inner.responder)(&request);
        self.inner.requests.lock().unwrap().push(request);
        (status, Json(body))
    }

    pub fn hits(&self) -> usize {
        self.inner.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Value> {
        self.inner.requests.lock().unwrap().clone()
    }
}

// ─── Stub servers ───────────────────────────────────────────────────

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}

async fn search_handler(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    stub.record(serde_json::to_value(params).unwrap())
}

async fn gemini_handler(
    State(stub): State<Stub>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-goog-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    stub.record(json!({ "call": call, "api_key": key, "body": body }))
}

/// Start a Custom Search stub. Returns the stub and its endpoint URL.
pub async fn spawn_search_stub(responder: Responder) -> (Stub, String) {
    let stub = Stub::new(responder);
    let router = Router::new()
        .route("/customsearch/v1", get(search_handler))
        .with_state(stub.clone());
    let base = serve(router).await;
    (stub, format!("{}/customsearch/v1", base))
}

/// Start a Gemini stub. Returns the stub and its base URL.
pub async fn spawn_gemini_stub(responder: Responder) -> (Stub, String) {
    let stub = Stub::new(responder);
    let router = Router::new()
        .route("/v1beta/models/{call}", post(gemini_handler))
        .with_state(stub.clone());
    let base = serve(router).await;
    (stub, base)
}

// ─── Canned upstream payloads ───────────────────────────────────────

/// A Custom Search response with `n` items and the given total.
pub fn search_results(n: usize, total: &str) -> Value {
    let items: Vec<Value> = (0..n)
        .map(|i| {
            json!({
                "title": format!("Result {}", i),
                "snippet": format!("Snippet {}", i),
                "displayLink": format!("news{}.example", i),
                "link": format!("https://news{}.example/story", i),
            })
        })
        .collect();
    json!({
        "searchInformation": { "totalResults": total },
        "items": items,
    })
}

pub fn no_results() -> Value {
    json!({ "searchInformation": { "totalResults": "0" } })
}

pub fn fixed(status: StatusCode, body: Value) -> Responder {
    Arc::new(move |_: &Value| (status, body.clone()))
}

/// A `generateContent` success body with `text`.
pub fn gemini_text(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Text of the final `contents` entry of a recorded Gemini request.
pub fn prompt_of(request: &Value) -> String {
    request["body"]["contents"]
        .as_array()
        .and_then(|c| c.last())
        .and_then(|c| c["parts"][0]["text"].as_str())
        .unwrap_or("")
        .to_string()
}

pub fn is_translation(request: &Value) -> bool {
    prompt_of(request).starts_with("Translate")
}

/// Gemini responder: answers translation prompts with `translation`,
/// everything else with `answer`.
pub fn agent_model(translation: &str, answer: &str) -> Responder {
    let translation = translation.to_string();
    let answer = answer.to_string();
    Arc::new(move |req: &Value| {
        if is_translation(req) {
            (StatusCode::OK, gemini_text(&translation))
        } else {
            (StatusCode::OK, gemini_text(&answer))
        }
    })
}

// ─── Veritas helpers ────────────────────────────────────────────────

pub fn test_config(search_endpoint: &str, gemini_base: &str, port: u16) -> Config {
    let content = format!(
        r#"
[server]
bind = "127.0.0.1:{}"

[search]
endpoint = "{}"
timeout_secs = 5

[model]
base_url = "{}"
timeout_secs = 5
"#,
        port, search_endpoint, gemini_base
    );
    toml::from_str(&content).unwrap()
}

pub fn test_credentials() -> SearchCredentials {
    SearchCredentials {
        api_key: "test-search-key".to_string(),
        engine_id: "test-cx".to_string(),
    }
}

pub fn search_retriever(config: &Config) -> Arc<CustomSearchRetriever> {
    Arc::new(CustomSearchRetriever::new(&config.search, test_credentials()).unwrap())
}

pub fn gemini(config: &Config) -> Arc<GeminiClient> {
    Arc::new(GeminiClient::new(&config.model, "test-gemini-key".to_string()).unwrap())
}

/// A checker wired to the stubs named in `config`.
pub fn stub_checker(config: &Config) -> Arc<FactChecker> {
    Arc::new(FactChecker::from_config(
        config,
        search_retriever(config),
        gemini(config),
    ))
}

pub fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Start Veritas on `config.server.bind` and wait until it answers.
pub async fn start_veritas(
    config: &Config,
    port: u16,
    checker: Arc<FactChecker>,
) -> tokio::task::JoinHandle<()> {
    let cfg = config.clone();
    let handle = tokio::spawn(async move {
        run_server_with_checker(&cfg, checker).await.ok();
    });
    wait_for_server(port).await;
    handle
}
