//! Evidence retrieval.
//!
//! Defines the [`EvidenceRetriever`] trait and its two interchangeable
//! implementations:
//! - **[`CustomSearchRetriever`]** — calls the Google Custom Search JSON API
//!   directly (in-process retrieval).
//! - **[`RemoteRetriever`]** — calls another Veritas instance's
//!   `GET /verify` endpoint.
//!
//! Both produce the same [`EvidenceResult`] for the same upstream data: the
//! remote side runs [`map_search_response`] and returns its output verbatim,
//! and the local side re-applies the same truncation after decoding.
//!
//! # Outcome Classification
//!
//! | Provider response | Result |
//! |-------------------|--------|
//! | `items` absent or empty | `NO_EVIDENCE_FOUND`, `[]` |
//! | `searchInformation.totalResults == 0` | `NO_EVIDENCE_FOUND`, `[]` |
//! | N ≥ 1 items | `EVIDENCE_FOUND`, first min(N, 4) items in order |
//! | transport error, non-2xx, malformed body | [`RetrievalError::Unavailable`] |

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{Config, RetrievalMode, SearchConfig, SearchCredentials};
use crate::error::RetrievalError;
use crate::models::{EvidenceItem, EvidenceResult, MAX_EVIDENCE_ITEMS};

/// Source of evidence for a search query.
///
/// Implementations must reject an empty (or whitespace-only) query with
/// [`RetrievalError::InvalidQuery`] before doing any I/O.
#[async_trait]
pub trait EvidenceRetriever: Send + Sync {
    /// Short label for logs (e.g. `"custom-search"`).
    fn name(&self) -> &str;

    /// Look up evidence for `query`.
    async fn retrieve(&self, query: &str) -> Result<EvidenceResult, RetrievalError>;
}

/// Build the retriever selected by `[retrieval].mode`.
///
/// In-process mode needs the search credentials from the environment;
/// remote mode needs none.
pub fn create_retriever(config: &Config) -> Result<Arc<dyn EvidenceRetriever>> {
    match config.retrieval.mode {
        RetrievalMode::InProcess => {
            let credentials = SearchCredentials::from_env()?;
            Ok(Arc::new(CustomSearchRetriever::new(
                &config.search,
                credentials,
            )?))
        }
        RetrievalMode::Remote => {
            let url = config.retrieval.remote_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("retrieval.remote_url required for remote retrieval")
            })?;
            Ok(Arc::new(RemoteRetriever::new(
                url,
                Duration::from_secs(config.retrieval.timeout_secs),
            )?))
        }
    }
}

/// Run one lookup from the command line and print the evidence.
pub async fn run_verify(config: &Config, query: &str) -> Result<()> {
    let retriever = create_retriever(config)?;
    let result = retriever.retrieve(query).await?;

    println!("Status: {}", result.status.as_str());
    if result.evidence.is_empty() {
        println!("No evidence was found.");
        return Ok(());
    }

    for (i, item) in result.evidence.iter().enumerate() {
        println!(
            "{}. [{}] {}",
            i + 1,
            item.source.as_deref().unwrap_or("N/A"),
            item.title.as_deref().unwrap_or("N/A")
        );
        if let Some(snippet) = &item.snippet {
            println!("   {}", snippet.replace('\n', " "));
        }
    }

    Ok(())
}

fn validate_query(query: &str) -> Result<&str, RetrievalError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(RetrievalError::InvalidQuery);
    }
    Ok(query)
}

// ============ Custom Search ============

/// Retriever backed by the Google Custom Search JSON API.
///
/// Sends `GET {endpoint}?key=..&cx=..&q=..` and maps the response with
/// [`map_search_response`].
pub struct CustomSearchRetriever {
    client: reqwest::Client,
    endpoint: String,
    credentials: SearchCredentials,
}

impl CustomSearchRetriever {
    pub fn new(config: &SearchConfig, credentials: SearchCredentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            credentials,
        })
    }
}

#[async_trait]
impl EvidenceRetriever for CustomSearchRetriever {
    fn name(&self) -> &str {
        "custom-search"
    }

    async fn retrieve(&self, query: &str) -> Result<EvidenceResult, RetrievalError> {
        let query = validate_query(query)?;

        // without_url() keeps the API key out of error messages.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.credentials.api_key.as_str()),
                ("cx", self.credentials.engine_id.as_str()),
                ("q", query),
            ])
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                warn!(error = %e, "search provider unreachable");
                RetrievalError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            warn!(%status, "search provider returned an error");
            return Err(RetrievalError::Unavailable(format!(
                "search provider error {}: {}",
                status, body_text
            )));
        }

        let json: Value = response.json().await.map_err(|e| {
            RetrievalError::Unavailable(format!(
                "malformed search response: {}",
                e.without_url()
            ))
        })?;

        let result = map_search_response(&json)?;
        debug!(
            status = result.status.as_str(),
            items = result.evidence.len(),
            "search completed"
        );
        Ok(result)
    }
}

/// Map a Custom Search JSON response to an [`EvidenceResult`].
///
/// Pure function: the same input always yields the same output.
pub fn map_search_response(json: &Value) -> Result<EvidenceResult, RetrievalError> {
    let items = match json.get("items").and_then(|i| i.as_array()) {
        Some(items) if !items.is_empty() => items,
        _ => return Ok(EvidenceResult::none()),
    };

    if total_results(json)? == 0 {
        return Ok(EvidenceResult::none());
    }

    Ok(EvidenceResult::from_items(items.iter().map(|item| {
        EvidenceItem {
            title: string_field(item, "title"),
            snippet: string_field(item, "snippet"),
            source: string_field(item, "displayLink"),
        }
    })))
}

/// `searchInformation.totalResults`, which the API reports as a string.
/// Absent counts as zero.
fn total_results(json: &Value) -> Result<u64, RetrievalError> {
    let malformed = |v: &Value| {
        RetrievalError::Unavailable(format!("malformed search response: totalResults = {}", v))
    };

    match json
        .get("searchInformation")
        .and_then(|info| info.get("totalResults"))
    {
        None | Some(Value::Null) => Ok(0),
        Some(v) => match v {
            Value::String(s) => s.trim().parse::<u64>().map_err(|_| malformed(v)),
            Value::Number(n) => n.as_u64().ok_or_else(|| malformed(v)),
            _ => Err(malformed(v)),
        },
    }
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

// ============ Remote /verify ============

/// Retriever that delegates to another Veritas instance over HTTP.
///
/// Calls `GET {base_url}/verify?q=..` and decodes the [`EvidenceResult`]
/// JSON it returns.
pub struct RemoteRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteRetriever {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl EvidenceRetriever for RemoteRetriever {
    fn name(&self) -> &str {
        "remote"
    }

    async fn retrieve(&self, query: &str) -> Result<EvidenceResult, RetrievalError> {
        let query = validate_query(query)?;

        let response = self
            .client
            .get(format!("{}/verify", self.base_url))
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| {
                warn!(url = %self.base_url, error = %e, "verify service unreachable");
                RetrievalError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            let detail = body
                .get("detail")
                .and_then(|d| d.as_str())
                .unwrap_or("no detail");
            warn!(%status, detail, "verify service returned an error");
            return Err(RetrievalError::Unavailable(format!(
                "verify service error {}: {}",
                status, detail
            )));
        }

        let mut result: EvidenceResult = response.json().await.map_err(|e| {
            RetrievalError::Unavailable(format!("malformed verify response: {}", e))
        })?;
        result.evidence.truncate(MAX_EVIDENCE_ITEMS);

        Ok(result)
    }
}
