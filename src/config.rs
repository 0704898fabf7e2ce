//! Configuration loading.
//!
//! Non-secret settings come from a TOML file; every key has a default so a
//! missing default config file yields a working all-default [`Config`].
//! Credentials are read from the environment only and have no embedded
//! fallback: a missing key is a startup error naming the variable.
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `GOOGLE_SEARCH_API_KEY` | Search provider API key |
//! | `GOOGLE_CSE_ID` | Search engine (context) identifier |
//! | `GEMINI_API_KEY` | Generative model API key |
//! | `SEARCH_API_URL` | Forces remote retrieval against this `/verify` service |
//! | `PORT` | Overrides the port of `[server].bind` |

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub history: HistoryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory holding `index.html` and other landing assets.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            static_dir: None,
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            timeout_secs: default_search_timeout(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://www.googleapis.com/customsearch/v1".to_string()
}
fn default_search_timeout() -> u64 {
    30
}

/// Where evidence comes from.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetrievalMode {
    /// Call the search provider directly.
    #[default]
    InProcess,
    /// Call another Veritas instance's `GET /verify`.
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub mode: RetrievalMode,
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default = "default_search_timeout")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::InProcess,
            remote_url: None,
            timeout_secs: default_search_timeout(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_model_base_url")]
    pub base_url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_model_base_url(),
            temperature: default_temperature(),
            timeout_secs: default_model_timeout(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_model_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_temperature() -> f64 {
    0.2
}
fn default_model_timeout() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    /// Turns kept per session (two per exchange).
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
    /// Most recent turns embedded in the prompt text.
    #[serde(default = "default_prompt_turns")]
    pub prompt_turns: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_turns: default_max_turns(),
            prompt_turns: default_prompt_turns(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Upper bound on `history.max_turns`.
pub const MAX_HISTORY_TURNS: usize = 200;

fn default_max_turns() -> usize {
    6
}
fn default_prompt_turns() -> usize {
    4
}
fn default_max_sessions() -> usize {
    1024
}

/// Search provider credentials.
#[derive(Clone)]
pub struct SearchCredentials {
    pub api_key: String,
    pub engine_id: String,
}

impl std::fmt::Debug for SearchCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCredentials")
            .field("api_key", &"<redacted>")
            .field("engine_id", &self.engine_id)
            .finish()
    }
}

impl SearchCredentials {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: require(&lookup, "GOOGLE_SEARCH_API_KEY")?,
            engine_id: require(&lookup, "GOOGLE_CSE_ID")?,
        })
    }
}

/// Reads the generative model API key from `GEMINI_API_KEY`.
pub fn model_api_key() -> Result<String> {
    model_api_key_from(|key| std::env::var(key).ok())
}

pub fn model_api_key_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    require(&lookup, "GEMINI_API_KEY")
}

fn require(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => bail!("{} environment variable not set", name),
    }
}

impl Config {
    /// Applies `SEARCH_API_URL` and `PORT` overrides, then re-validates.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("SEARCH_API_URL").filter(|u| !u.trim().is_empty()) {
            self.retrieval.mode = RetrievalMode::Remote;
            self.retrieval.remote_url = Some(url);
        }

        if let Some(port) = lookup("PORT").filter(|p| !p.trim().is_empty()) {
            let port: u16 = port
                .trim()
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
            let host = self
                .server
                .bind
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            self.server.bind = format!("{}:{}", host, port);
        }

        validate(self)
    }
}

/// Loads and validates the config file.
///
/// When `required` is false and the file does not exist, the all-default
/// configuration is returned.
pub fn load_config(path: &Path, required: bool) -> Result<Config> {
    if !required && !path.exists() {
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let history = &config.history;
    if history.max_turns < 2 || history.max_turns > MAX_HISTORY_TURNS {
        bail!("history.max_turns must be in [2, {}]", MAX_HISTORY_TURNS);
    }
    // Turns are stored and evicted in user/model pairs.
    if history.max_turns % 2 != 0 {
        bail!("history.max_turns must be even");
    }
    if history.prompt_turns > history.max_turns {
        bail!("history.prompt_turns must be <= history.max_turns");
    }
    if history.max_sessions == 0 {
        bail!("history.max_sessions must be >= 1");
    }

    if !(0.0..=2.0).contains(&config.model.temperature) {
        bail!("model.temperature must be in [0.0, 2.0]");
    }

    if config.retrieval.mode == RetrievalMode::Remote
        && config
            .retrieval
            .remote_url
            .as_deref()
            .map_or(true, |u| u.trim().is_empty())
    {
        bail!("retrieval.remote_url must be set when retrieval.mode is 'remote'");
    }

    Ok(())
}
