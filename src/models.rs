//! Core data models used throughout Veritas.
//!
//! These types represent the evidence, conversation turns, and generation
//! outcomes that flow between the retriever, the orchestrator, and the
//! HTTP layer. The serialized shapes are part of the public wire contract:
//! `GET /verify` returns an [`EvidenceResult`] verbatim, and a remote
//! retriever decodes that same shape.

use serde::{Deserialize, Serialize};

/// Maximum number of evidence items kept from a single search.
pub const MAX_EVIDENCE_ITEMS: usize = 4;

/// A single piece of grounding material returned by the search provider.
///
/// Fields are best-effort copies of the provider's fields and may be
/// absent; absent fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub title: Option<String>,
    pub snippet: Option<String>,
    /// Display domain of the result (e.g. `"www.reuters.com"`).
    pub source: Option<String>,
}

/// Whether the search provider reported any result items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    EvidenceFound,
    NoEvidenceFound,
}

impl EvidenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EvidenceFound => "EVIDENCE_FOUND",
            Self::NoEvidenceFound => "NO_EVIDENCE_FOUND",
        }
    }
}

/// Outcome of one evidence lookup.
///
/// `evidence` holds at most [`MAX_EVIDENCE_ITEMS`] items in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceResult {
    pub status: EvidenceStatus,
    pub evidence: Vec<EvidenceItem>,
}

impl EvidenceResult {
    /// The result for a search that produced nothing usable.
    pub fn none() -> Self {
        Self {
            status: EvidenceStatus::NoEvidenceFound,
            evidence: Vec::new(),
        }
    }

    /// Builds a result from provider-ordered items, truncating to
    /// [`MAX_EVIDENCE_ITEMS`]. An empty input yields [`EvidenceResult::none`].
    pub fn from_items(items: impl IntoIterator<Item = EvidenceItem>) -> Self {
        let evidence: Vec<EvidenceItem> = items.into_iter().take(MAX_EVIDENCE_ITEMS).collect();
        if evidence.is_empty() {
            return Self::none();
        }
        Self {
            status: EvidenceStatus::EvidenceFound,
            evidence,
        }
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry of the rolling conversation history.
///
/// Serializes as `{"role": "user", "parts": ["..."]}`; `parts` always holds
/// exactly one text string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub parts: Vec<String>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![text.into()],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![text.into()],
        }
    }

    /// The turn's text (the single entry of `parts`).
    pub fn text(&self) -> &str {
        self.parts.first().map(String::as_str).unwrap_or("")
    }
}

/// Result of asking the language model for text.
///
/// The model capability never fails a request: an unreachable or erroring
/// provider produces [`GenerationOutcome::Degraded`] carrying a
/// human-readable diagnostic, which callers may show in place of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Success(String),
    Degraded(String),
}

impl GenerationOutcome {
    /// The answer text, or the diagnostic when degraded.
    pub fn text(&self) -> &str {
        match self {
            Self::Success(text) | Self::Degraded(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Success(text) | Self::Degraded(text) => text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Body of a successful `POST /analyze-with-agent` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReply {
    /// The model's answer, or the diagnostic when `degraded` is set.
    pub agent_response: String,
    /// Session the turn was recorded under; send it back to continue.
    pub session_id: String,
    pub degraded: bool,
}
