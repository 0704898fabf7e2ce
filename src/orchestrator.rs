//! Conversational fact-check pipeline.
//!
//! One turn runs strictly in sequence:
//!
//! ```text
//! utterance ──▶ translate ──▶ retrieve ──▶ assemble prompt ──▶ generate ──▶ record
//!              (no history)  (fatal on     (persona, history,   (session     (append +
//!                             failure)      evidence, task)      history)     truncate)
//! ```
//!
//! Retrieval failures abort the turn with
//! [`OrchestratorError::ServiceUnavailable`] and leave the session history
//! untouched. Model failures never abort: a degraded translation is used
//! as the search query unchanged, and a degraded answer is returned and
//! recorded like any other answer.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::OrchestratorError;
use crate::history::SessionStore;
use crate::llm::{create_model, LanguageModel};
use crate::models::{EvidenceStatus, GenerationOutcome};
use crate::prompt;
use crate::search::{create_retriever, EvidenceRetriever};

/// Result of one completed turn.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub session_id: String,
    pub answer: GenerationOutcome,
    pub evidence_status: EvidenceStatus,
}

/// The fact-check agent: a retriever, a model, and the session histories.
pub struct FactChecker {
    retriever: Arc<dyn EvidenceRetriever>,
    model: Arc<dyn LanguageModel>,
    sessions: Arc<SessionStore>,
    prompt_turns: usize,
}

impl FactChecker {
    pub fn new(
        retriever: Arc<dyn EvidenceRetriever>,
        model: Arc<dyn LanguageModel>,
        sessions: Arc<SessionStore>,
        prompt_turns: usize,
    ) -> Self {
        Self {
            retriever,
            model,
            sessions,
            prompt_turns,
        }
    }

    /// Wire a checker with a fresh session store sized from `[history]`.
    pub fn from_config(
        config: &Config,
        retriever: Arc<dyn EvidenceRetriever>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self::new(
            retriever,
            model,
            Arc::new(SessionStore::from_config(&config.history)),
            config.history.prompt_turns,
        )
    }

    pub fn retriever(&self) -> &Arc<dyn EvidenceRetriever> {
        &self.retriever
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Ask the model for an English search query.
    ///
    /// Sent without history. A degraded outcome yields the diagnostic text
    /// itself; a blank translation falls back to the original utterance.
    pub async fn translate_to_search_query(&self, utterance: &str) -> String {
        match self
            .model
            .generate(&prompt::translation_prompt(utterance), &[])
            .await
        {
            GenerationOutcome::Success(text) if !text.trim().is_empty() => text.trim().to_string(),
            GenerationOutcome::Success(_) => utterance.to_string(),
            GenerationOutcome::Degraded(diagnostic) => {
                warn!("translation degraded; searching with the diagnostic text");
                diagnostic
            }
        }
    }

    /// Run one conversational fact-check turn for `session_id`.
    pub async fn handle(
        &self,
        session_id: &str,
        utterance: &str,
    ) -> Result<AgentTurn, OrchestratorError> {
        if utterance.trim().is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "text must not be empty".to_string(),
            ));
        }

        let query = self.translate_to_search_query(utterance).await;
        debug!(%session_id, %query, "search query");

        let evidence = self.retriever.retrieve(&query).await.map_err(|e| {
            warn!(retriever = self.retriever.name(), error = %e, "evidence retrieval failed");
            OrchestratorError::ServiceUnavailable(format!(
                "Cannot connect to fact-checking service: {}",
                e
            ))
        })?;
        debug!(
            %session_id,
            status = evidence.status.as_str(),
            items = evidence.evidence.len(),
            "evidence retrieved"
        );

        let history = self.sessions.snapshot(session_id);
        let prompt = prompt::fact_check_prompt(&history, self.prompt_turns, utterance, &evidence);
        let answer = self.model.generate(&prompt, &history).await;

        self.sessions
            .record_exchange(session_id, utterance, answer.text());

        if answer.is_degraded() {
            warn!(%session_id, "returning degraded answer");
        }

        Ok(AgentTurn {
            session_id: session_id.to_string(),
            answer,
            evidence_status: evidence.status,
        })
    }
}

/// Run a single turn from the command line and print the answer.
pub async fn run_ask(config: &Config, text: &str, session: Option<String>) -> Result<()> {
    let checker = FactChecker::from_config(config, create_retriever(config)?, create_model(config)?);
    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let turn = checker.handle(&session_id, text).await?;
    info!(
        session_id = %turn.session_id,
        evidence = turn.evidence_status.as_str(),
        degraded = turn.answer.is_degraded(),
        "turn complete"
    );

    println!("{}", turn.answer.text());
    Ok(())
}
