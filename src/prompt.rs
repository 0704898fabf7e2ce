//! Prompt templates for the fact-check agent.
//!
//! Two prompts are sent per turn: a translation prompt that turns the
//! user's message into an English search query, and the fact-check prompt
//! that carries the persona, recent history, the message, the evidence,
//! and the Chit-Chat / Fact-Check decision instruction. Choosing between
//! the two actions is left to the model; nothing here inspects intent.

use std::fmt::Write;

use crate::models::{ConversationTurn, EvidenceResult};

/// Marker used in place of the evidence list when nothing was found.
pub const NO_EVIDENCE_MARKER: &str = "No evidence was found.";

const PERSONA: &str =
    "You are 'Veritas', a smart, multilingual, and expert AI fact-checker.";

const DECISION_INSTRUCTION: &str = "\
**Your Task (follow these steps):**
1. **Analyze Intent:** Read the user's latest message in its original language. Decide whether it asks for something to be verified or is a simple conversational remark (such as a greeting).
2. **Analyze Evidence:** Check whether the retrieved evidence is relevant to the message.
3. **Decide Action:** Choose exactly ONE of the following actions:

   * **Action: Chit-Chat:** If the intent is conversational, IGNORE the evidence and give a short, friendly, conversational reply IN THE USER'S ORIGINAL LANGUAGE.

   * **Action: Fact-Check:** If the intent is to get information verified, perform a fact-check with this structure:
       a. **Verdict:** Start with a clear verdict: True, False, or Uncertain.
       b. **Explanation:** In 1-2 simple sentences, explain the reasoning based on the evidence.
       c. **Sources:** List the source platforms you analyzed.
       d. **Translate:** Write the entire final answer in the USER'S ORIGINAL LANGUAGE.";

/// Prompt asking the model for an English web-search query.
pub fn translation_prompt(utterance: &str) -> String {
    format!(
        "Translate the following user query to English so it can be used for a web search. \
         If it's already in English, just repeat it. Query: '{}'",
        utterance
    )
}

/// Render the evidence list, or [`NO_EVIDENCE_MARKER`] when empty.
///
/// Absent fields are shown as `N/A`.
pub fn format_evidence(result: &EvidenceResult) -> String {
    if result.evidence.is_empty() {
        return NO_EVIDENCE_MARKER.to_string();
    }

    let mut out = String::new();
    for item in &result.evidence {
        let _ = write!(
            out,
            "- Source: {}\n  Title: {}\n  Snippet: {}\n\n",
            item.source.as_deref().unwrap_or("N/A"),
            item.title.as_deref().unwrap_or("N/A"),
            item.snippet.as_deref().unwrap_or("N/A"),
        );
    }
    out
}

/// Serialize the last `context_turns` turns as pretty-printed JSON.
pub fn format_history(history: &[ConversationTurn], context_turns: usize) -> String {
    let start = history.len().saturating_sub(context_turns);
    serde_json::to_string_pretty(&history[start..]).unwrap_or_else(|_| "[]".to_string())
}

/// Assemble the fact-check prompt.
///
/// Sections appear in a fixed order: persona, recent history, the user's
/// message verbatim, evidence status and items, decision instruction.
pub fn fact_check_prompt(
    history: &[ConversationTurn],
    context_turns: usize,
    utterance: &str,
    evidence: &EvidenceResult,
) -> String {
    format!(
        "{persona}\n\n\
         **Conversation History:**\n{history}\n\n\
         **User's Latest Message (in their original language):**\n\"{utterance}\"\n\n\
         **Evidence Retrieved from Trusted Sources (in English):**\n\
         Status: {status}\n{evidence}\n\n\
         {instruction}\n",
        persona = PERSONA,
        history = format_history(history, context_turns),
        utterance = utterance,
        status = evidence.status.as_str(),
        evidence = format_evidence(evidence),
        instruction = DECISION_INSTRUCTION,
    )
}
