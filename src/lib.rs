//! # Veritas
//!
//! A multilingual fact-checking agent service.
//!
//! Veritas looks up web evidence for a user's claim, hands that evidence and
//! the recent conversation to a generative model, and returns either a
//! verdict (True / False / Uncertain with sources) or a short conversational
//! reply, in the user's own language.
//!
//! ## Architecture
//!
//! ```text
//!                 ┌────────────────┐  translate   ┌────────────────┐
//!  POST /analyze ▶│ FactChecker    │─────────────▶│ LanguageModel  │
//!                 │ (orchestrator) │◀─────────────│   (Gemini)     │
//!                 └──────┬─────────┘   generate   └────────────────┘
//!                        │ retrieve
//!                        ▼
//!                 ┌────────────────┐              ┌────────────────┐
//!  GET /verify ──▶│  Evidence      │─────────────▶│ Custom Search  │
//!                 │  Retriever     │  or remote   │  / /verify     │
//!                 └────────────────┘              └────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GOOGLE_SEARCH_API_KEY=... GOOGLE_CSE_ID=... GEMINI_API_KEY=...
//! veritas verify "moon landing 1969"
//! veritas ask "¿Es cierto que la Gran Muralla se ve desde el espacio?"
//! veritas serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment credentials |
//! | [`models`] | Core data types |
//! | [`error`] | Request-path error taxonomy |
//! | [`search`] | Evidence retrieval (Custom Search or remote `/verify`) |
//! | [`llm`] | Generative model client |
//! | [`prompt`] | Prompt templates |
//! | [`history`] | Per-session rolling history |
//! | [`orchestrator`] | The fact-check turn pipeline |
//! | [`server`] | HTTP server |

pub mod config;
pub mod error;
pub mod history;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod search;
pub mod server;
