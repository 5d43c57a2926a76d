//! Completion service integration.
//!
//! The session engine talks to the hosted model through the
//! [`CompletionClient`] trait. One production implementation ships:
//!
//! - **OpenAI-compatible** speaks the Chat Completions wire format, used by Groq
//!   (the default endpoint), OpenAI, Ollama, vLLM and others
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐     ┌──────────────────┐
//! │ SessionService │────▶│ CompletionClient │  (trait)
//! └────────────────┘     └────────┬─────────┘
//!                                 │
//!                    ┌────────────┴────────────┐
//!                    ▼                         ▼
//!          ┌───────────────────┐      ┌────────────────┐
//!          │ OpenAiCompatClient│      │  test stubs    │
//!          │ (Groq, OpenAI, …) │      │                │
//!          └───────────────────┘      └────────────────┘
//! ```

pub mod openai;
pub mod provider;
pub mod types;

pub use openai::OpenAiCompatClient;
pub use provider::{CompletionClient, LlmError};
pub use types::*;
