#![deny(unsafe_code)]

//! Bedside core conversation engine.
//!
//! Runs persona-driven chat sessions against a hosted language model: each
//! turn merges a fixed persona instruction with a bounded window of recent
//! turns, asks the model for a reply, records the turn, and formats the reply
//! for display. The CLI and HTTP front door are thin layers over
//! [`SessionRegistry`].
//!
//! ```text
//!  input ─▶ SessionService ─▶ PromptAssembler ─▶ CompletionClient
//!                 │                 ▲                   │
//!                 │           HistoryWindow ◀── push ───┤
//!                 ▼                                     ▼
//!          FormattedReply ◀──────── ResponseFormatter ◀─ reply
//! ```

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async
/// trait methods that need dynamic dispatch (`dyn Trait`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// History window and prompt assembly.
pub mod context;
/// Markdown reply formatting.
pub mod format;
/// Completion client trait, wire types, and the OpenAI-compatible client.
pub mod llm;
/// Persona presets and config mapping.
pub mod persona;
/// Session id to session mapping with bounded capacity.
pub mod registry;
/// Per-conversation orchestration.
pub mod session;

pub use context::{HistoryWindow, Turn};
pub use format::{FormatStyle, FormattedDocument, ResponseFormatter};
pub use llm::{CompletionClient, LlmError, OpenAiCompatClient};
pub use persona::PersonaSpec;
pub use registry::{DEFAULT_SESSION, SessionRegistry};
pub use session::{FormattedReply, SessionError, SessionService, SessionSettings, SessionState};
