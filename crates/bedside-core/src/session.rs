//! Session service: one conversation, one history window.
//!
//! [`SessionService::handle`] runs a turn end to end:
//!
//! ```text
//! Idle ─▶ Assembling ─▶ AwaitingCompletion ─▶ Formatting ─▶ Idle
//!                               │
//!                               └── error ─▶ Idle   (history untouched)
//! ```
//!
//! The history lock is held from the snapshot read until the new turn is
//! pushed, so concurrent calls on one session are applied one at a time and
//! never observe a half-updated window.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, warn};

use bedside_config::AppConfig;

use crate::context::{HistoryWindow, Turn, assemble};
use crate::format::{FormattedDocument, ResponseFormatter};
use crate::llm::{CompletionClient, CompletionRequest, LlmError};
use crate::persona::PersonaSpec;

/// Where a session is in the turn lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Assembling,
    AwaitingCompletion,
    Formatting,
}

/// Errors surfaced by [`SessionService::handle`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("input is empty")]
    EmptyInput,
}

/// Per-session completion settings.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Upper bound on one completion call.
    pub timeout: Duration,
    /// History window capacity `k`.
    pub history_capacity: usize,
}

impl SessionSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            model: config.llm.model.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            timeout: config.llm.timeout(),
            history_capacity: config.session.history_capacity,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// A formatted reply plus the data it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedReply {
    pub document: FormattedDocument,
    /// The model's reply text before formatting.
    pub raw: String,
    /// Sequence number of the turn recorded for this reply.
    pub turn: u64,
}

impl FormattedReply {
    pub fn render(&self) -> String {
        self.document.render()
    }
}

/// Orchestrates prompt assembly, completion, history, and formatting for one
/// conversation.
pub struct SessionService {
    persona: PersonaSpec,
    formatter: ResponseFormatter,
    client: Arc<dyn CompletionClient>,
    settings: SessionSettings,
    history: tokio::sync::Mutex<HistoryWindow>,
    state: Mutex<SessionState>,
}

impl SessionService {
    pub fn new(
        persona: PersonaSpec,
        client: Arc<dyn CompletionClient>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            formatter: ResponseFormatter::new(persona.style),
            history: tokio::sync::Mutex::new(HistoryWindow::new(settings.history_capacity)),
            persona,
            client,
            settings,
            state: Mutex::new(SessionState::Idle),
        }
    }

    /// Run one turn: assemble, complete, record, format.
    ///
    /// History is written only after the completion succeeds; any failure
    /// leaves it exactly as it was.
    pub async fn handle(&self, input: &str) -> Result<FormattedReply, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let mut history = self.history.lock().await;
        let _idle_on_exit = StateGuard(self);

        self.set_state(SessionState::Assembling);
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            messages: assemble(&self.persona, &history.snapshot(), input),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        self.set_state(SessionState::AwaitingCompletion);
        debug!(
            client = self.client.name(),
            persona = %self.persona.name,
            messages = request.messages.len(),
            "awaiting completion"
        );
        let raw = match tokio::time::timeout(self.settings.timeout, self.client.complete(&request))
            .await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                warn!(error = %e, "completion failed; history unchanged");
                return Err(e.into());
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.settings.timeout.as_millis() as u64,
                    "completion timed out; history unchanged"
                );
                return Err(LlmError::Timeout.into());
            }
        };

        let turn = history.push(input, raw.as_str());
        drop(history);

        self.set_state(SessionState::Formatting);
        let document = self.formatter.format(&raw);
        debug!(
            turn = turn.sequence_number(),
            style = self.formatter.style().config_name(),
            formatted = !document.is_passthrough(),
            "turn complete"
        );

        Ok(FormattedReply {
            document,
            raw,
            turn: turn.sequence_number(),
        })
    }

    /// Current history, oldest first.
    pub async fn history(&self) -> Vec<Turn> {
        self.history.lock().await.snapshot()
    }

    /// Forget all turns.
    pub async fn reset(&self) {
        self.history.lock().await.clear();
        debug!(persona = %self.persona.name, "session history cleared");
    }

    /// Lifecycle state; `Idle` whenever no turn is in flight.
    pub fn state(&self) -> SessionState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(SessionState::Idle)
    }

    /// The persona every prompt of this session is built from.
    pub fn persona(&self) -> &PersonaSpec {
        &self.persona
    }

    fn set_state(&self, state: SessionState) {
        if let Ok(mut s) = self.state.lock() {
            *s = state;
        }
    }
}

/// Returns the session to `Idle` however `handle` exits, including when its
/// future is dropped mid-await.
struct StateGuard<'a>(&'a SessionService);

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.0.set_state(SessionState::Idle);
    }
}
