//! Common types for completion requests.
//!
//! These types define the provider-independent vocabulary the session engine
//! speaks: role-tagged messages in, one reply text out.

use serde::{Deserialize, Serialize};

/// Where a message sits in the assembled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// The persona instruction.
    System,
    /// A user input replayed from history.
    HistoryInput,
    /// A model reply replayed from history.
    HistoryOutput,
    /// The input being answered now.
    CurrentInput,
}

impl Role {
    /// The role name used by OpenAI-compatible chat APIs.
    pub fn wire_name(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::HistoryInput | Role::CurrentInput => "user",
            Role::HistoryOutput => "assistant",
        }
    }
}

/// A role-tagged unit of prompt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn history_input(content: impl Into<String>) -> Self {
        Self::new(Role::HistoryInput, content)
    }

    pub fn history_output(content: impl Into<String>) -> Self {
        Self::new(Role::HistoryOutput, content)
    }

    pub fn current_input(content: impl Into<String>) -> Self {
        Self::new(Role::CurrentInput, content)
    }
}

/// Request for a single completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Model identifier (e.g. "llama3-8b-8192").
    pub model: String,
    /// Ordered prompt messages.
    pub messages: Vec<Message>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Temperature (0.0–2.0).
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }
}

impl Default for CompletionRequest {
    fn default() -> Self {
        Self {
            model: String::new(),
            messages: Vec::new(),
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(Role::System.wire_name(), "system");
        assert_eq!(Role::HistoryInput.wire_name(), "user");
        assert_eq!(Role::HistoryOutput.wire_name(), "assistant");
        assert_eq!(Role::CurrentInput.wire_name(), "user");
    }

    #[test]
    fn test_role_serializes_kebab_case() {
        let json = serde_json::to_string(&Message::history_output("ok")).unwrap();
        assert_eq!(json, r#"{"role":"history-output","content":"ok"}"#);
    }
}
