//! Scriptable completion client.
//!
//! [`StubCompletionClient`] replays a queue of scripted results, optionally
//! after a delay, and records every request it receives. Once the script is
//! exhausted it answers with the fallback reply.
//!
//! # Example
//!
//! ```ignore
//! let stub = StubCompletionClient::new()
//!     .reply("first")
//!     .fail(LlmError::Timeout)
//!     .delayed_reply("slow", Duration::from_secs(5));
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use bedside_core::BoxFuture;
use bedside_core::llm::{CompletionClient, CompletionRequest, LlmError};

struct Step {
    result: Result<String, LlmError>,
    delay: Option<Duration>,
}

pub struct StubCompletionClient {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<CompletionRequest>>,
    fallback: String,
}

impl StubCompletionClient {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            fallback: "stub reply".to_string(),
        }
    }

    /// Queue a successful reply.
    pub fn reply(self, text: impl Into<String>) -> Self {
        self.push(Ok(text.into()), None)
    }

    /// Queue a failure.
    pub fn fail(self, error: LlmError) -> Self {
        self.push(Err(error), None)
    }

    /// Queue a successful reply that arrives after `delay`.
    pub fn delayed_reply(self, text: impl Into<String>, delay: Duration) -> Self {
        self.push(Ok(text.into()), Some(delay))
    }

    /// Reply used once the script runs out.
    pub fn with_fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Every request received so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("stub request log poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().expect("stub request log poisoned").len()
    }

    /// The most recent request, if any.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .expect("stub request log poisoned")
            .last()
            .cloned()
    }

    fn push(self, result: Result<String, LlmError>, delay: Option<Duration>) -> Self {
        self.script
            .lock()
            .expect("stub script poisoned")
            .push_back(Step { result, delay });
        self
    }
}

impl Default for StubCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionClient for StubCompletionClient {
    fn name(&self) -> &str {
        "stub"
    }

    fn complete(&self, request: &CompletionRequest) -> BoxFuture<'_, Result<String, LlmError>> {
        self.requests
            .lock()
            .expect("stub request log poisoned")
            .push(request.clone());
        let step = self
            .script
            .lock()
            .expect("stub script poisoned")
            .pop_front()
            .unwrap_or_else(|| Step {
                result: Ok(self.fallback.clone()),
                delay: None,
            });

        Box::pin(async move {
            if let Some(delay) = step.delay {
                tokio::time::sleep(delay).await;
            }
            step.result
        })
    }
}
