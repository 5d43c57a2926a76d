//! Session registry: maps caller-chosen session ids to live sessions.
//!
//! Sessions are created lazily on first use and share one completion client,
//! persona and settings. When the registry is full the oldest-created session
//! is dropped to make room.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info};

use crate::llm::CompletionClient;
use crate::persona::PersonaSpec;
use crate::session::{SessionService, SessionSettings};

/// Id used when a caller does not name a session.
pub const DEFAULT_SESSION: &str = "default";

#[derive(Default)]
struct Sessions {
    by_id: HashMap<String, Arc<SessionService>>,
    /// Ids in creation order, oldest first.
    order: VecDeque<String>,
}

pub struct SessionRegistry {
    client: Arc<dyn CompletionClient>,
    persona: PersonaSpec,
    settings: SessionSettings,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl SessionRegistry {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        persona: PersonaSpec,
        settings: SessionSettings,
        max_sessions: usize,
    ) -> Self {
        Self {
            client,
            persona,
            settings,
            max_sessions: max_sessions.max(1),
            sessions: Mutex::new(Sessions::default()),
        }
    }

    /// Return the session for `id`, creating it if needed.
    ///
    /// `None` and blank ids resolve to [`DEFAULT_SESSION`].
    pub fn get_or_create(&self, id: Option<&str>) -> Arc<SessionService> {
        let id = resolve(id);
        let mut sessions = self.lock();
        if let Some(session) = sessions.by_id.get(id) {
            return Arc::clone(session);
        }

        while sessions.by_id.len() >= self.max_sessions {
            let Some(oldest) = sessions.order.pop_front() else {
                break;
            };
            sessions.by_id.remove(&oldest);
            info!(session = %oldest, "evicted oldest session");
        }

        let session = Arc::new(SessionService::new(
            self.persona.clone(),
            Arc::clone(&self.client),
            self.settings.clone(),
        ));
        sessions.by_id.insert(id.to_string(), Arc::clone(&session));
        sessions.order.push_back(id.to_string());
        debug!(session = %id, total = sessions.by_id.len(), "session created");
        session
    }

    /// Look up an existing session without creating one.
    pub fn get(&self, id: Option<&str>) -> Option<Arc<SessionService>> {
        self.lock().by_id.get(resolve(id)).cloned()
    }

    /// Clear the history of `id`. Returns `false` if no such session exists.
    pub async fn reset(&self, id: Option<&str>) -> bool {
        match self.get(id) {
            Some(session) => {
                session.reset().await;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn persona(&self) -> &PersonaSpec {
        &self.persona
    }

    fn lock(&self) -> MutexGuard<'_, Sessions> {
        // Critical sections never panic midway; a poisoned map is still valid.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn resolve(id: Option<&str>) -> &str {
    match id.map(str::trim) {
        Some(id) if !id.is_empty() => id,
        _ => DEFAULT_SESSION,
    }
}
