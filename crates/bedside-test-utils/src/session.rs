//! Session fixtures.

use std::sync::Arc;

use bedside_config::AppConfig;
use bedside_core::{CompletionClient, PersonaSpec, SessionService, SessionSettings};

use crate::stub::StubCompletionClient;

/// Build a session over `stub` from `config`.
///
/// Returns the stub handle too so tests can inspect recorded requests.
pub fn test_session(
    config: &AppConfig,
    stub: StubCompletionClient,
) -> (SessionService, Arc<StubCompletionClient>) {
    let stub = Arc::new(stub);
    let persona = PersonaSpec::from_config(&config.persona).expect("invalid test persona");
    let client: Arc<dyn CompletionClient> = stub.clone();
    let session = SessionService::new(persona, client, SessionSettings::from_config(config));
    (session, stub)
}
