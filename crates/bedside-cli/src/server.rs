//! HTTP front door: axum router over a TCP listener.
//!
//! Thin JSON layer over [`SessionRegistry`]; every route resolves a session
//! and calls straight into the core.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use bedside_config::ServerConfig;
use bedside_core::{SessionError, SessionRegistry};

/// Shared state accessible to all route handlers.
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResetResponse {
    pub reset: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Build the axum router with all routes and the CORS policy.
pub fn router(state: Arc<AppState>, allowed_origin: Option<&str>) -> anyhow::Result<axum::Router> {
    Ok(axum::Router::new()
        .route("/", get(handle_health))
        .route("/response", post(handle_response))
        .route("/reset", post(handle_reset))
        .with_state(state)
        .layer(cors_layer(allowed_origin)?)
        .layer(TraceLayer::new_for_http()))
}

/// Restrict cross-origin access to `allowed_origin`, or allow any origin.
fn cors_layer(allowed_origin: Option<&str>) -> anyhow::Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    Ok(match allowed_origin {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .with_context(|| format!("invalid allowed origin: {origin:?}"))?;
            layer.allow_origin(origin)
        }
        None => layer.allow_origin(Any),
    })
}

/// Bind `listen_addr:port` and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state, config.allowed_origin.as_deref())?;
    let addr: SocketAddr = format!("{}:{}", config.listen_addr, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.listen_addr, config.port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, origin = ?config.allowed_origin, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("HTTP server shutting down");
        })
        .await?;
    Ok(())
}

// ── Route handlers ──────────────────────────────────────────────────────

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Health check".to_string(),
    })
}

async fn handle_response(
    State(state): State<Arc<AppState>>,
    Json(req): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let session = state.registry.get_or_create(req.session_id.as_deref());
    match session.handle(&req.query).await {
        Ok(reply) => Ok(Json(QueryResponse {
            response: reply.render(),
        })),
        Err(SessionError::EmptyInput) => Err(error(StatusCode::BAD_REQUEST, "query must not be empty")),
        Err(e) => {
            warn!(error = %e, session = ?req.session_id, "query failed");
            Err(error(StatusCode::INTERNAL_SERVER_ERROR, "An error occurred"))
        }
    }
}

async fn handle_reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> Json<ResetResponse> {
    // Unknown sessions have no history; the reset is still satisfied.
    let existed = state.registry.reset(req.session_id.as_deref()).await;
    info!(session = ?req.session_id, existed, "session reset");
    Json(ResetResponse { reset: true })
}

fn error(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}
