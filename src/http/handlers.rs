use super::state::AppState;
use crate::error::SessionError;
use crate::session::SessionSnapshot;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use tracing::{error, info};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub status: String,
    #[serde(flatten)]
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_status(e: &SessionError) -> StatusCode {
    match e {
        SessionError::DeviceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::MissingCredential(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SessionError::SessionClosed => StatusCode::CONFLICT,
        SessionError::StreamError(_) => StatusCode::BAD_GATEWAY,
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "live-translate",
    }))
}

/// POST /session/start
/// Begin streaming on the loaded session
pub async fn start_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("Start requested");

    if let Err(e) = state.controller.start().await {
        error!("Failed to start session: {}", e);
        return (
            error_status(&e),
            Json(ErrorResponse {
                error: format!("Failed to start session: {}", e),
            }),
        )
            .into_response();
    }

    session_response("started", &state).await
}

/// POST /session/stop
/// Stop streaming, clear text, and re-arm a fresh session for the same pair
pub async fn stop_session(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop requested");

    if let Err(e) = state.controller.stop().await {
        // Teardown itself succeeded; only the re-arm load can fail here
        error!("Failed to re-arm session after stop: {}", e);
        return (
            error_status(&e),
            Json(ErrorResponse {
                error: format!("Stopped, but reloading the session failed: {}", e),
            }),
        )
            .into_response();
    }

    session_response("stopped", &state).await
}

/// POST /session/swap
/// Exchange source and target languages and load a session for the new pair
pub async fn swap_languages(State(state): State<AppState>) -> impl IntoResponse {
    info!("Language swap requested");

    if let Err(e) = state.controller.swap().await {
        error!("Failed to swap languages: {}", e);
        return (
            error_status(&e),
            Json(ErrorResponse {
                error: format!("Failed to swap languages: {}", e),
            }),
        )
            .into_response();
    }

    session_response("swapped", &state).await
}

/// GET /session/status
/// Current languages, glyphs, partial texts, and running flag
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.controller.snapshot().await;
    Json(snapshot).into_response()
}

async fn session_response(status: &str, state: &AppState) -> axum::response::Response {
    let snapshot = state.controller.snapshot().await;
    (
        StatusCode::OK,
        Json(SessionResponse {
            status: status.to_string(),
            snapshot,
        }),
    )
        .into_response()
}
