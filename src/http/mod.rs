//! HTTP control surface for the translation session
//!
//! This module exposes the three user intents and the live text regions:
//! - POST /session/start - begin streaming on the loaded session
//! - POST /session/stop - stop, clear text, re-arm a fresh session
//! - POST /session/swap - exchange source/target languages and reload
//! - GET /session/status - current languages, partial texts, running flag
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
