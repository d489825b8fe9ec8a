//! Recognition session lifecycle
//!
//! This module owns the only real invariants in the system:
//! - at most one recognition session is live at a time
//! - a session's microphone handle is released before its replacement
//!   acquires one
//! - partial-result events from a superseded session never reach the
//!   visible state

mod controller;
mod session;

pub use controller::{SessionController, SessionSnapshot};
pub use session::{RecognitionSession, SessionPhase};
