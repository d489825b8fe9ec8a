use crate::session::SessionController;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The single session controller behind the UI
    pub controller: Arc<SessionController>,
}

impl AppState {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }
}
