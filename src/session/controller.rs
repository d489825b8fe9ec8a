use super::session::{RecognitionSession, SessionPhase};
use crate::audio::AudioInput;
use crate::error::SessionError;
use crate::language::Language;
use crate::speech::{Credential, RecognitionEvent, SpeechClient};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info};

/// Controller-visible state, serialized on the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub source_language: Language,
    pub source_glyph: &'static str,
    pub target_language: Language,
    pub target_glyph: &'static str,
    pub source_text: String,
    pub target_text: String,
    pub last_offset_ms: Option<u64>,
    pub running: bool,
}

struct Inner {
    source: Language,
    target: Language,
    source_text: String,
    target_text: String,
    last_offset_ms: Option<u64>,
    running: bool,
    session: Option<RecognitionSession>,
}

/// Orchestrates the session lifecycle in response to user intents (start,
/// stop, swap languages) and owns the externally visible state.
///
/// All transitions serialize on one mutex; partial-result events arrive from
/// the per-session pump task and are applied only after their session id
/// matches the current slot, so late events from a superseded session are
/// dropped rather than resurrecting stale text.
pub struct SessionController {
    client: Arc<dyn SpeechClient>,
    audio: Arc<dyn AudioInput>,
    credential: Credential,
    inner: Arc<Mutex<Inner>>,
    next_session_id: AtomicU64,
}

impl SessionController {
    /// The registry never offers translating a language to itself, so a
    /// controller with `source == target` is a construction bug.
    pub fn new(
        client: Arc<dyn SpeechClient>,
        audio: Arc<dyn AudioInput>,
        credential: Credential,
        source: Language,
        target: Language,
    ) -> Self {
        assert!(source != target, "source and target language must differ");

        Self {
            client,
            audio,
            credential,
            inner: Arc::new(Mutex::new(Inner {
                source,
                target,
                source_text: String::new(),
                target_text: String::new(),
                last_offset_ms: None,
                running: false,
                session: None,
            })),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Tear down any current session and load a fresh `Idle` one for the
    /// current language pair. On failure the session slot is left empty and
    /// the error is surfaced to the caller.
    pub async fn reload(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;
        self.load_locked(&mut inner).await
    }

    /// Begin streaming on the current `Idle` session and clear prior partial
    /// text. A controller that is already running is left untouched; an
    /// empty session slot (after a failed load or stream error) is
    /// `SessionClosed`.
    pub async fn start(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        if inner.running {
            return Ok(());
        }

        let session = inner
            .session
            .as_mut()
            .ok_or(SessionError::SessionClosed)?;
        session.start().await?;

        inner.running = true;
        clear_text(&mut inner);

        info!("Translation started");
        Ok(())
    }

    /// Tear down the current session, clear visible text, then immediately
    /// re-arm with a fresh `Idle` session for the same pair so the next
    /// start has no load latency.
    pub async fn stop(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        self.teardown_locked(&mut inner).await;
        clear_text(&mut inner);

        info!("Translation stopped");

        self.load_locked(&mut inner).await
    }

    /// Stop the current session, exchange source and target roles, and load
    /// a session for the swapped pair. The old session's microphone handle
    /// is released before the new one is acquired.
    pub async fn swap(&self) -> Result<(), SessionError> {
        let mut inner = self.inner.lock().await;

        self.teardown_locked(&mut inner).await;
        clear_text(&mut inner);

        let inner_ref = &mut *inner;
        std::mem::swap(&mut inner_ref.source, &mut inner_ref.target);

        info!(
            "Languages swapped: {:?} -> {:?}",
            inner.source, inner.target
        );

        self.load_locked(&mut inner).await
    }

    /// Current visible state.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;

        SessionSnapshot {
            source_language: inner.source,
            source_glyph: inner.source.pair().glyph,
            target_language: inner.target,
            target_glyph: inner.target.pair().glyph,
            source_text: inner.source_text.clone(),
            target_text: inner.target_text.clone(),
            last_offset_ms: inner.last_offset_ms,
            running: inner.running,
        }
    }

    /// Phase of the session currently in the slot, if any.
    pub async fn session_phase(&self) -> Option<SessionPhase> {
        let inner = self.inner.lock().await;
        inner.session.as_ref().map(|s| s.phase())
    }

    async fn teardown_locked(&self, inner: &mut Inner) {
        if let Some(mut session) = inner.session.take() {
            session.stop().await;
        }
        inner.running = false;
    }

    async fn load_locked(&self, inner: &mut Inner) -> Result<(), SessionError> {
        // Complete teardown of the old session before acquiring anything for
        // the new one; two live microphone handles trip a platform-level
        // device-busy failure.
        self.teardown_locked(inner).await;

        let id = self.next_session_id.fetch_add(1, Ordering::SeqCst);

        let (session, events) = RecognitionSession::load(
            id,
            inner.source,
            inner.target,
            self.credential.clone(),
            Arc::clone(&self.audio),
            self.client.as_ref(),
        )
        .await?;

        let target_locale = inner.target.pair().translation_target.to_string();
        inner.session = Some(session);

        tokio::spawn(pump_events(
            Arc::clone(&self.inner),
            id,
            target_locale,
            events,
        ));

        Ok(())
    }
}

fn clear_text(inner: &mut Inner) {
    inner.source_text.clear();
    inner.target_text.clear();
    inner.last_offset_ms = None;
}

/// Apply a session's recognition events to the shared state until the
/// stream ends or the session is superseded.
async fn pump_events(
    inner: Arc<Mutex<Inner>>,
    session_id: u64,
    target_locale: String,
    mut events: mpsc::Receiver<RecognitionEvent>,
) {
    while let Some(event) = events.recv().await {
        let mut state = inner.lock().await;

        let current = state.session.as_ref().map(|s| s.id());
        if current != Some(session_id) {
            // Superseded by a later load; nothing from this session may be
            // observed any more.
            break;
        }

        match event {
            RecognitionEvent::Partial {
                offset_ms,
                text,
                translations,
            } => {
                if !state.running {
                    continue;
                }

                state.source_text = text;
                // An absent entry means no translation yet for this partial
                state.target_text = translations
                    .get(&target_locale)
                    .cloned()
                    .unwrap_or_default();
                state.last_offset_ms = Some(offset_ms);
            }

            RecognitionEvent::Error { message } => {
                error!("Session {} stream failed: {}", session_id, message);

                if let Some(mut session) = state.session.take() {
                    session.stop().await;
                }
                state.running = false;
                clear_text(&mut state);
                break;
            }
        }
    }
}
