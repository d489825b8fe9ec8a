use crate::audio::{AudioCaptureHandle, AudioInput};
use crate::error::SessionError;
use crate::language::Language;
use crate::speech::{Credential, RecognitionEvent, Recognizer, SpeechClient, TranslationSessionConfig};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Lifecycle phase of a recognition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Resources acquired, not streaming
    Idle,
    /// Recognizer actively sending audio and receiving partials
    Running,
    /// Terminal; all resources released
    Closed,
}

/// One recognition session: a recognizer bound to one microphone handle and
/// one session config, for one source/target language pair.
///
/// Sessions are tagged with a monotonically increasing id so the controller
/// can discard partial events that arrive after the session was superseded.
///
/// A stalled stream that never calls back leaves the session `Running` until
/// the user stops it; there is no watchdog beyond the service's own network
/// timeout.
pub struct RecognitionSession {
    id: u64,
    source: Language,
    target: Language,
    capture: AudioCaptureHandle,
    recognizer: Box<dyn Recognizer>,
    phase: SessionPhase,
}

impl RecognitionSession {
    /// Build a fresh session in `Idle`: validate the credential into a
    /// session config, acquire the default microphone, connect the
    /// recognizer, and hand back its event stream.
    ///
    /// Credential or device failure aborts before any streaming starts; the
    /// partially acquired resources are dropped (and with them, released).
    pub async fn load(
        id: u64,
        source: Language,
        target: Language,
        credential: Credential,
        audio: Arc<dyn AudioInput>,
        client: &dyn SpeechClient,
    ) -> Result<(Self, mpsc::Receiver<RecognitionEvent>), SessionError> {
        let config =
            TranslationSessionConfig::build(source.pair(), target.pair(), credential)?;

        // Device binding can take a while on some hosts; keep it off the
        // async workers.
        let mut capture = tokio::task::spawn_blocking(move || audio.open())
            .await
            .map_err(|e| SessionError::DeviceUnavailable(format!("capture setup task: {}", e)))??;

        let mut recognizer = client.connect(config, &mut capture).await?;

        let events = recognizer
            .events()
            .ok_or_else(|| SessionError::StreamError("recognizer has no event stream".into()))?;

        info!(
            "Loaded recognition session {} ({:?} -> {:?}) on {}",
            id,
            source,
            target,
            capture.device_name()
        );

        Ok((
            Self {
                id,
                source,
                target,
                capture,
                recognizer,
                phase: SessionPhase::Idle,
            },
            events,
        ))
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn source(&self) -> Language {
        self.source
    }

    pub fn target(&self) -> Language {
        self.target
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Begin continuous streaming. No-op when already `Running`; fails with
    /// `SessionClosed` on a torn-down session.
    pub async fn start(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::Closed => Err(SessionError::SessionClosed),
            SessionPhase::Running => {
                warn!("Session {} already running", self.id);
                Ok(())
            }
            SessionPhase::Idle => {
                self.recognizer.start().await?;
                self.phase = SessionPhase::Running;
                info!("Session {} running", self.id);
                Ok(())
            }
        }
    }

    /// Halt streaming and release everything: recognizer, then microphone.
    /// Idempotent, and never raises — a stream that already ended remotely
    /// is logged and swallowed.
    pub async fn stop(&mut self) {
        if self.phase == SessionPhase::Closed {
            return;
        }

        // Release the microphone before waiting on the recognizer: closing
        // the frame channel lets its audio plumbing drain out even when the
        // device has stopped delivering callbacks.
        self.capture.release();

        if let Err(e) = self.recognizer.stop().await {
            warn!("Session {} recognizer stop: {}", self.id, e);
        }
        if let Err(e) = self.recognizer.close().await {
            warn!("Session {} recognizer close: {}", self.id, e);
        }

        self.phase = SessionPhase::Closed;

        info!("Session {} closed", self.id);
    }
}
