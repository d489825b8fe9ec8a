use crate::audio::AudioCaptureHandle;
use crate::error::SessionError;
use crate::speech::TranslationSessionConfig;
use std::collections::HashMap;
use tokio::sync::mpsc;

/// An event pushed by the recognizer while streaming.
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// Incremental transcription/translation update. Superseded by later
    /// partials within the same utterance.
    Partial {
        /// Offset of the recognized audio in the stream, in milliseconds
        offset_ms: u64,
        /// Source-language transcript so far
        text: String,
        /// Translations keyed by target locale. An absent entry means no
        /// translation is available yet for this partial.
        translations: HashMap<String, String>,
    },

    /// Terminal mid-stream failure. No further events follow.
    Error { message: String },
}

/// Factory for recognizers, the seam to the remote service.
#[async_trait::async_trait]
pub trait SpeechClient: Send + Sync {
    /// Open a recognizer bound to the given config and audio input. Takes
    /// the capture handle's frame stream; ownership of the handle itself
    /// stays with the session for teardown.
    async fn connect(
        &self,
        config: TranslationSessionConfig,
        audio: &mut AudioCaptureHandle,
    ) -> Result<Box<dyn Recognizer>, SessionError>;
}

/// A live remote recognition session.
#[async_trait::async_trait]
pub trait Recognizer: Send {
    /// Begin continuous streaming. No-op when already streaming.
    async fn start(&mut self) -> Result<(), SessionError>;

    /// Halt streaming. Idempotent; never errors when the underlying stream
    /// already ended.
    async fn stop(&mut self) -> Result<(), SessionError>;

    /// Tear down the remote session entirely. Idempotent.
    async fn close(&mut self) -> Result<(), SessionError>;

    /// Event stream for this recognizer. One-shot: returns `None` once taken.
    fn events(&mut self) -> Option<mpsc::Receiver<RecognitionEvent>>;
}
