pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod language;
pub mod session;
pub mod speech;

pub use audio::{AudioCaptureHandle, AudioFrame, AudioInput, CaptureConfig, DefaultMicrophone};
pub use config::Config;
pub use error::SessionError;
pub use http::{create_router, AppState};
pub use language::{Language, LanguagePair};
pub use session::{RecognitionSession, SessionController, SessionPhase, SessionSnapshot};
pub use speech::{
    Credential, GatewaySpeechClient, ProfanityPolicy, RecognitionEvent, Recognizer, SpeechClient,
    TranslationSessionConfig,
};
