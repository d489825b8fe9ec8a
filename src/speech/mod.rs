//! Narrow client interface to the remote speech translation service.
//!
//! The cloud recognizer is an external collaborator; this module only knows
//! how to build a per-session configuration, open a recognizer over the
//! gateway transport, and deliver its partial-result events.

pub mod client;
pub mod config;
pub mod gateway;
pub mod messages;

pub use client::{RecognitionEvent, Recognizer, SpeechClient};
pub use config::{Credential, ProfanityPolicy, TranslationSessionConfig};
pub use gateway::GatewaySpeechClient;
pub use messages::{AudioFrameMessage, SessionOpenMessage, TranslationResultMessage};
