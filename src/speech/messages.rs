use crate::speech::ProfanityPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Session announcement published when a recognizer connects
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionOpenMessage {
    pub session_id: String,
    pub recognition_locale: String,
    pub target_locales: Vec<String>,
    pub profanity: ProfanityPolicy,
    pub region: String,
    pub timestamp: String, // RFC3339 timestamp
}

/// Audio frame published to the gateway
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded i16 PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Partial translation result received from the speech service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranslationResultMessage {
    pub session_id: String,
    pub offset_ms: u64,
    pub text: String,
    /// Translations keyed by target locale; may lag behind `text`
    #[serde(default)]
    pub translations: HashMap<String, String>,
    pub partial: bool,
    /// Set when the service aborted the stream
    #[serde(default)]
    pub error: Option<String>,
}
