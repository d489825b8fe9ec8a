use crate::error::SessionError;
use crate::language::LanguagePair;
use serde::{Deserialize, Serialize};

/// Subscription credential for the remote speech service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub key: String,
    pub region: String,
}

/// How the recognizer treats profanity in transcripts. Sessions always run
/// masked; the other variants exist because the wire format carries them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfanityPolicy {
    #[default]
    Masked,
    Raw,
    Removed,
}

/// Per-session recognizer configuration: one recognition locale, one
/// translation target, masked profanity, and the credential that authorizes
/// the connection.
///
/// Built fresh for every session load and owned by the session that consumes
/// it; discarded on teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationSessionConfig {
    pub recognition_locale: String,
    pub target_locale: String,
    pub profanity: ProfanityPolicy,
    pub credential: Credential,
}

impl TranslationSessionConfig {
    /// Deterministic given its inputs. Fails with `MissingCredential` when
    /// the key or region is empty, so a session is never started with a
    /// config the service would reject asynchronously.
    pub fn build(
        source: &LanguagePair,
        target: &LanguagePair,
        credential: Credential,
    ) -> Result<Self, SessionError> {
        if credential.key.is_empty() {
            return Err(SessionError::MissingCredential("subscription key"));
        }
        if credential.region.is_empty() {
            return Err(SessionError::MissingCredential("region"));
        }

        Ok(Self {
            recognition_locale: source.recognition_locale.to_string(),
            target_locale: target.translation_target.to_string(),
            profanity: ProfanityPolicy::Masked,
            credential,
        })
    }
}
