use crate::language::Language;
use crate::speech::Credential;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Remote speech service settings. Key and region are credentials sourced
/// from the environment (`LIVE_TRANSLATE_SPEECH__KEY`,
/// `LIVE_TRANSLATE_SPEECH__REGION`); empty values surface as
/// `MissingCredential` when a session is built, not as a load failure here.
#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub region: String,
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,
    #[serde(default = "default_source_language")]
    pub source_language: Language,
    #[serde(default = "default_target_language")]
    pub target_language: Language,
}

fn default_service_name() -> String {
    "live-translate".to_string()
}

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_gateway_url() -> String {
    "nats://localhost:4222".to_string()
}

fn default_source_language() -> Language {
    Language::En
}

fn default_target_language() -> Language {
    Language::Id
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            http: HttpConfig::default(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            region: String::new(),
            gateway_url: default_gateway_url(),
            source_language: default_source_language(),
            target_language: default_target_language(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LIVE_TRANSLATE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn credential(&self) -> Credential {
        Credential {
            key: self.speech.key.clone(),
            region: self.speech.region.clone(),
        }
    }
}
