use serde::{Deserialize, Serialize};

/// Supported languages.
///
/// Adding a language means adding a variant here and a row in [`Language::pair`];
/// consumers only ever index by identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Id,
}

/// Fixed per-language data: the locale the recognizer listens in, the target
/// code translations come back under, and the glyph shown next to the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePair {
    /// Speech recognition locale (e.g. "en-us")
    pub recognition_locale: &'static str,
    /// Translation target code (e.g. "en") — the key in the server's
    /// translation map
    pub translation_target: &'static str,
    /// Display glyph for the UI
    pub glyph: &'static str,
}

static EN: LanguagePair = LanguagePair {
    recognition_locale: "en-us",
    translation_target: "en",
    glyph: "\u{1F1FA}\u{1F1F8}",
};

static ID: LanguagePair = LanguagePair {
    recognition_locale: "id-id",
    translation_target: "id",
    glyph: "\u{1F1EE}\u{1F1E9}",
};

impl Language {
    pub const ALL: &'static [Language] = &[Language::En, Language::Id];

    /// Registry lookup. Pure, infallible; the table is defined at process
    /// start and never mutated.
    pub fn pair(self) -> &'static LanguagePair {
        match self {
            Language::En => &EN,
            Language::Id => &ID,
        }
    }
}
