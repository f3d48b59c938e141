//! Storefront languages and bilingual text.

use serde::{Deserialize, Serialize};

/// Languages the storefront is published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Serbian (Latin script), the default storefront language.
    #[default]
    Sr,
    /// English.
    En,
}

impl Language {
    /// Two-letter language code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Sr => "sr",
            Self::En => "en",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sr" | "sr-latn" | "rs" => Ok(Self::Sr),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Text available in both storefront languages.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalizedText {
    pub sr: String,
    pub en: String,
}

impl LocalizedText {
    /// Create bilingual text.
    #[must_use]
    pub fn new(sr: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            sr: sr.into(),
            en: en.into(),
        }
    }

    /// Use the same text for both languages (titles, proper names).
    #[must_use]
    pub fn same(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            sr: text.clone(),
            en: text,
        }
    }

    /// Get the text for a language.
    #[must_use]
    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::Sr => &self.sr,
            Language::En => &self.en,
        }
    }
}
