use serde::{Deserialize, Serialize};

/// One cached answer of the translation service.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TmEntry {
    pub source_lang: String,
    pub target_lang: String,

    pub original: String,
    pub translation: String,

    /// Filled on load when an older file lacks it.
    #[serde(default)]
    pub normalized: String,
    #[serde(default)]
    pub hash: String,
}

impl TmEntry {
    pub fn new(source_lang: &str, target_lang: &str, original: &str, translation: &str) -> Self {
        let normalized = super::normalize::normalize(original);
        let hash = super::hash::hash_norm(&normalized);
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            original: original.trim().to_string(),
            translation: translation.trim().to_string(),
            normalized,
            hash,
        }
    }
}
