//! Runtime configuration.
//!
//! Settings come from an optional TOML file, then environment variables override the
//! service credentials. The resulting `AppConfig` is handed to each component
//! explicitly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::document::DEFAULT_NOTETYPE;

pub const DEFAULT_CONFIG_FILE: &str = "vocab-cards.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrConfig,
    pub translator: TranslatorConfig,
    pub parser: ParserConfig,
    pub validation: ValidationConfig,
    pub deck: DeckConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
    pub timeout_secs: u64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            api_version: "2023-10-01".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Required by the service for regional (non-global) resources.
    pub region: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.cognitive.microsofttranslator.com".to_string(),
            api_key: String::new(),
            region: None,
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ParserConfig {
    /// Fraction of the page width a line may start right of the leftmost line and still
    /// count as left column.
    pub column_tolerance: f64,
    /// Longest term accepted, in characters.
    pub max_term_len: usize,
    /// Header lines to drop in addition to the language profile.
    pub extra_headers: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            column_tolerance: 0.12,
            max_term_len: 45,
            extra_headers: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationConfig {
    pub threshold: f64,
    pub source_lang: String,
    pub target_lang: String,
    pub request_delay_ms: u64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            threshold: 0.3,
            source_lang: "en".to_string(),
            target_lang: "de".to_string(),
            request_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeckConfig {
    pub notetype: String,
    pub html: bool,
    /// Attached to every entry, e.g. `English::Unit-1`.
    pub tags: Vec<String>,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            notetype: DEFAULT_NOTETYPE.to_string(),
            html: false,
            tags: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub translation_memory: PathBuf,
    pub vocabulary_db: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            translation_memory: PathBuf::from("translation_memory.json"),
            vocabulary_db: PathBuf::from("vocabulary_db.json"),
        }
    }
}

/// Loads `.env.local`, then `.env`, from the working directory if present.
pub fn load_dotenv() {
    for env_file in [".env.local", ".env"] {
        let path = Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => log::debug!("[CONFIG] loaded {}", path.display()),
                Err(e) => log::warn!("[CONFIG] failed to load {}: {}", path.display(), e),
            }
            break;
        }
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Explicit path must exist; otherwise the default file is used when present.
pub fn resolve(explicit: Option<&Path>) -> Result<AppConfig> {
    let mut config = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(CoreError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            load_config(path)?
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                load_config(default_path)?
            } else {
                AppConfig::default()
            }
        }
    };

    config.apply_env(|key| std::env::var(key).ok());
    Ok(config)
}

impl AppConfig {
    /// Overrides credentials from the environment; `lookup` is injectable for tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("AZURE_VISION_ENDPOINT") {
            self.ocr.endpoint = v;
        }
        if let Some(v) = non_empty("AZURE_VISION_KEY") {
            self.ocr.api_key = v;
        }
        if let Some(v) = non_empty("AZURE_TRANSLATOR_ENDPOINT") {
            self.translator.endpoint = v;
        }
        if let Some(v) = non_empty("AZURE_TRANSLATOR_KEY") {
            self.translator.api_key = v;
        }
        if let Some(v) = non_empty("AZURE_TRANSLATOR_REGION") {
            self.translator.region = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.validation.threshold, 0.3);
        assert_eq!(config.deck.notetype, "Einfach (beide Richtungen)");
        assert!(!config.deck.html);
        assert!(config.ocr.api_key.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[validation]
threshold = 0.45
target_lang = "fr"

[deck]
tags = ["English::Unit-1"]
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.validation.threshold, 0.45);
        assert_eq!(config.validation.target_lang, "fr");
        assert_eq!(config.validation.source_lang, "en");
        assert_eq!(config.deck.tags, vec!["English::Unit-1".to_string()]);
        assert_eq!(config.parser.max_term_len, 45);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[validation\nthreshold = ").unwrap();
        assert!(matches!(load_config(file.path()), Err(CoreError::Toml(_))));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = resolve(Some(Path::new("/definitely/not/here.toml")));
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_env_overrides_credentials() {
        let env: HashMap<&str, &str> = [
            ("AZURE_VISION_ENDPOINT", "https://vision.example.com"),
            ("AZURE_VISION_KEY", "vision-key"),
            ("AZURE_TRANSLATOR_KEY", "translator-key"),
            ("AZURE_TRANSLATOR_REGION", "westeurope"),
            ("AZURE_TRANSLATOR_ENDPOINT", ""),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.ocr.endpoint, "https://vision.example.com");
        assert_eq!(config.ocr.api_key, "vision-key");
        assert_eq!(config.translator.api_key, "translator-key");
        assert_eq!(config.translator.region.as_deref(), Some("westeurope"));
        // empty values do not clobber defaults
        assert_eq!(
            config.translator.endpoint,
            "https://api.cognitive.microsofttranslator.com"
        );
    }
}
