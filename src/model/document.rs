use serde::{Deserialize, Serialize};

use super::entry::VocabularyEntry;

pub const DEFAULT_NOTETYPE: &str = "Einfach (beide Richtungen)";
pub const TAB_SEPARATOR: &str = "Tab";

/// Column the tags occupy when any entry carries tags (1-based, as Anki counts).
pub const TAGS_COLUMN: usize = 3;

fn default_separator() -> String {
    TAB_SEPARATOR.to_string()
}

fn default_notetype() -> String {
    DEFAULT_NOTETYPE.to_string()
}

/// Directive block at the top of an import file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct DeckHeader {
    #[serde(default = "default_separator")]
    pub separator: String,

    #[serde(default)]
    pub html: bool,

    #[serde(default)]
    pub deck: String,

    #[serde(default = "default_notetype")]
    pub notetype: String,

    #[serde(default)]
    pub tags_column: Option<usize>,
}

impl Default for DeckHeader {
    fn default() -> Self {
        Self {
            separator: default_separator(),
            html: false,
            deck: String::new(),
            notetype: default_notetype(),
            tags_column: None,
        }
    }
}

impl DeckHeader {
    pub fn new(deck: impl Into<String>, notetype: impl Into<String>) -> Self {
        Self {
            deck: deck.into(),
            notetype: notetype.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct OutputDocument {
    pub header: DeckHeader,
    pub entries: Vec<VocabularyEntry>,
}

impl OutputDocument {
    pub fn new(header: DeckHeader, entries: Vec<VocabularyEntry>) -> Self {
        Self { header, entries }
    }

    pub fn has_tags(&self) -> bool {
        self.entries.iter().any(|e| !e.tags.is_empty())
    }
}
