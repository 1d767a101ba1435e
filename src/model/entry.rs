use serde::{Deserialize, Serialize};

/// One flashcard row: the term as printed in the textbook and its translation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct VocabularyEntry {
    pub source_term: String,

    #[serde(default)]
    pub translation: String,

    /// Set by the validator when the translation service disagrees.
    #[serde(default)]
    pub alternative_translation: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl VocabularyEntry {
    pub fn new(source_term: impl Into<String>, translation: impl Into<String>) -> Self {
        Self {
            source_term: source_term.into(),
            translation: translation.into(),
            alternative_translation: None,
            tags: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tags: &[String]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    /// Both sides carry text after trimming.
    pub fn is_complete(&self) -> bool {
        !self.source_term.trim().is_empty() && !self.translation.trim().is_empty()
    }

    /// Translation as it appears on the card, including the validator's suggestion.
    pub fn rendered_translation(&self) -> String {
        match self.alternative_translation.as_deref() {
            Some(alt) if !alt.trim().is_empty() => {
                format!("{} [Source: {}]", self.translation, alt.trim())
            }
            _ => self.translation.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_translation_appends_alternative() {
        let mut e = VocabularyEntry::new("to disagree (with)", "anderer Meinung sein");
        assert_eq!(e.rendered_translation(), "anderer Meinung sein");

        e.alternative_translation = Some("widersprechen".into());
        assert_eq!(
            e.rendered_translation(),
            "anderer Meinung sein [Source: widersprechen]"
        );
    }

    #[test]
    fn blank_alternative_is_not_rendered() {
        let mut e = VocabularyEntry::new("self", "das Selbst");
        e.alternative_translation = Some("  ".into());
        assert_eq!(e.rendered_translation(), "das Selbst");
    }

    #[test]
    fn completeness_requires_both_sides() {
        assert!(VocabularyEntry::new("nature", "Natur").is_complete());
        assert!(!VocabularyEntry::new("nature", " ").is_complete());
        assert!(!VocabularyEntry::new("", "Natur").is_complete());
    }
}
