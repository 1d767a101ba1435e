//! Translation Validator: re-translates each source term and annotates entries
//! whose stored translation disagrees with the service.

use std::thread;
use std::time::Duration;

use crate::config::ValidationConfig;
use crate::model::document::OutputDocument;
use crate::model::entry::VocabularyEntry;

use super::similarity;
use super::translation_memory::TranslationMemory;
use super::translator::Translator;

const MIN_FIELD_CHARS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Valid {
        alternative: String,
        similarity: f64,
    },
    Suspicious {
        alternative: Option<String>,
        similarity: f64,
        reason: String,
    },
    Error {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntryResult {
    pub source_term: String,
    pub translation: String,
    pub outcome: ValidationOutcome,
    /// Whether the stored translation occurs in the raw OCR text; `None` without one.
    pub in_raw_text: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationRun {
    /// Input document with alternatives filled in for flagged entries.
    pub document: OutputDocument,
    pub results: Vec<EntryResult>,
}

impl ValidationRun {
    pub fn valid(&self) -> impl Iterator<Item = &EntryResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ValidationOutcome::Valid { .. }))
    }

    pub fn suspicious(&self) -> impl Iterator<Item = &EntryResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ValidationOutcome::Suspicious { .. }))
    }

    pub fn errors(&self) -> impl Iterator<Item = &EntryResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, ValidationOutcome::Error { .. }))
    }

    pub fn annotated(&self) -> usize {
        self.document
            .entries
            .iter()
            .filter(|e| e.alternative_translation.is_some())
            .count()
    }
}

pub struct Validator<'a> {
    translator: &'a dyn Translator,
    config: ValidationConfig,
    memory: Option<TranslationMemory>,
}

impl<'a> Validator<'a> {
    pub fn new(
        translator: &'a dyn Translator,
        config: ValidationConfig,
        memory: Option<TranslationMemory>,
    ) -> Self {
        Self {
            translator,
            config,
            memory,
        }
    }

    pub fn validate(&mut self, doc: &OutputDocument, raw_text: Option<&str>) -> ValidationRun {
        let raw_lower = raw_text
            .filter(|t| !t.trim().is_empty())
            .map(str::to_lowercase);
        let total = doc.entries.len();

        let mut entries = Vec::with_capacity(total);
        let mut results = Vec::with_capacity(total);
        let mut calls = 0usize;

        for (i, entry) in doc.entries.iter().enumerate() {
            log::info!("[VALIDATE] [{}/{}] {}", i + 1, total, entry.source_term);

            let mut entry = entry.clone();
            let outcome = self.check(&entry, &mut calls);

            match &outcome {
                ValidationOutcome::Suspicious {
                    alternative: Some(alt),
                    ..
                } => {
                    if similarity::differs(&entry.translation, alt) {
                        entry.alternative_translation = Some(alt.clone());
                    }
                }
                // an earlier annotation no longer applies
                ValidationOutcome::Valid { .. } => entry.alternative_translation = None,
                _ => {}
            }

            results.push(EntryResult {
                source_term: entry.source_term.clone(),
                translation: entry.translation.clone(),
                in_raw_text: raw_lower
                    .as_ref()
                    .map(|raw| raw.contains(&entry.translation.to_lowercase())),
                outcome,
            });
            entries.push(entry);
        }

        if let Some(memory) = self.memory.as_mut() {
            if let Err(e) = memory.save() {
                log::warn!("[TM] failed to save: {e}");
            }
        }

        ValidationRun {
            document: OutputDocument::new(doc.header.clone(), entries),
            results,
        }
    }

    fn check(&mut self, entry: &VocabularyEntry, calls: &mut usize) -> ValidationOutcome {
        let term = entry.source_term.trim();
        let stored = entry.translation.trim();

        if term.chars().count() < MIN_FIELD_CHARS || stored.chars().count() < MIN_FIELD_CHARS {
            return ValidationOutcome::Suspicious {
                alternative: None,
                similarity: 0.0,
                reason: "entry too short".to_string(),
            };
        }

        let answer = match self.lookup_or_translate(term, calls) {
            Ok(a) => a,
            Err(reason) => {
                log::warn!("[VALIDATE] {term}: {reason}");
                return ValidationOutcome::Error { reason };
            }
        };

        let cmp = similarity::compare(stored, &answer, self.config.threshold);
        if cmp.mismatch {
            ValidationOutcome::Suspicious {
                alternative: Some(answer),
                similarity: cmp.similarity,
                reason: format!("Low similarity ({:.2})", cmp.similarity),
            }
        } else {
            ValidationOutcome::Valid {
                alternative: answer,
                similarity: cmp.similarity,
            }
        }
    }

    fn lookup_or_translate(&mut self, term: &str, calls: &mut usize) -> Result<String, String> {
        let (from, to) = (
            self.config.source_lang.as_str(),
            self.config.target_lang.as_str(),
        );

        if let Some(hit) = self.memory.as_ref().and_then(|m| m.lookup(from, to, term)) {
            log::debug!("[TM] hit for {term}");
            return Ok(hit.to_string());
        }

        if *calls > 0 && self.config.request_delay_ms > 0 {
            thread::sleep(Duration::from_millis(self.config.request_delay_ms));
        }
        *calls += 1;

        let answer = self
            .translator
            .translate(term, from, to)
            .map_err(|e| e.to_string())?;

        if let Some(memory) = self.memory.as_mut() {
            memory.insert(from, to, term, &answer);
        }
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, Result};
    use crate::model::document::DeckHeader;
    use std::cell::Cell;
    use std::collections::HashMap;

    struct FakeTranslator {
        answers: HashMap<&'static str, &'static str>,
        calls: Cell<usize>,
    }

    impl FakeTranslator {
        fn new(pairs: &[(&'static str, &'static str)]) -> Self {
            Self {
                answers: pairs.iter().copied().collect(),
                calls: Cell::new(0),
            }
        }
    }

    impl Translator for FakeTranslator {
        fn translate(&self, text: &str, _from: &str, _to: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.answers
                .get(text)
                .map(|a| a.to_string())
                .ok_or(CoreError::Service {
                    status: 503,
                    message: "service unavailable".into(),
                })
        }
    }

    fn config() -> ValidationConfig {
        ValidationConfig {
            request_delay_ms: 0,
            ..ValidationConfig::default()
        }
    }

    fn doc(pairs: &[(&str, &str)]) -> OutputDocument {
        OutputDocument::new(
            DeckHeader::new("English Unit-1", "Einfach (beide Richtungen)"),
            pairs
                .iter()
                .map(|(s, t)| VocabularyEntry::new(*s, *t))
                .collect(),
        )
    }

    #[test]
    fn agreeing_translation_is_valid() {
        let fake = FakeTranslator::new(&[("personality", "Persönlichkeit")]);
        let mut v = Validator::new(&fake, config(), None);

        let run = v.validate(&doc(&[("personality", "Persönlichkeit")]), None);

        assert_eq!(run.valid().count(), 1);
        assert_eq!(run.document.entries[0].alternative_translation, None);
        assert_eq!(run.results[0].in_raw_text, None);
    }

    #[test]
    fn revalidated_entry_drops_old_annotation_when_valid() {
        let fake = FakeTranslator::new(&[("personality", "Persönlichkeit")]);
        let mut v = Validator::new(&fake, config(), None);

        let mut input = doc(&[("personality", "Persönlichkeit")]);
        input.entries[0].alternative_translation = Some("Charakter".into());
        let run = v.validate(&input, None);

        assert_eq!(run.valid().count(), 1);
        assert_eq!(run.annotated(), 0);
        assert_eq!(run.document.entries[0].rendered_translation(), "Persönlichkeit");
    }

    #[test]
    fn disagreement_is_flagged_and_annotated() {
        let fake = FakeTranslator::new(&[("to disagree (with)", "widersprechen")]);
        let mut v = Validator::new(&fake, config(), None);

        let run = v.validate(&doc(&[("to disagree (with)", "anderer Meinung sein")]), None);

        assert_eq!(run.suspicious().count(), 1);
        assert_eq!(run.annotated(), 1);
        assert_eq!(
            run.document.entries[0].rendered_translation(),
            "anderer Meinung sein [Source: widersprechen]"
        );
        match &run.results[0].outcome {
            ValidationOutcome::Suspicious { reason, .. } => assert!(reason.starts_with("Low similarity")),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn service_error_passes_entry_through() {
        let fake = FakeTranslator::new(&[("self", "selbst")]);
        let mut v = Validator::new(&fake, config(), None);

        let input = doc(&[("lad", "Junge"), ("self", "das Selbst")]);
        let run = v.validate(&input, None);

        assert_eq!(run.errors().count(), 1);
        assert_eq!(run.valid().count(), 1);
        assert_eq!(run.document.entries, input.entries);
        assert_eq!(fake.calls.get(), 2);
    }

    #[test]
    fn short_entries_skip_the_service() {
        let fake = FakeTranslator::new(&[]);
        let mut v = Validator::new(&fake, config(), None);

        let run = v.validate(&doc(&[("a", "ein")]), None);

        assert_eq!(fake.calls.get(), 0);
        match &run.results[0].outcome {
            ValidationOutcome::Suspicious {
                alternative, reason, ..
            } => {
                assert!(alternative.is_none());
                assert_eq!(reason, "entry too short");
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(run.annotated(), 0);
    }

    #[test]
    fn memory_hit_avoids_the_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tm.json");
        let mut tm = TranslationMemory::open(&path);
        tm.insert("en", "de", "pot", "Topf");

        let fake = FakeTranslator::new(&[("frying pan", "Bratpfanne")]);
        let mut v = Validator::new(&fake, config(), Some(tm));
        let run = v.validate(&doc(&[("pot", "Topf"), ("frying pan", "Bratpfanne")]), None);

        assert_eq!(run.valid().count(), 2);
        assert_eq!(fake.calls.get(), 1);

        // the new answer was persisted for the next run
        let reopened = TranslationMemory::open(&path);
        assert_eq!(reopened.lookup("en", "de", "frying pan"), Some("Bratpfanne"));
    }

    #[test]
    fn raw_text_presence_is_recorded() {
        let fake = FakeTranslator::new(&[("self", "das Selbst"), ("lad", "Junge")]);
        let mut v = Validator::new(&fake, config(), None);

        let raw = "self [self]\ndas Selbst\nlad\nBursche";
        let run = v.validate(&doc(&[("self", "das Selbst"), ("lad", "Junge")]), Some(raw));

        assert_eq!(run.results[0].in_raw_text, Some(true));
        assert_eq!(run.results[1].in_raw_text, Some(false));
    }
}
