use std::collections::HashSet;

use regex::Regex;

use crate::config::ParserConfig;
use crate::model::entry::VocabularyEntry;
use crate::model::ocr::ExtractionResult;

use super::line_kind::{Language, LineClassifier, LineKind};
use super::quality::EntryFilter;

/// Upper bound on translation lines collected for one term.
const MAX_TRANSLATION_PARTS: usize = 3;

#[derive(Debug)]
enum State {
    AwaitingTerm,
    AwaitingTranslation { term: String, parts: Vec<String> },
}

pub struct VocabularyParser {
    classifier: LineClassifier,
    filter: EntryFilter,
    tags: Vec<String>,
    max_term_len: usize,
    column_split: Regex,
}

impl VocabularyParser {
    pub fn new(language: Language, config: &ParserConfig, tags: &[String]) -> Self {
        Self {
            classifier: LineClassifier::new(language, config),
            filter: EntryFilter::new(language),
            tags: tags.to_vec(),
            max_term_len: config.max_term_len,
            column_split: Regex::new(r"\t+| {2,}").expect("static pattern"),
        }
    }

    /// Entries found on one image. Never fails; unusable input yields nothing.
    pub fn parse(&self, extraction: &ExtractionResult) -> Vec<VocabularyEntry> {
        let kinds = self.classifier.classify(extraction);

        let has_terms = kinds
            .iter()
            .any(|k| matches!(k, LineKind::Term { .. } | LineKind::Pair { .. }));
        let entries = if has_terms {
            self.run(kinds)
        } else {
            self.split_fallback(extraction)
        };

        entries
            .into_iter()
            .filter(VocabularyEntry::is_complete)
            .filter(|e| self.filter.keep(e))
            .map(|e| e.with_tags(&self.tags))
            .collect()
    }

    fn run(&self, kinds: Vec<LineKind>) -> Vec<VocabularyEntry> {
        let mut entries = Vec::new();
        let mut state = State::AwaitingTerm;

        for kind in kinds {
            state = match (state, kind) {
                (current, LineKind::Term { term, inline }) => {
                    flush(current, &mut entries);
                    let parts = inline.map(|t| vec![clean_part(&t)]).unwrap_or_default();
                    State::AwaitingTranslation { term, parts }
                }
                (current, LineKind::Pair { term, translation }) => {
                    flush(current, &mut entries);
                    let parts = vec![clean_part(&translation)];
                    flush(State::AwaitingTranslation { term, parts }, &mut entries);
                    State::AwaitingTerm
                }
                (State::AwaitingTranslation { term, mut parts }, LineKind::Continuation(text)) => {
                    if parts.len() < MAX_TRANSLATION_PARTS && !self.classifier.is_noise(&text) {
                        push_part(&mut parts, &text);
                    }
                    State::AwaitingTranslation { term, parts }
                }
                (current, _) => current,
            };
        }

        flush(state, &mut entries);
        entries
    }

    /// Splits each line on its first tab or run of spaces.
    fn split_fallback(&self, extraction: &ExtractionResult) -> Vec<VocabularyEntry> {
        extraction
            .texts()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.classifier.is_furniture(line))
            .filter_map(|line| {
                let m = self.column_split.find(line)?;
                let term = line[..m.start()].trim();
                let translation = line[m.end()..].trim();
                if term.is_empty() || translation.is_empty() {
                    return None;
                }
                if term.chars().count() > self.max_term_len {
                    return None;
                }
                Some(VocabularyEntry::new(term, translation))
            })
            .collect()
    }
}

fn clean_part(text: &str) -> String {
    text.trim().trim_end_matches(';').trim().to_string()
}

fn push_part(parts: &mut Vec<String>, text: &str) {
    let cleaned = clean_part(text);
    if cleaned.chars().count() < 2 {
        return;
    }

    match parts.last_mut() {
        Some(last) if last.ends_with('-') => {
            last.pop();
            last.push_str(&cleaned);
        }
        _ => parts.push(cleaned),
    }
}

fn flush(state: State, entries: &mut Vec<VocabularyEntry>) {
    if let State::AwaitingTranslation { term, parts } = state {
        let translation = join_parts(&parts);
        if !term.is_empty() && !translation.is_empty() {
            entries.push(VocabularyEntry::new(term, translation));
        }
    }
}

/// Joins translation lines with `; ` and tidies separators and whitespace.
pub fn join_parts(parts: &[String]) -> String {
    let joined = parts.join("; ");
    let mut collapsed = joined.split_whitespace().collect::<Vec<_>>().join(" ");

    while collapsed.contains(";;") || collapsed.contains("; ;") {
        collapsed = collapsed.replace("; ;", ";").replace(";;", ";");
    }

    collapsed.trim_matches(|c: char| c == ';' || c == ' ').to_string()
}

/// Keeps the first entry for each source term, compared case-insensitively.
pub fn dedup_entries(entries: Vec<VocabularyEntry>) -> Vec<VocabularyEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    entries
        .into_iter()
        .filter(|e| seen.insert(e.source_term.trim().to_lowercase()))
        .collect()
}
