//! Drops parsed pairs that are OCR debris rather than vocabulary.

use regex::Regex;

use crate::model::entry::VocabularyEntry;

use super::line_kind::Language;

/// Words that are spelled the same in English and German.
const LOANWORDS: &[&str] = &[
    "digital", "cover", "image", "college", "trainer", "content", "communication", "blond",
    "argument", "international", "normal", "social", "personal", "original", "formal",
    "central", "natural", "total", "final", "global", "local", "legal", "vital", "mental",
    "dental", "fatal", "brutal", "neutral", "tribal",
];

const GERMAN_WORDS: &[&str] = &["sein", "haben", "nicht", "und", "oder", "mit", "sich"];
const GERMAN_COMPOUND_STEMS: &[&str] = &["familie", "schule", "haus", "zeit", "wort", "tag", "buch"];

const CUT_OFF_ENDINGS: &[&str] = &["-", " eine", " ein", " im"];
const USAGE_NOTES: &[&str] = &["(inv.)", "invariable", "bedeutet"];
const GERMAN_TERM_OPENERS: &[&str] = &["ein ", "eine ", "der ", "die ", "das "];
const SENTENCE_STARTERS: &[&str] = &[
    "Ich ", "Wir ", "Du ", "Er ", "Sie ", "Es ", "Da ist", "Auf geht", "Hast ", "Wartest ",
    "Was ", "Wie ", "Wann ", "Wo ",
];
const SENTENCE_FRAGMENTS: &[&str] = &[
    "haben wir", "gibt kein", "gibt es", "man sieht", "gehen wir", "qu'est",
];
const BARE_ARTICLES: &[&str] = &["ang", "der", "die", "das", "ein", "eine"];

const MAX_TRANSLATION_CHARS: usize = 50;

pub struct EntryFilter {
    language: Language,
    english_sentence: Regex,
    trailing_english: Regex,
}

impl EntryFilter {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            english_sentence: Regex::new(r"\b(Nobody|Jack|I|We|They|He|She)\s+(was|were|am|is|are)\b")
                .expect("static pattern"),
            trailing_english: Regex::new(r"[A-Z][a-z]+\s+[a-z]+\s+[a-z]+\.?$").expect("static pattern"),
        }
    }

    pub fn keep(&self, entry: &VocabularyEntry) -> bool {
        match self.rejection(entry) {
            Some(reason) => {
                log::debug!("[PARSE] dropped {:?}: {reason}", entry.source_term);
                false
            }
            None => true,
        }
    }

    /// Why an entry is dropped, or `None` when it stays.
    pub fn rejection(&self, entry: &VocabularyEntry) -> Option<&'static str> {
        let term = entry.source_term.trim();
        let translation = entry.translation.trim();

        match self.language {
            Language::English => self.english_rejection(term, translation),
            Language::French => french_term_rejection(term)
                .or_else(|| translation_rejection(translation)),
            Language::German => translation_rejection(translation),
        }
    }

    fn english_rejection(&self, term: &str, translation: &str) -> Option<&'static str> {
        if looks_german(term) {
            return Some("term looks German");
        }
        if is_german_compound(term) {
            return Some("term is a German compound");
        }

        let lower = term.to_lowercase();
        if lower == translation.to_lowercase() && !LOANWORDS.contains(&lower.as_str()) {
            return Some("translation repeats the term");
        }
        if starts_uppercase(term) && term.contains('.') && term.chars().count() > 30 {
            return Some("term is a sentence");
        }
        if self.english_sentence.is_match(translation) {
            return Some("translation is an English sentence");
        }
        if translation.starts_with("to ")
            && translation.contains(" - ")
            && translation.matches('-').count() == 1
        {
            return Some("translation is an English paraphrase");
        }
        if self.trailing_english.is_match(translation) && translation.chars().count() > 30 {
            return Some("translation ends in English text");
        }
        None
    }
}

fn french_term_rejection(term: &str) -> Option<&'static str> {
    GERMAN_TERM_OPENERS
        .iter()
        .any(|p| term.starts_with(p))
        .then_some("term looks German")
}

/// Shape checks for translations read off French or German pages.
fn translation_rejection(translation: &str) -> Option<&'static str> {
    if CUT_OFF_ENDINGS.iter().any(|e| translation.ends_with(e)) {
        return Some("translation is cut off");
    }
    if USAGE_NOTES.iter().any(|n| translation.contains(n)) {
        return Some("translation is a usage note");
    }
    if translation.chars().count() > MAX_TRANSLATION_CHARS {
        return Some("translation too long");
    }
    if translation.contains('?') {
        return Some("translation is a question");
    }
    if SENTENCE_STARTERS.iter().any(|s| translation.starts_with(s)) {
        return Some("translation is a sentence");
    }
    let lower = translation.to_lowercase();
    if SENTENCE_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return Some("translation is an example sentence");
    }
    if BARE_ARTICLES.contains(&translation) {
        return Some("translation is a fragment");
    }
    None
}

fn starts_uppercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_uppercase)
}

fn looks_german(text: &str) -> bool {
    if text.chars().any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß' | 'Ä' | 'Ö' | 'Ü')) {
        return true;
    }
    let lower = text.to_lowercase();
    lower.split_whitespace().any(|w| GERMAN_WORDS.contains(&w))
}

fn is_german_compound(term: &str) -> bool {
    if term.chars().count() <= 8 || !starts_uppercase(term) || !term.chars().all(char::is_alphabetic) {
        return false;
    }
    let lower = term.to_lowercase();
    GERMAN_COMPOUND_STEMS.iter().any(|s| lower.contains(s))
}
