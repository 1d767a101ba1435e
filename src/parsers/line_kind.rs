//! Line classification for OCR output of vocabulary pages.
//!
//! Every recognized line becomes one `LineKind`. Which lines count as a term
//! depends on the layout evidence available: bounding boxes when the OCR
//! service returned them, otherwise the term/transcription pattern.

use regex::Regex;

use crate::config::ParserConfig;
use crate::model::ocr::{BoundingBox, ExtractionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    French,
    German,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::French => "french",
            Language::German => "german",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "fr" | "france" => Ok(Language::French),
            "german" | "de" => Ok(Language::German),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Page numbers, unit and section headers.
    Furniture,
    /// A line holding only a bracketed transcription.
    Phonetic,
    /// A left-column line; `inline` is translation text found on the same line.
    Term { term: String, inline: Option<String> },
    /// A term printed without transcription, with its translation from the next line.
    Pair { term: String, translation: String },
    Continuation(String),
    /// Lines left out of entries, including a translation already taken by a `Pair`.
    Noise,
}

const ENGLISH_HEADERS: &[&str] = &[
    r"^Unit \d+",
    r"^Check-in$",
    r"^Vocabulary$",
    r"^Media collocations$",
    r"^(Media|Verb|Collocations|Translation)$",
    r"^(print media|TV|radio|online media|social media)$",
    r"^Describing developments$",
    r"^Adjective collocations$",
    r"^Nouns and adjectives$",
    r"^Nouns and verbs with the same form$",
    r"^Skills:",
    r"^Unit task:",
    r"^Story:",
    r"^Across cultures",
    r"^Focus \d+",
    r"^Station \d+",
    r"^(adjectives with|other adjectives)",
];

const FRENCH_HEADERS: &[&str] = &[
    r"^cent-",
    r"^Vocabulaire$",
    r"^AUF EINEN BLICK",
    r"^MON DICO PERSONNEL",
    r"^TIPP$",
    r"^TU TE RAPPELLES\?$",
    r"^Vis-à-vis$",
    r"^Atelier",
    r"^Unité \d+",
    r"^DE$",
    r"^A \d+$",
    r"^englisch:",
    r"^Lerne ",
];

const GERMAN_HEADERS: &[&str] = &[
    r"^Lektion \d+",
    r"^Kapitel \d+",
    r"^Wortschatz$",
    r"^Seite \d+",
];

const ENGLISH_STARTERS: &[&str] = &[
    "I ", "I'm ", "I've ", "I'd ", "I'll ", "You ", "You're ", "He ", "He's ", "She ",
    "She's ", "We ", "We're ", "They ", "They're ", "It ", "It's ", "My ", "Your ", "His ",
    "Her ", "Our ", "Their ", "The ", "A ", "An ", "Some ", "Any ", "This ", "That ",
    "These ", "Those ", "If ", "When ", "Where ", "What ", "Why ", "How ", "Who ", "Are ",
    "Is ", "Was ", "Were ", "Do ", "Does ", "Did ", "Have ", "Has ", "Had ", "Can ",
    "Could ", "Will ", "Would ", "Should ", "Never ", "Always ", "Just ", "With ", "As ",
    "To ", "For ", "From ", "There ",
];

const FRENCH_STARTERS: &[&str] = &[
    "Il ", "Elle ", "Je ", "J'", "Tu ", "On ", "Nous ", "Vous ", "Ils ", "Elles ", "Les ",
    "Le ", "La ", "C'", "Pour ", "Qu'",
];

const GERMAN_STARTERS: &[&str] = &[
    "Ich ", "Wir ", "Du ", "Er ", "Sie ", "Es ", "Das ist", "Hast ", "Was ", "Wie ", "Wann ",
    "Wo ",
];

const GERMAN_ARTICLES: &[&str] = &["ein", "der", "die", "das", "am "];
const OBJECT_MARKERS: &[&str] = &["etw.", "jdn.", "jdm."];
const PHRASE_OPENERS: &[&str] = &["während", "Lust", "schlecht", "etw.", "jdn.", "jdm."];
const GERMAN_ENDINGS: &[&str] = &["en", "ung", "heit", "keit"];

const NOISE_PREFIXES: &[&str] = &["Fr.", "Lat.", "!", "->", "«"];
const NOISE_SUBSTRINGS: &[&str] = &["->", "«", "»", " = ", "] (pl)", "(pl.)", "(sing.)"];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern")
}

fn has_umlaut(text: &str) -> bool {
    text.chars().any(|c| matches!(c, 'ä' | 'ö' | 'ü' | 'ß' | 'Ä' | 'Ö' | 'Ü'))
}

fn starts_with_any(text: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|p| text.starts_with(p))
}

/// French term shapes printed without a transcription. Each is accepted only
/// when the next line reads like its German translation.
struct FrenchTerms {
    article_noun: Regex,
    object_verb: Regex,
    phrase: Regex,
    single_word: Regex,
    gendered_adjective: Regex,
    lowercase_word: Regex,
}

impl FrenchTerms {
    fn new() -> Self {
        Self {
            article_noun: re(r"(?i)^(?:(?:un|une|le|la|les|des|au|aux|du)\s+|l')[\p{L}'\-\s]+$"),
            object_verb: re(r"^[\p{L}'\-\s]+(?:qc|qn)$"),
            phrase: re(r"(?i)^(?:pendant|avoir|être|il n'y a|ne pas|se|faire)\s+[\p{L}'\-\s]+$"),
            single_word: re(r"^[\p{L}'\-]+$"),
            gendered_adjective: re(r"^[\p{L}'\-]+/[\p{L}'\-]+$"),
            lowercase_word: re(r"^[a-z]+$"),
        }
    }

    fn pairs_with(&self, line: &str, next: &str) -> bool {
        let umlaut = has_umlaut(next);

        if self.article_noun.is_match(line) {
            umlaut || starts_with_any(next, GERMAN_ARTICLES)
        } else if self.object_verb.is_match(line) {
            umlaut || starts_with_any(next, OBJECT_MARKERS)
        } else if self.phrase.is_match(line) {
            umlaut || starts_with_any(next, PHRASE_OPENERS)
        } else if self.single_word.is_match(line) {
            let lower = line.to_lowercase();
            let infinitive = ["er", "ir", "re"].iter().any(|e| lower.ends_with(e))
                || lower == "hier"
                || lower == "souvent";
            infinitive && (umlaut || GERMAN_ENDINGS.iter().any(|e| next.ends_with(e)))
        } else if self.gendered_adjective.is_match(line) {
            umlaut || self.lowercase_word.is_match(next)
        } else {
            false
        }
    }
}

/// Line indices top to bottom, then left to right within a row. A line without
/// a box stays behind the line it followed.
fn reading_order(extraction: &ExtractionResult) -> Vec<usize> {
    let mut last_y = f64::NEG_INFINITY;
    let mut placed: Vec<(usize, f64, f64, f64)> = extraction
        .lines
        .iter()
        .enumerate()
        .map(|(i, line)| match line.bounding_box {
            Some(BoundingBox { x, y, height, .. }) => {
                last_y = y;
                (i, y, x, height)
            }
            None => (i, last_y, f64::MAX, 0.0),
        })
        .collect();
    placed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut rows: Vec<Vec<(usize, f64)>> = Vec::new();
    let (mut top, mut band) = (f64::NEG_INFINITY, 0.0);
    for (i, y, x, height) in placed {
        match rows.last_mut() {
            Some(row) if y - top <= band => row.push((i, x)),
            _ => {
                top = y;
                band = height / 2.0;
                rows.push(vec![(i, x)]);
            }
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| a.1.total_cmp(&b.1));
            row.into_iter().map(|(i, _)| i)
        })
        .collect()
}

/// Classifies lines for one language with one parser configuration.
pub struct LineClassifier {
    language: Language,
    headers: Vec<Regex>,
    extra_headers: Vec<String>,
    starters: &'static [&'static str],
    page_number: Regex,
    number_words: Regex,
    phonetic: Regex,
    inline_term: Regex,
    bare_term: Regex,
    derivation: Regex,
    example_fragment: Regex,
    english_infinitive: Regex,
    french_terms: Option<FrenchTerms>,
    column_tolerance: f64,
    max_term_len: usize,
}

impl LineClassifier {
    pub fn new(language: Language, config: &ParserConfig) -> Self {
        let (headers, starters): (&[&str], &'static [&'static str]) = match language {
            Language::English => (ENGLISH_HEADERS, ENGLISH_STARTERS),
            Language::French => (FRENCH_HEADERS, FRENCH_STARTERS),
            Language::German => (GERMAN_HEADERS, GERMAN_STARTERS),
        };

        Self {
            language,
            headers: headers.iter().map(|p| re(&format!("(?i){p}"))).collect(),
            extra_headers: config
                .extra_headers
                .iter()
                .map(|h| h.trim().to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            starters,
            page_number: re(r"^\d+$"),
            number_words: re(r"(?i)^(one|two|three|four|five) hundred"),
            phonetic: re(r"^\[[^\]]*\]+$"),
            inline_term: re(r#"^[*"\d\s]*(?P<term>\p{L}[^\[\]]*?)\s*\[[^\]]+\]+\s*(?P<rest>.*)$"#),
            bare_term: re(r#"^[*"\d\s']*\p{L}[\p{L}\s'\-()./+,?!]*$"#),
            derivation: re(r"^\w+ ->"),
            example_fragment: re(r"^to (me|you|him|her) "),
            english_infinitive: re(r"^to [a-z]+"),
            french_terms: (language == Language::French).then(FrenchTerms::new),
            column_tolerance: config.column_tolerance,
            max_term_len: config.max_term_len,
        }
    }

    pub fn is_furniture(&self, line: &str) -> bool {
        if self.page_number.is_match(line) || self.number_words.is_match(line) {
            return true;
        }
        if self.headers.iter().any(|h| h.is_match(line)) {
            return true;
        }
        let lower = line.to_lowercase();
        self.extra_headers.iter().any(|h| *h == lower)
    }

    pub fn is_phonetic(&self, line: &str) -> bool {
        self.phonetic.is_match(line)
    }

    /// Etymology notes, derivations, synonyms and antonyms.
    pub fn is_annotation(&self, line: &str) -> bool {
        NOISE_PREFIXES.iter().any(|p| line.starts_with(p))
            || NOISE_SUBSTRINGS.iter().any(|s| line.contains(s))
            || self.derivation.is_match(line)
    }

    /// Annotations, inline transcriptions, English phrases and example sentences.
    pub fn is_noise(&self, line: &str) -> bool {
        if self.is_annotation(line) || line.contains('[') {
            return true;
        }
        if self.example_fragment.is_match(line) {
            return true;
        }
        if self.language == Language::English && self.english_infinitive.is_match(line) {
            return true;
        }
        self.is_example_sentence(line)
    }

    pub fn is_example_sentence(&self, line: &str) -> bool {
        let long = line.chars().count() > 30;
        if long && self.starters.iter().any(|s| line.starts_with(s)) {
            return true;
        }
        let terminal = line.ends_with('.') || line.ends_with('?') || line.ends_with('!');
        terminal && line.split_whitespace().count() >= 6
    }

    /// Splits `term [transcription] rest` into the cleaned term and inline text.
    fn split_inline(&self, line: &str) -> Option<(String, Option<String>)> {
        let caps = self.inline_term.captures(line)?;
        let term = clean_term(caps.name("term").map(|m| m.as_str()).unwrap_or(""));
        if !self.acceptable_term(&term) {
            return None;
        }

        let rest = caps.name("rest").map(|m| m.as_str().trim()).unwrap_or("");
        let inline = rest
            .chars()
            .next()
            .filter(|c| c.is_alphabetic() && !rest.contains('['))
            .map(|_| rest.to_string());

        Some((term, inline))
    }

    fn acceptable_term(&self, term: &str) -> bool {
        let len = term.chars().count();
        len >= 2 && len <= self.max_term_len
    }

    /// Classifies every line of one extraction, in reading order.
    pub fn classify(&self, extraction: &ExtractionResult) -> Vec<LineKind> {
        let texts: Vec<String> = extraction
            .lines
            .iter()
            .map(|l| l.text.trim().to_string())
            .collect();

        match self.column_edges(extraction, &texts) {
            Some((left_edge, span)) => self.classify_by_column(extraction, &texts, left_edge, span),
            None => self.classify_by_pattern(&texts),
        }
    }

    fn is_content(&self, line: &str) -> bool {
        !line.is_empty() && !self.is_furniture(line) && !self.is_phonetic(line)
    }

    /// Left edge and page span when positions separate at least two columns.
    fn column_edges(&self, extraction: &ExtractionResult, texts: &[String]) -> Option<(f64, f64)> {
        let xs: Vec<f64> = extraction
            .lines
            .iter()
            .zip(texts)
            .filter(|(_, t)| self.is_content(t))
            .filter_map(|(l, _)| l.bounding_box.map(|b| b.x))
            .collect();

        let content = texts.iter().filter(|t| self.is_content(t)).count();
        if xs.len() < 2 || xs.len() * 2 < content {
            return None;
        }

        let left_edge = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let right_edge = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let span = extraction
            .page_width
            .filter(|w| *w > left_edge)
            .map(|w| w - left_edge)
            .unwrap_or(right_edge - left_edge);

        if span <= 0.0 {
            return None;
        }

        let limit = self.column_tolerance * span;
        if xs.iter().all(|x| x - left_edge <= limit) {
            return None;
        }

        Some((left_edge, span))
    }

    fn classify_by_column(
        &self,
        extraction: &ExtractionResult,
        texts: &[String],
        left_edge: f64,
        span: f64,
    ) -> Vec<LineKind> {
        let limit = self.column_tolerance * span;

        reading_order(extraction)
            .into_iter()
            .map(|i| {
                let text = &texts[i];
                if let Some(kind) = self.structural_kind(text) {
                    return kind;
                }

                let in_left_column = extraction.lines[i]
                    .bounding_box
                    .map(|b| b.x - left_edge <= limit)
                    .unwrap_or(false);

                if !in_left_column {
                    return LineKind::Continuation(text.clone());
                }

                match self.split_inline(text) {
                    Some((term, inline)) => LineKind::Term { term, inline },
                    None => {
                        let term = clean_term(text);
                        if self.acceptable_term(&term) && !self.is_example_sentence(text) {
                            LineKind::Term { term, inline: None }
                        } else {
                            LineKind::Noise
                        }
                    }
                }
            })
            .collect()
    }

    fn classify_by_pattern(&self, texts: &[String]) -> Vec<LineKind> {
        let mut kinds = Vec::with_capacity(texts.len());
        let mut i = 0;

        while i < texts.len() {
            let kind = self.pattern_kind(texts, i);
            let paired = matches!(kind, LineKind::Pair { .. });
            kinds.push(kind);
            if paired {
                kinds.push(LineKind::Noise);
                i += 2;
            } else {
                i += 1;
            }
        }

        kinds
    }

    fn pattern_kind(&self, texts: &[String], i: usize) -> LineKind {
        let text = &texts[i];
        if let Some(kind) = self.structural_kind(text) {
            return kind;
        }

        if let Some((term, inline)) = self.split_inline(text) {
            return LineKind::Term { term, inline };
        }

        if self.bare_term.is_match(text) && self.followed_by_phonetic(texts, i) {
            let term = clean_term(text);
            if self.acceptable_term(&term) {
                return LineKind::Term { term, inline: None };
            }
        }

        if let Some(kind) = self.french_pair(texts, i) {
            return kind;
        }

        if text.contains('[') {
            LineKind::Noise
        } else {
            LineKind::Continuation(text.clone())
        }
    }

    fn french_pair(&self, texts: &[String], i: usize) -> Option<LineKind> {
        let rules = self.french_terms.as_ref()?;
        let text = texts[i].as_str();
        let next = texts.get(i + 1)?.as_str();
        if next.is_empty() || self.structural_kind(next).is_some() {
            return None;
        }
        if !self.acceptable_term(text) || !rules.pairs_with(text, next) {
            return None;
        }
        Some(LineKind::Pair {
            term: text.to_string(),
            translation: next.to_string(),
        })
    }

    fn structural_kind(&self, text: &str) -> Option<LineKind> {
        if text.is_empty() || self.is_furniture(text) {
            Some(LineKind::Furniture)
        } else if self.is_phonetic(text) {
            Some(LineKind::Phonetic)
        } else {
            None
        }
    }

    /// Looks up to three lines ahead, stepping over furniture and annotations.
    fn followed_by_phonetic(&self, texts: &[String], i: usize) -> bool {
        for next in texts.iter().skip(i + 1).take(3) {
            if self.is_phonetic(next) {
                return true;
            }
            if next.is_empty() || self.is_furniture(next) || self.is_annotation(next) {
                continue;
            }
            return false;
        }
        false
    }
}

/// Strips list markers and stray quotes around a term.
pub fn clean_term(raw: &str) -> String {
    raw.trim()
        .trim_start_matches(|c: char| c == '*' || c == '"' || c == '\'' || c.is_ascii_digit() || c.is_whitespace())
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}
