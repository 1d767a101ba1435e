//! Comparison of a stored translation with a translation-service answer.

use std::collections::HashSet;

use strsim::normalized_levenshtein;

const LEADING_ARTICLES: &[&str] = &["der ", "die ", "das ", "ein ", "eine ", "etw ", "jdn ", "jdm "];
const STOP_WORDS: &[&str] = &["der", "die", "das", "ein", "eine", "und", "oder", "zu", "sich", "etw", "jdn", "jdm"];

/// Case-folds, strips punctuation, collapses whitespace and drops one leading article.
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();

    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");

    for article in LEADING_ARTICLES {
        if let Some(rest) = collapsed.strip_prefix(article) {
            return rest.to_string();
        }
    }
    collapsed
}

fn word_overlap(a: &str, b: &str) -> f64 {
    let words = |s: &str| -> HashSet<String> {
        s.split_whitespace()
            .filter(|w| !STOP_WORDS.contains(w))
            .map(str::to_string)
            .collect()
    };

    let (wa, wb) = (words(a), words(b));
    if wa.is_empty() || wb.is_empty() {
        return 0.0;
    }

    let intersection = wa.intersection(&wb).count();
    let union = wa.union(&wb).count();
    intersection as f64 / union as f64
}

/// Weighted edit-distance and word-overlap score of two normalized strings, 0.0..=1.0.
fn pair_score(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    0.6 * normalized_levenshtein(a, b) + 0.4 * word_overlap(a, b)
}

/// Best score of `candidate` against the stored translation and each `;` alternate.
pub fn similarity(stored: &str, candidate: &str) -> f64 {
    let cand = normalize(candidate);

    std::iter::once(stored)
        .chain(stored.split(';'))
        .map(normalize)
        .map(|s| pair_score(&s, &cand))
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub similarity: f64,
    pub mismatch: bool,
}

/// Mismatch when neither normalized string contains the other and the score is
/// below `threshold`.
pub fn compare(stored: &str, candidate: &str, threshold: f64) -> Comparison {
    let (a, b) = (normalize(stored), normalize(candidate));

    let contained = !a.is_empty() && !b.is_empty() && (a.contains(&b) || b.contains(&a));
    let score = if a == b { 1.0 } else { similarity(stored, candidate) };

    Comparison {
        similarity: score,
        mismatch: !contained && score < threshold,
    }
}

/// The answer adds information beyond the stored translation.
pub fn differs(stored: &str, candidate: &str) -> bool {
    normalize(stored) != normalize(candidate)
}
