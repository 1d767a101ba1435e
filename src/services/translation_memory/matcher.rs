use super::model::TmEntry;
use super::{hash, normalize};

/// Entry for `original` in the given direction, compared on normalized text.
pub fn exact_match<'a>(
    entries: &'a [TmEntry],
    source_lang: &str,
    target_lang: &str,
    original: &str,
) -> Option<&'a TmEntry> {
    let trimmed = original.trim();
    if trimmed.is_empty() {
        return None;
    }

    let norm = normalize::normalize(trimmed);
    let h = hash::hash_norm(&norm);

    entries.iter().find(|e| {
        e.source_lang == source_lang
            && e.target_lang == target_lang
            && e.hash == h
            && e.normalized == norm
            && !e.translation.trim().is_empty()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_normalized_in_direction() {
        let entries = vec![TmEntry::new("en", "de", "Personality", "Persönlichkeit")];

        assert!(exact_match(&entries, "en", "de", "  personality ").is_some());
        assert!(exact_match(&entries, "de", "en", "personality").is_none());
        assert!(exact_match(&entries, "en", "de", "person").is_none());
        assert!(exact_match(&entries, "en", "de", "   ").is_none());
    }
}
