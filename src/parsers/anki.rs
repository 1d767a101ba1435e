//! Reader for tab-separated import documents.

use std::path::Path;

use crate::error::Result;
use crate::model::document::{DeckHeader, OutputDocument};
use crate::model::entry::VocabularyEntry;
use crate::services::encoding;

const SOURCE_MARKER: &str = " [Source: ";

pub fn read_document(path: &Path) -> Result<OutputDocument> {
    let text = encoding::read_text(path)?;
    Ok(parse_document(&text))
}

pub fn parse_document(text: &str) -> OutputDocument {
    let mut header = DeckHeader::default();
    let mut entries = Vec::new();
    // `#key:value` lines count as directives only above the first row
    let mut in_header = true;

    for (n, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');

        if line.trim().is_empty() {
            continue;
        }

        if in_header {
            if let Some(directive) = line.strip_prefix('#').filter(|d| d.contains(':')) {
                apply_directive(&mut header, directive);
                continue;
            }
            in_header = false;
        }

        match parse_row(line, header.tags_column) {
            Some(entry) => entries.push(entry),
            None => log::debug!("[ANKI] skipping line {}: {line}", n + 1),
        }
    }

    OutputDocument { header, entries }
}

fn apply_directive(header: &mut DeckHeader, directive: &str) {
    let (key, value) = match directive.split_once(':') {
        Some((k, v)) => (k.trim().to_lowercase(), v.trim()),
        None => return,
    };

    match key.as_str() {
        "separator" => header.separator = value.to_string(),
        "html" => header.html = value.eq_ignore_ascii_case("true"),
        "deck" => header.deck = value.to_string(),
        "notetype" => header.notetype = value.to_string(),
        "tags column" => header.tags_column = value.parse().ok(),
        _ => log::debug!("[ANKI] ignoring directive #{directive}"),
    }
}

fn parse_row(line: &str, tags_column: Option<usize>) -> Option<VocabularyEntry> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 2 {
        return None;
    }

    let source_term = fields[0].trim();
    if source_term.is_empty() {
        return None;
    }

    let (translation, alternative) = split_alternative(fields[1].trim());

    let tags = tags_column
        .and_then(|col| col.checked_sub(1))
        .and_then(|idx| fields.get(idx))
        .map(|t| t.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    Some(VocabularyEntry {
        source_term: source_term.to_string(),
        translation,
        alternative_translation: alternative,
        tags,
    })
}

/// Separates a trailing ` [Source: …]` annotation from the stored translation.
pub fn split_alternative(field: &str) -> (String, Option<String>) {
    if field.ends_with(']') {
        if let Some(pos) = field.rfind(SOURCE_MARKER) {
            let alt = &field[pos + SOURCE_MARKER.len()..field.len() - 1];
            return (field[..pos].trim().to_string(), Some(alt.trim().to_string()));
        }
    }
    (field.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_header_and_rows() {
        let text = "#separator:Tab\n#html:false\n#deck:English Unit-1\n#notetype:Einfach (beide Richtungen)\n\
                    personality\tPersönlichkeit\n\nsmart\tschlau; klug; intelligent\n";
        let doc = parse_document(text);

        assert_eq!(doc.header.deck, "English Unit-1");
        assert_eq!(doc.header.notetype, "Einfach (beide Richtungen)");
        assert!(!doc.header.html);
        assert_eq!(doc.header.tags_column, None);
        assert_eq!(doc.entries.len(), 2);
        assert_eq!(doc.entries[1].translation, "schlau; klug; intelligent");
    }

    #[test]
    fn tags_column_is_read() {
        let text = "#separator:Tab\n#html:true\n#deck:D\n#notetype:Basic\n#tags column:3\n\
                    bay\tBucht\tEnglish::Unit-1 nouns\n";
        let doc = parse_document(text);
        assert!(doc.header.html);
        assert_eq!(doc.header.tags_column, Some(3));
        assert_eq!(doc.entries[0].tags, vec!["English::Unit-1", "nouns"]);
    }

    #[test]
    fn source_annotation_becomes_alternative() {
        let doc = parse_document("to disagree (with)\tanderer Meinung sein [Source: widersprechen]\n");
        let e = &doc.entries[0];
        assert_eq!(e.translation, "anderer Meinung sein");
        assert_eq!(e.alternative_translation.as_deref(), Some("widersprechen"));
    }

    #[test]
    fn crlf_and_short_rows() {
        let doc = parse_document("#deck:D\r\nonly-one-field\r\ncup\tTasse\r\n");
        assert_eq!(doc.header.deck, "D");
        assert_eq!(doc.entries.len(), 1);
        assert_eq!(doc.entries[0].translation, "Tasse");
    }

    #[test]
    fn hash_rows_after_the_header_are_entries() {
        let doc = parse_document("#deck:D\n#tags column:3\ncup\tTasse\n#hashtag\tRaute\t\n#deck:Other\n");
        assert_eq!(doc.header.deck, "D");
        assert_eq!(doc.header.tags_column, Some(3));
        let terms: Vec<_> = doc.entries.iter().map(|e| e.source_term.as_str()).collect();
        assert_eq!(terms, vec!["cup", "#hashtag"]);
        assert!(doc.entries[1].tags.is_empty());
    }

    #[test]
    fn plain_brackets_are_not_alternatives() {
        let (t, alt) = split_alternative("Topf [ugs.]");
        assert_eq!(t, "Topf [ugs.]");
        assert!(alt.is_none());
    }
}
