//! Card Writer: serializes an [`OutputDocument`] into an Anki import file.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::document::{OutputDocument, TAGS_COLUMN};

use super::files::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Written { path: PathBuf, entries: usize },
    /// The file already existed and `force` was not set.
    Skipped { path: PathBuf },
}

/// Exact file contents for `doc`.
pub fn render_document(doc: &OutputDocument) -> String {
    let header = &doc.header;
    let with_tags = doc.has_tags();

    let mut out = String::new();
    out.push_str(&format!("#separator:{}\n", header.separator));
    out.push_str(&format!("#html:{}\n", header.html));
    out.push_str(&format!("#deck:{}\n", header.deck));
    out.push_str(&format!("#notetype:{}\n", header.notetype));
    if with_tags {
        out.push_str(&format!("#tags column:{TAGS_COLUMN}\n"));
    }

    for entry in &doc.entries {
        out.push_str(&field(&entry.source_term));
        out.push('\t');
        out.push_str(&field(&entry.rendered_translation()));
        if with_tags {
            out.push('\t');
            let tags: Vec<String> = entry.tags.iter().map(|t| field(t)).collect();
            out.push_str(&tags.join(" "));
        }
        out.push('\n');
    }

    out
}

// a row must stay one line with exactly the declared fields
fn field(text: &str) -> String {
    text.replace(['\t', '\r', '\n'], " ").trim().to_string()
}

pub fn write_document(doc: &OutputDocument, path: &Path, force: bool) -> Result<WriteOutcome> {
    if path.exists() && !force {
        log::info!("[WRITER] {} exists, skipping", path.display());
        return Ok(WriteOutcome::Skipped {
            path: path.to_path_buf(),
        });
    }

    write_atomic(path, render_document(doc).as_bytes())?;
    log::info!(
        "[WRITER] wrote {} entries to {}",
        doc.entries.len(),
        path.display()
    );

    Ok(WriteOutcome::Written {
        path: path.to_path_buf(),
        entries: doc.entries.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::document::DeckHeader;
    use crate::model::entry::VocabularyEntry;
    use crate::parsers::anki::parse_document;
    use std::fs;

    fn doc(entries: Vec<VocabularyEntry>) -> OutputDocument {
        OutputDocument::new(
            DeckHeader::new("English Unit-1", "Einfach (beide Richtungen)"),
            entries,
        )
    }

    #[test]
    fn header_without_tags() {
        let text = render_document(&doc(vec![VocabularyEntry::new("personality", "Persönlichkeit")]));
        assert_eq!(
            text,
            "#separator:Tab\n#html:false\n#deck:English Unit-1\n#notetype:Einfach (beide Richtungen)\npersonality\tPersönlichkeit\n"
        );
    }

    #[test]
    fn tags_are_the_third_field() {
        let tags = vec!["Englisch::Unit-1".to_string(), "Vokabeln".to_string()];
        let text = render_document(&doc(vec![
            VocabularyEntry::new("self", "das Selbst").with_tags(&tags)
        ]));

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[4], "#tags column:3");
        assert_eq!(lines[5], "self\tdas Selbst\tEnglisch::Unit-1 Vokabeln");
    }

    #[test]
    fn alternative_is_rendered_inline() {
        let mut e = VocabularyEntry::new("to disagree (with)", "anderer Meinung sein");
        e.alternative_translation = Some("widersprechen".into());
        let text = render_document(&doc(vec![e]));
        assert!(text.ends_with("to disagree (with)\tanderer Meinung sein [Source: widersprechen]\n"));
    }

    #[test]
    fn embedded_tabs_and_newlines_are_flattened() {
        let text = render_document(&doc(vec![VocabularyEntry::new("lad\t", "Junge;\nBursche")]));
        assert!(text.ends_with("lad\tJunge; Bursche\n"));
    }

    #[test]
    fn round_trip_keeps_order_and_tags() {
        let tags = vec!["Englisch::Unit-1".to_string()];
        let entries = vec![
            VocabularyEntry::new("personality", "Persönlichkeit").with_tags(&tags),
            VocabularyEntry::new("self", "das Selbst").with_tags(&tags),
            VocabularyEntry::new("to be different (from)", "anders sein (als); sich unterscheiden (von)")
                .with_tags(&tags),
        ];
        let original = doc(entries);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anki_english_unit-1.txt");
        write_document(&original, &path, false).unwrap();

        let read = parse_document(&fs::read_to_string(&path).unwrap());
        assert_eq!(read.header.deck, "English Unit-1");
        assert_eq!(read.header.tags_column, Some(3));
        assert_eq!(read.entries, original.entries);
    }

    #[test]
    fn second_write_without_force_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anki_english_unit-1.txt");

        let first = doc(vec![VocabularyEntry::new("personality", "Persönlichkeit")]);
        let outcome = write_document(&first, &path, false).unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Written {
                path: path.clone(),
                entries: 1
            }
        );
        let before = fs::read_to_string(&path).unwrap();

        let second = doc(vec![VocabularyEntry::new("self", "das Selbst")]);
        let outcome = write_document(&second, &path, false).unwrap();
        assert_eq!(outcome, WriteOutcome::Skipped { path: path.clone() });
        assert_eq!(fs::read_to_string(&path).unwrap(), before);

        write_document(&second, &path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("das Selbst"));
    }
}
