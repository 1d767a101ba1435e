//! File naming for both passes, derived from the `…/<language>/<unit>` input layout.

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_OUTPUT_DIR: &str = "output";
const FALLBACK_DECK: &str = "Vocabulary";

/// Where the extraction pass writes for one input folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractLayout {
    pub output_dir: PathBuf,
    pub output_file: PathBuf,
    pub raw_file: PathBuf,
    pub deck: String,
}

impl ExtractLayout {
    pub fn new(input_folder: &Path, output_dir: Option<&Path>, deck: Option<&str>) -> Self {
        let parts = trailing_parts(input_folder);
        let suffix = parts
            .iter()
            .map(|p| safe_file_part(p))
            .collect::<Vec<_>>()
            .join("_");

        let output_dir = output_dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let deck = match deck.map(str::trim).filter(|d| !d.is_empty()) {
            Some(d) => d.to_string(),
            None => deck_from_parts(&parts),
        };

        Self {
            output_file: output_dir.join(format!("anki_{suffix}.txt")),
            raw_file: output_dir.join(format!("raw_{suffix}.txt")),
            output_dir,
            deck,
        }
    }
}

/// Where the validation pass writes for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidateLayout {
    pub final_file: PathBuf,
    pub report_file: PathBuf,
    /// Raw OCR dump written next to the document by the extraction pass.
    pub raw_candidate: PathBuf,
}

impl ValidateLayout {
    pub fn new(document: &Path, output_dir: Option<&Path>) -> Self {
        let parent = document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let out = output_dir.map(Path::to_path_buf).unwrap_or_else(|| parent.clone());

        let name = document
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document.txt");
        let stem = document
            .file_stem()
            .and_then(|n| n.to_str())
            .unwrap_or("document");

        let final_name = if name.contains("anki_") {
            name.replacen("anki_", "final_", 1)
        } else {
            format!("final_{name}")
        };

        Self {
            final_file: out.join(final_name),
            report_file: out.join(format!("validation_report_{stem}.md")),
            raw_candidate: parent.join(format!("raw_{}.txt", stem.replacen("anki_", "", 1))),
        }
    }
}

/// Deck for a validated document: the header's deck, else the folder layout.
pub fn validation_deck(header_deck: &str, document: &Path) -> String {
    if !header_deck.trim().is_empty() {
        return header_deck.trim().to_string();
    }
    match document.parent() {
        Some(parent) if parent.components().count() >= 2 => deck_from_parts(&trailing_parts(parent)),
        _ => FALLBACK_DECK.to_string(),
    }
}

/// Last two normal components of `folder` (language and unit), or just the name.
fn trailing_parts(folder: &Path) -> Vec<String> {
    let normal: Vec<String> = folder
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(str::to_string),
            _ => None,
        })
        .collect();

    let start = normal.len().saturating_sub(2);
    let parts = normal[start..].to_vec();
    if parts.is_empty() {
        vec![FALLBACK_DECK.to_lowercase()]
    } else {
        parts
    }
}

fn deck_from_parts(parts: &[String]) -> String {
    parts
        .iter()
        .map(|p| capitalize(p))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upper-cases the first character and lower-cases the rest: `unit-1` → `Unit-1`.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Keeps letters, digits, `-`, `_` and `.` so the part is usable in a file name.
fn safe_file_part(part: &str) -> String {
    let out: String = part
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_alphanumeric() || ch == '_' || ch == '-' || ch == '.' {
                ch
            } else {
                '_'
            }
        })
        .collect();

    let out = out.trim_matches('.').to_string();
    if out.is_empty() {
        "unit".to_string()
    } else {
        out
    }
}
