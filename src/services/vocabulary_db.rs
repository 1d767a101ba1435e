//! JSON-backed store of imported vocabulary with validation state and a
//! correction history.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::model::document::{DeckHeader, OutputDocument};
use crate::model::entry::VocabularyEntry;
use crate::model::record::{Correction, RecordStatus, VocabularyRecord};
use crate::parsers::anki::read_document;

use super::encoding;
use super::files::write_atomic;
use super::validate::{ValidationOutcome, ValidationRun};

const CONTEXT_CHARS: usize = 200;
const CANDIDATE_LOOKAHEAD: usize = 5;
const CONTEXT_LINES: usize = 2;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DbFile {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    records: Vec<VocabularyRecord>,
    #[serde(default)]
    corrections: Vec<Correction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DbStats {
    pub total: usize,
    pub by_status: BTreeMap<RecordStatus, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub corrections: usize,
}

/// Raw OCR lines around a record's term and likely translations found near them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MatchReport {
    /// (0-based line number, surrounding lines)
    pub contexts: Vec<(usize, String)>,
    pub candidates: Vec<String>,
}

pub struct VocabularyDb {
    path: PathBuf,
    data: DbFile,
    unit_pattern: Regex,
    target_marker: Regex,
}

impl VocabularyDb {
    /// Opens the store at `path`; a missing file is an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let text = fs::read_to_string(path)?;
            serde_json::from_str(&text)?
        } else {
            DbFile::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            data,
            unit_pattern: Regex::new(r"(?i)unit-?\d+").expect("static pattern"),
            target_marker: Regex::new(r"[äöüßÄÖÜ]|etw\.|jdn\.|jdm\.").expect("static pattern"),
        })
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        write_atomic(&self.path, json.as_bytes())?;
        log::debug!("[DB] saved {}", self.path.display());
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&VocabularyRecord> {
        self.data.records.iter().find(|r| r.id == id)
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut VocabularyRecord> {
        self.data
            .records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| CoreError::NotFound(format!("entry {id}")))
    }

    /// Imports an import document; `source` defaults to the file stem.
    pub fn import(
        &mut self,
        document: &Path,
        source: Option<&str>,
        raw_file: Option<&Path>,
        languages: (&str, &str),
    ) -> Result<ImportSummary> {
        if !document.exists() {
            return Err(CoreError::NotFound(format!("{}", document.display())));
        }
        let doc = read_document(document)?;

        let stem = document
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        let source = source.map(str::to_string).unwrap_or_else(|| stem.to_string());
        let unit = self.unit_pattern.find(stem).map(|m| m.as_str().to_string());

        let raw_text = match raw_file {
            Some(p) if p.exists() => Some(encoding::read_text(p)?),
            Some(p) => {
                log::warn!("[DB] raw file {} not found, importing without context", p.display());
                None
            }
            None => None,
        };

        let summary = self.import_entries(&doc.entries, &source, unit, raw_text.as_deref(), languages);
        log::info!(
            "[DB] imported {} entries from {} ({} duplicates skipped)",
            summary.imported,
            document.display(),
            summary.skipped
        );
        Ok(summary)
    }

    pub fn import_entries(
        &mut self,
        entries: &[VocabularyEntry],
        source: &str,
        unit: Option<String>,
        raw_text: Option<&str>,
        (from, to): (&str, &str),
    ) -> ImportSummary {
        let mut summary = ImportSummary::default();
        let now = now();

        for entry in entries {
            let term = entry.source_term.trim();
            if term.is_empty() {
                continue;
            }

            let exists = self
                .data
                .records
                .iter()
                .any(|r| r.source_term == term && r.source_file == source);
            if exists {
                summary.skipped += 1;
                continue;
            }

            self.data.next_id += 1;
            self.data.records.push(VocabularyRecord {
                id: self.data.next_id,
                source_term: term.to_string(),
                translation: entry.translation.trim().to_string(),
                corrected_translation: None,
                source_language: from.to_string(),
                target_language: to.to_string(),
                source_file: source.to_string(),
                source_unit: unit.clone(),
                status: RecordStatus::Pending,
                similarity: None,
                translator_result: entry.alternative_translation.clone(),
                ocr_context: raw_text.and_then(|raw| ocr_context(term, raw)),
                created_at: now,
                updated_at: now,
            });
            summary.imported += 1;
        }

        summary
    }

    /// Records with the given status and/or source, ordered by id.
    pub fn list(
        &self,
        status: Option<RecordStatus>,
        source: Option<&str>,
        limit: usize,
    ) -> Vec<&VocabularyRecord> {
        self.data
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .filter(|r| source.map_or(true, |s| r.source_file == s))
            .take(limit)
            .collect()
    }

    /// Sets a corrected translation and appends it to the history.
    pub fn correct(&mut self, id: u64, new_translation: &str, source: &str) -> Result<&VocabularyRecord> {
        let new_translation = new_translation.trim();
        if new_translation.is_empty() {
            return Err(CoreError::InvalidDocument("empty translation".into()));
        }

        let now = now();
        let record = self.get_mut(id)?;
        let old_translation = record.effective_translation().to_string();
        record.corrected_translation = Some(new_translation.to_string());
        record.status = RecordStatus::Corrected;
        record.updated_at = now;

        let correction_id = self.data.corrections.len() as u64 + 1;
        self.data.corrections.push(Correction {
            id: correction_id,
            record_id: id,
            old_translation,
            new_translation: new_translation.to_string(),
            kind: "manual".to_string(),
            source: source.to_string(),
            created_at: now,
        });

        self.get(id)
            .ok_or_else(|| CoreError::NotFound(format!("entry {id}")))
    }

    /// Marks an entry deleted; it stays in the file but leaves exports.
    pub fn delete(&mut self, id: u64) -> Result<&VocabularyRecord> {
        let record = self.get_mut(id)?;
        record.status = RecordStatus::Deleted;
        record.updated_at = now();
        Ok(record)
    }

    pub fn record_validation(
        &mut self,
        id: u64,
        translator_result: Option<&str>,
        similarity: Option<f64>,
        status: RecordStatus,
    ) -> Result<()> {
        let record = self.get_mut(id)?;
        record.translator_result = translator_result.map(str::to_string);
        record.similarity = similarity;
        record.status = status;
        record.updated_at = now();
        Ok(())
    }

    /// Stores the outcome of a validation run on the records imported from `source`.
    /// Corrected and deleted records keep their status. Returns how many were updated.
    pub fn apply_validation(&mut self, run: &ValidationRun, source: &str) -> Result<usize> {
        let mut updated = 0usize;

        for result in &run.results {
            let (answer, similarity, status) = match &result.outcome {
                ValidationOutcome::Valid {
                    alternative,
                    similarity,
                } => (Some(alternative.as_str()), Some(*similarity), RecordStatus::Valid),
                ValidationOutcome::Suspicious {
                    alternative,
                    similarity,
                    ..
                } => (alternative.as_deref(), Some(*similarity), RecordStatus::Suspicious),
                ValidationOutcome::Error { .. } => continue,
            };

            let id = self
                .data
                .records
                .iter()
                .find(|r| {
                    r.source_file == source
                        && r.source_term == result.source_term
                        && !matches!(r.status, RecordStatus::Corrected | RecordStatus::Deleted)
                })
                .map(|r| r.id);

            if let Some(id) = id {
                self.record_validation(id, answer, similarity, status)?;
                updated += 1;
            }
        }

        Ok(updated)
    }

    /// Looks for the record's term in raw OCR text and collects nearby lines that
    /// look like target-language translations.
    pub fn find_candidates(&self, id: u64, raw_text: &str) -> Result<MatchReport> {
        let record = self
            .get(id)
            .ok_or_else(|| CoreError::NotFound(format!("entry {id}")))?;

        let lines: Vec<&str> = raw_text.lines().collect();
        let term = record.source_term.to_lowercase();
        let first_word = term.split_whitespace().next().unwrap_or_default().to_string();

        let mut hits = matching_lines(&lines, &term);
        if hits.is_empty() && !first_word.is_empty() {
            hits = matching_lines(&lines, &first_word);
        }

        let contexts = hits
            .iter()
            .map(|&i| {
                let start = i.saturating_sub(CONTEXT_LINES);
                let end = (i + CONTEXT_LINES + 1).min(lines.len());
                (i, lines[start..end].join("\n"))
            })
            .collect();

        let mut candidates: Vec<String> = Vec::new();
        for &i in &matching_lines(&lines, &term) {
            let end = (i + CANDIDATE_LOOKAHEAD).min(lines.len());
            for line in &lines[i..end] {
                let line = line.trim();
                if self.target_marker.is_match(line)
                    && !line.eq_ignore_ascii_case(&record.source_term)
                    && !candidates.iter().any(|c| c == line)
                {
                    candidates.push(line.to_string());
                }
            }
        }

        Ok(MatchReport {
            contexts,
            candidates,
        })
    }

    /// Document of records with one of `statuses` (all but deleted when empty),
    /// ordered by source file then id. Corrected translations win.
    pub fn export(&self, statuses: &[RecordStatus], header: DeckHeader) -> OutputDocument {
        let mut rows: Vec<&VocabularyRecord> = self
            .data
            .records
            .iter()
            .filter(|r| {
                if statuses.is_empty() {
                    r.status != RecordStatus::Deleted
                } else {
                    statuses.contains(&r.status)
                }
            })
            .collect();
        rows.sort_by(|a, b| (a.source_file.as_str(), a.id).cmp(&(b.source_file.as_str(), b.id)));

        let entries = rows
            .into_iter()
            .map(|r| VocabularyEntry::new(r.source_term.clone(), r.effective_translation()))
            .filter(VocabularyEntry::is_complete)
            .collect();

        OutputDocument::new(header, entries)
    }

    pub fn stats(&self) -> DbStats {
        let mut stats = DbStats {
            total: self.data.records.len(),
            corrections: self.data.corrections.len(),
            ..DbStats::default()
        };

        for r in &self.data.records {
            *stats.by_status.entry(r.status).or_default() += 1;
            *stats.by_source.entry(r.source_file.clone()).or_default() += 1;
        }

        stats
    }

    pub fn corrections_for(&self, id: u64) -> Vec<&Correction> {
        self.data
            .corrections
            .iter()
            .filter(|c| c.record_id == id)
            .collect()
    }
}

fn matching_lines(lines: &[&str], needle: &str) -> Vec<usize> {
    if needle.is_empty() {
        return Vec::new();
    }
    lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.to_lowercase().contains(needle))
        .map(|(i, _)| i)
        .collect()
}

/// Up to 200 characters of raw text on each side of the first occurrence of
/// `term` (or its first word), compared case-insensitively.
pub fn ocr_context(term: &str, raw_text: &str) -> Option<String> {
    let chars: Vec<char> = raw_text.chars().collect();
    let lower: Vec<char> = chars.iter().map(|c| fold(*c)).collect();

    let find = |needle: &str| -> Option<(usize, usize)> {
        let needle: Vec<char> = needle.chars().map(fold).collect();
        if needle.is_empty() || needle.len() > lower.len() {
            return None;
        }
        lower
            .windows(needle.len())
            .position(|w| w == needle.as_slice())
            .map(|idx| (idx, needle.len()))
    };

    let (idx, len) = find(term).or_else(|| term.split_whitespace().next().and_then(find))?;

    let start = idx.saturating_sub(CONTEXT_CHARS);
    let end = (idx + len + CONTEXT_CHARS).min(chars.len());
    Some(chars[start..end].iter().collect())
}

fn fold(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "#separator:Tab\n#html:false\n#deck:France Unit-2\n#notetype:Einfach (beide Richtungen)\n\
la plage\tder Strand\nle copain\tder Freund\nla baie\tdie Bucht\n";

    const RAW: &str = "Vocabulaire\nla plage [laplaʒ]\nder Strand\nle copain\nder Kumpel; der Freund\nla baie\nBucht\n";

    fn setup() -> (tempfile::TempDir, VocabularyDb, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("anki_france_unit-2.txt");
        fs::write(&doc, DOC).unwrap();
        let db = VocabularyDb::open(&dir.path().join("vocabulary_db.json")).unwrap();
        (dir, db, doc)
    }

    #[test]
    fn import_derives_unit_and_skips_duplicates() {
        let (dir, mut db, doc) = setup();
        let raw = dir.path().join("raw_france_unit-2.txt");
        fs::write(&raw, RAW).unwrap();

        let first = db.import(&doc, None, Some(&raw), ("fr", "de")).unwrap();
        assert_eq!(first, ImportSummary { imported: 3, skipped: 0 });

        let second = db.import(&doc, None, None, ("fr", "de")).unwrap();
        assert_eq!(second, ImportSummary { imported: 0, skipped: 3 });

        let r = db.get(1).unwrap();
        assert_eq!(r.source_file, "anki_france_unit-2");
        assert_eq!(r.source_unit.as_deref(), Some("unit-2"));
        assert!(r.ocr_context.as_deref().unwrap().contains("der Strand"));
    }

    #[test]
    fn missing_document_is_not_found() {
        let (dir, mut db, _) = setup();
        let err = db.import(&dir.path().join("nope.txt"), None, None, ("fr", "de"));
        assert!(matches!(err, Err(CoreError::NotFound(_))));
    }

    #[test]
    fn correct_keeps_history_and_export_prefers_it() {
        let (_dir, mut db, doc) = setup();
        db.import(&doc, Some("unit2"), None, ("fr", "de")).unwrap();

        let r = db.correct(2, "der Kumpel", "user").unwrap();
        assert_eq!(r.status, RecordStatus::Corrected);
        db.correct(2, "der Kumpel; der Freund", "user").unwrap();

        let history = db.corrections_for(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].old_translation, "der Freund");
        assert_eq!(history[1].old_translation, "der Kumpel");

        let exported = db.export(&[RecordStatus::Corrected], DeckHeader::new("D", "N"));
        assert_eq!(exported.entries.len(), 1);
        assert_eq!(exported.entries[0].translation, "der Kumpel; der Freund");

        assert!(matches!(db.correct(99, "x", "user"), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn deleted_entries_leave_the_default_export() {
        let (_dir, mut db, doc) = setup();
        db.import(&doc, None, None, ("fr", "de")).unwrap();

        let r = db.delete(2).unwrap();
        assert_eq!(r.status, RecordStatus::Deleted);

        let exported = db.export(&[], DeckHeader::new("D", "N"));
        let terms: Vec<_> = exported.entries.iter().map(|e| e.source_term.as_str()).collect();
        assert_eq!(terms, vec!["la plage", "la baie"]);
        assert_eq!(db.list(Some(RecordStatus::Deleted), None, 50).len(), 1);
        assert!(matches!(db.delete(99), Err(CoreError::NotFound(_))));
    }

    #[test]
    fn list_filters_and_limits() {
        let (_dir, mut db, doc) = setup();
        db.import(&doc, None, None, ("fr", "de")).unwrap();
        db.record_validation(3, Some("Bucht"), Some(0.9), RecordStatus::Valid).unwrap();

        assert_eq!(db.list(None, None, 50).len(), 3);
        assert_eq!(db.list(None, None, 2).len(), 2);
        assert_eq!(db.list(Some(RecordStatus::Valid), None, 50)[0].source_term, "la baie");
        assert!(db.list(None, Some("other"), 50).is_empty());
    }

    #[test]
    fn find_candidates_looks_below_the_term() {
        let (_dir, mut db, doc) = setup();
        db.import(&doc, None, None, ("fr", "de")).unwrap();

        let report = db.find_candidates(1, "la plage [laplaʒ]\nStrand, Küste\nle copain").unwrap();
        assert_eq!(report.contexts.len(), 1);
        assert_eq!(report.candidates, vec!["Strand, Küste".to_string()]);
    }

    #[test]
    fn stats_and_persistence() {
        let (dir, mut db, doc) = setup();
        db.import(&doc, None, None, ("fr", "de")).unwrap();
        db.correct(1, "der Sandstrand", "user").unwrap();
        db.save().unwrap();

        let reopened = VocabularyDb::open(&dir.path().join("vocabulary_db.json")).unwrap();
        let stats = reopened.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.corrections, 1);
        assert_eq!(stats.by_status.get(&RecordStatus::Corrected), Some(&1));
        assert_eq!(stats.by_status.get(&RecordStatus::Pending), Some(&2));
        assert_eq!(stats.by_source.get("anki_france_unit-2"), Some(&3));
    }

    #[test]
    fn context_is_bounded() {
        let raw = format!("{}personality{}", "a".repeat(300), "b".repeat(300));
        let ctx = ocr_context("Personality", &raw).unwrap();
        assert_eq!(ctx.chars().count(), 200 + 11 + 200);
        assert!(ocr_context("absent", "nothing here").is_none());
    }
}
