//! Cache of translation-service answers, consulted before the service is called.

mod hash;
mod matcher;
mod model;
mod normalize;
mod store;

use std::path::{Path, PathBuf};

use crate::error::Result;

use model::TmEntry;

pub struct TranslationMemory {
    path: PathBuf,
    entries: Vec<TmEntry>,
    dirty: bool,
}

impl TranslationMemory {
    pub fn open(path: &Path) -> Self {
        let entries = store::load(path);
        log::debug!("[TM] {} entries from {}", entries.len(), path.display());
        Self {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        }
    }

    pub fn lookup(&self, source_lang: &str, target_lang: &str, original: &str) -> Option<&str> {
        matcher::exact_match(&self.entries, source_lang, target_lang, original)
            .map(|e| e.translation.as_str())
    }

    pub fn insert(&mut self, source_lang: &str, target_lang: &str, original: &str, translation: &str) {
        if original.trim().is_empty() || translation.trim().is_empty() {
            return;
        }
        self.entries
            .push(TmEntry::new(source_lang, target_lang, original, translation));
        self.dirty = true;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Writes the file when something was inserted since opening.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        store::save(&self.path, &self.entries)?;
        self.dirty = false;
        log::info!("[TM] saved {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_lookup_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("translation_memory.json");

        let mut tm = TranslationMemory::open(&path);
        assert_eq!(tm.len(), 0);
        tm.insert("en", "de", "to disagree (with)", "widersprechen");
        assert_eq!(tm.lookup("en", "de", "To disagree with"), Some("widersprechen"));
        tm.save().unwrap();

        let reopened = TranslationMemory::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.lookup("en", "de", "to disagree (with)"), Some("widersprechen"));
        assert_eq!(reopened.lookup("en", "fr", "to disagree (with)"), None);
    }

    #[test]
    fn save_without_changes_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tm.json");
        TranslationMemory::open(&path).save().unwrap();
        assert!(!path.exists());
    }
}
