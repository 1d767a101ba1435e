use std::{collections::HashMap, fs, path::Path};

use super::model::TmEntry;
use super::{hash, normalize};
use crate::error::Result;
use crate::services::files::write_atomic;

/// Reads the memory file; a missing or unreadable file yields an empty memory.
/// Old entries without normalized/hash fields are migrated and the file rewritten.
pub fn load(path: &Path) -> Vec<TmEntry> {
    if !path.exists() {
        return Vec::new();
    }

    let data = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            log::warn!("[TM] failed to read {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut entries: Vec<TmEntry> = match serde_json::from_str(&data) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("[TM] failed to parse {}: {e}", path.display());
            return Vec::new();
        }
    };

    let mut migrated = false;

    for e in entries.iter_mut() {
        migrated |= ensure_norm_hash(e);
    }

    let (mut final_entries, removed) = dedup(entries);
    if removed > 0 {
        log::debug!("[TM] dropped {removed} duplicate entries");
        migrated = true;
    }

    sort_entries(&mut final_entries);

    if migrated {
        if let Err(e) = save(path, &final_entries) {
            log::warn!("[TM] failed to persist migration: {e}");
        }
    }

    final_entries
}

pub fn save(path: &Path, entries: &[TmEntry]) -> Result<()> {
    let mut v: Vec<TmEntry> = entries.to_vec();

    for e in v.iter_mut() {
        ensure_norm_hash(e);
    }

    let (mut v, _removed) = dedup(v);
    sort_entries(&mut v);

    let json = serde_json::to_string_pretty(&v)?;
    write_atomic(path, json.as_bytes())
}

fn ensure_norm_hash(e: &mut TmEntry) -> bool {
    let mut changed = false;

    if e.normalized.is_empty() {
        e.normalized = normalize::normalize(&e.original);
        changed = true;
    }

    if e.hash.is_empty() {
        e.hash = hash::hash_norm(&e.normalized);
        changed = true;
    }

    changed
}

fn dedup(entries: Vec<TmEntry>) -> (Vec<TmEntry>, usize) {
    let mut map: HashMap<(String, String, String), TmEntry> = HashMap::new();
    let mut removed = 0usize;

    for mut e in entries {
        ensure_norm_hash(&mut e);

        let key = (e.source_lang.clone(), e.target_lang.clone(), e.hash.clone());

        match map.get_mut(&key) {
            None => {
                map.insert(key, e);
            }
            Some(existing) => {
                if pick_better(existing, &e) {
                    *existing = e;
                }
                removed += 1;
            }
        }
    }

    (map.into_values().collect(), removed)
}

fn pick_better(current: &TmEntry, candidate: &TmEntry) -> bool {
    let cur_empty = current.translation.trim().is_empty();
    let cand_empty = candidate.translation.trim().is_empty();

    if cur_empty && !cand_empty {
        return true;
    }
    if !cur_empty && cand_empty {
        return false;
    }

    candidate.translation.len() > current.translation.len()
}

fn sort_entries(entries: &mut [TmEntry]) {
    entries.sort_by(|a, b| {
        (
            a.source_lang.as_str(),
            a.target_lang.as_str(),
            a.normalized.as_str(),
            a.translation.as_str(),
        )
            .cmp(&(
                b.source_lang.as_str(),
                b.target_lang.as_str(),
                b.normalized.as_str(),
                b.translation.as_str(),
            ))
    });
}
