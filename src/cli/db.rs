use anyhow::Context;

use crate::config::AppConfig;
use crate::model::document::DeckHeader;
use crate::services::encoding;
use crate::services::vocabulary_db::VocabularyDb;
use crate::services::writer::{write_document, WriteOutcome};

use super::command::{DbArgs, DbCommand};

pub fn run(config: &AppConfig, args: DbArgs) -> anyhow::Result<()> {
    let path = args
        .db
        .clone()
        .unwrap_or_else(|| config.storage.vocabulary_db.clone());
    let mut db = VocabularyDb::open(&path)
        .with_context(|| format!("opening database {}", path.display()))?;

    match args.command {
        DbCommand::Import { file, source, raw } => {
            let languages = (
                config.validation.source_lang.as_str(),
                config.validation.target_lang.as_str(),
            );
            let summary = db.import(&file, source.as_deref(), raw.as_deref(), languages)?;
            db.save()?;
            println!("Imported {} entries from {}", summary.imported, file.display());
            if summary.skipped > 0 {
                println!("Skipped {} duplicates", summary.skipped);
            }
        }

        DbCommand::List {
            status,
            source,
            limit,
        } => {
            let rows = db.list(status, source.as_deref(), limit);
            println!(
                "{:<5} {:<12} {:<25} {:<30} {:<20}",
                "ID", "STATUS", "TERM", "TRANSLATION", "CORRECTED"
            );
            for r in &rows {
                println!(
                    "{:<5} {:<12} {:<25} {:<30} {:<20}",
                    r.id,
                    r.status.as_str(),
                    clip(&r.source_term, 24),
                    clip(&r.translation, 29),
                    clip(r.corrected_translation.as_deref().unwrap_or(""), 19)
                );
            }
            println!("\n{} entries", rows.len());
        }

        DbCommand::Correct { id, translation } => {
            let record = db.correct(id, &translation, "user")?;
            println!(
                "Corrected {}: {} -> {}",
                record.id, record.source_term, record.effective_translation()
            );
            println!("History: {} correction(s)", db.corrections_for(id).len());
            db.save()?;
        }

        DbCommand::Delete { id } => {
            let record = db.delete(id)?;
            println!("Marked as deleted: {} {}", record.id, record.source_term);
            db.save()?;
        }

        DbCommand::FindMatch { id, raw } => {
            let text = encoding::read_text(&raw)
                .with_context(|| format!("reading raw text {}", raw.display()))?;
            let report = db.find_candidates(id, &text)?;

            if report.contexts.is_empty() {
                println!("No matches found in raw OCR text");
            } else {
                println!("Found {} potential match(es):\n", report.contexts.len());
                for (i, (line, context)) in report.contexts.iter().take(5).enumerate() {
                    println!("--- Match {} (line {}) ---", i + 1, line + 1);
                    println!("{context}\n");
                }
            }
            if !report.candidates.is_empty() {
                println!("Potential translations:");
                for (i, c) in report.candidates.iter().take(5).enumerate() {
                    println!("  {}. {c}", i + 1);
                }
            }
        }

        DbCommand::Export {
            output,
            status,
            deck,
            force,
        } => {
            let header = DeckHeader {
                html: config.deck.html,
                ..DeckHeader::new(deck, config.deck.notetype.clone())
            };
            let doc = db.export(&status, header);
            match write_document(&doc, &output, force)? {
                WriteOutcome::Written { path, entries } => {
                    println!("Exported {entries} entries to {}", path.display())
                }
                WriteOutcome::Skipped { path } => {
                    println!("{} already exists (use --force)", path.display())
                }
            }
        }

        DbCommand::Stats => {
            let stats = db.stats();
            println!("Total entries: {}", stats.total);
            println!("\nBy status:");
            for (status, count) in &stats.by_status {
                println!("  {:<15} {:>5}", status.as_str(), count);
            }
            println!("\nBy source:");
            for (source, count) in &stats.by_source {
                println!("  {source:<25} {count:>5}");
            }
            println!("\nCorrections: {}", stats.corrections);
        }
    }

    Ok(())
}

fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
