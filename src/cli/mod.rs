use anyhow::{bail, Context};

use crate::config::{self, AppConfig};
use crate::parsers::anki::read_document;
use crate::parsers::vocabulary::VocabularyParser;
use crate::services::encoding;
use crate::services::extract::{self, ExtractOptions};
use crate::services::layout::{validation_deck, ExtractLayout, ValidateLayout};
use crate::services::ocr::AzureVisionClient;
use crate::services::report::write_report;
use crate::services::translation_memory::TranslationMemory;
use crate::services::translator::AzureTranslator;
use crate::services::validate::Validator;
use crate::services::vocabulary_db::VocabularyDb;
use crate::services::writer::{write_document, WriteOutcome};

mod command;
mod db;

pub use command::Cli;
use command::{Command, ExtractArgs, ValidateArgs};

const RULE: &str = "============================================================";

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::resolve(cli.config.as_deref())?;

    match cli.command {
        Command::Extract(args) => extract(&config, args),
        Command::Validate(args) => validate(&config, args),
        Command::Db(args) => db::run(&config, args),
    }
}

fn extract(config: &AppConfig, args: ExtractArgs) -> anyhow::Result<()> {
    let layout = ExtractLayout::new(&args.folder, args.output.as_deref(), args.deck.as_deref());

    let mut tags = config.deck.tags.clone();
    tags.extend(args.tags.iter().cloned());

    let notetype = args.notetype.as_deref().unwrap_or(&config.deck.notetype);

    println!("{RULE}");
    println!("Input folder: {}", args.folder.display());
    println!("Output file:  {}", layout.output_file.display());
    println!("Deck name:    {}", layout.deck);
    println!("Language:     {}", args.language);
    println!("{RULE}");

    let options = ExtractOptions {
        layout: &layout,
        notetype,
        html: config.deck.html,
        save_raw: args.raw,
        force: args.force,
        reset: args.reset,
    };

    // an existing import file is kept without needing OCR credentials
    if let Some(path) = extract::existing_output(&options) {
        println!("Output file already exists: {}", path.display());
        println!("Use --force to overwrite or --reset to start fresh.");
        return Ok(());
    }

    let ocr = AzureVisionClient::new(&config.ocr)?;
    let parser = VocabularyParser::new(args.language, &config.parser, &tags);

    let report = extract::run(&args.folder, &ocr, &parser, &options)?;

    for (image, count) in &report.per_image {
        println!("  {}: {count} entries", image.display());
    }
    if let Some(raw) = &report.raw_file {
        println!("Raw text saved to: {}", raw.display());
    }

    match report.write {
        Some(WriteOutcome::Written { path, entries }) => {
            println!(
                "Images: {} ({} failed), lines: {}, entries parsed: {}",
                report.images, report.failed, report.lines, report.parsed
            );
            println!("Created: {}", path.display());
            println!("Entries: {entries} vocabulary cards");
        }
        Some(WriteOutcome::Skipped { path }) => {
            println!("Output file already exists: {}", path.display());
            println!("Use --force to overwrite or --reset to start fresh.");
        }
        None => {
            println!("No vocabulary entries could be parsed; check the raw text.");
        }
    }

    Ok(())
}

fn validate(config: &AppConfig, args: ValidateArgs) -> anyhow::Result<()> {
    if !args.file.exists() {
        bail!("file not found: {}", args.file.display());
    }

    let doc = read_document(&args.file)
        .with_context(|| format!("reading {}", args.file.display()))?;
    if doc.entries.is_empty() {
        bail!("no vocabulary entries in {}", args.file.display());
    }

    let layout = ValidateLayout::new(&args.file, args.output.as_deref());

    let raw_path = args.raw.clone().unwrap_or_else(|| layout.raw_candidate.clone());
    let raw_text = if raw_path.exists() {
        let text = encoding::read_text(&raw_path)?;
        println!("Raw OCR text: {} ({} characters)", raw_path.display(), text.chars().count());
        Some(text)
    } else {
        if args.raw.is_some() {
            log::warn!("[VALIDATE] raw file {} not found", raw_path.display());
        }
        None
    };

    let mut settings = config.validation.clone();
    if let Some(from) = &args.from_lang {
        settings.source_lang = from.clone();
    }
    if let Some(to) = &args.to_lang {
        settings.target_lang = to.clone();
    }
    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    let languages = (settings.source_lang.clone(), settings.target_lang.clone());

    println!("{RULE}");
    println!("Input file:  {}", args.file.display());
    println!("Languages:   {} -> {}", languages.0, languages.1);
    println!("Threshold:   {}", settings.threshold);
    println!("Entries:     {}", doc.entries.len());
    println!("{RULE}");

    let translator = AzureTranslator::new(&config.translator)?;
    let memory = if args.no_memory {
        None
    } else {
        let tm = TranslationMemory::open(&config.storage.translation_memory);
        println!("Translation memory: {} entries", tm.len());
        Some(tm)
    };

    let mut run = Validator::new(&translator, settings, memory).validate(&doc, raw_text.as_deref());

    run.document.header.deck = match args.deck.as_deref() {
        Some(deck) => deck.to_string(),
        None => validation_deck(&doc.header.deck, &args.file),
    };

    write_report(&run, &layout.report_file)?;

    println!("Valid:       {}", run.valid().count());
    println!("Suspicious:  {}", run.suspicious().count());
    println!("Errors:      {}", run.errors().count());
    println!("Annotated:   {}", run.annotated());
    println!("Report:      {}", layout.report_file.display());

    match write_document(&run.document, &layout.final_file, args.force)? {
        WriteOutcome::Written { path, .. } => println!("Final file:  {}", path.display()),
        WriteOutcome::Skipped { path } => {
            println!("Final file already exists: {} (use --force)", path.display())
        }
    }

    if args.record {
        let mut db = VocabularyDb::open(&config.storage.vocabulary_db)?;
        let source = args
            .file
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let raw = raw_path.exists().then_some(raw_path.as_path());

        db.import(&args.file, Some(&source), raw, (languages.0.as_str(), languages.1.as_str()))?;
        let updated = db.apply_validation(&run, &source)?;
        db.save()?;
        println!("Database:    {updated} entries updated");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::line_kind::Language;
    use std::fs;

    #[test]
    fn extract_keeps_existing_output_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let folder = dir.path().join("unit-1");
        fs::create_dir_all(&folder).unwrap();
        fs::write(folder.join("p1.jpg"), b"img").unwrap();

        let out = dir.path().join("output");
        let layout = ExtractLayout::new(&folder, Some(out.as_path()), None);
        fs::create_dir_all(&out).unwrap();
        fs::write(&layout.output_file, "#separator:Tab\n").unwrap();

        let args = ExtractArgs {
            folder: folder.clone(),
            language: Language::English,
            deck: None,
            notetype: None,
            output: Some(out),
            raw: false,
            force: false,
            reset: false,
            tags: Vec::new(),
        };
        let config = AppConfig::default();
        assert!(config.ocr.api_key.is_empty());

        extract(&config, args).unwrap();
        assert_eq!(fs::read_to_string(&layout.output_file).unwrap(), "#separator:Tab\n");
    }
}
