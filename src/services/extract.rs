//! First pass: images in a folder → OCR → parser → import document.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::model::document::{DeckHeader, OutputDocument};
use crate::model::ocr::ExtractionResult;
use crate::parsers::vocabulary::{dedup_entries, VocabularyParser};

use super::files::write_atomic;
use super::layout::ExtractLayout;
use super::ocr::OcrService;
use super::writer::{write_document, WriteOutcome};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif"];

pub struct ExtractOptions<'a> {
    pub layout: &'a ExtractLayout,
    pub notetype: &'a str,
    pub html: bool,
    pub save_raw: bool,
    pub force: bool,
    pub reset: bool,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub images: usize,
    pub failed: usize,
    pub lines: usize,
    pub parsed: usize,
    /// Entries parsed from each recognized image, before duplicates are removed.
    pub per_image: Vec<(PathBuf, usize)>,
    pub raw_file: Option<PathBuf>,
    /// `None` when nothing could be parsed.
    pub write: Option<WriteOutcome>,
}

/// Image files directly inside `folder`, sorted by name.
pub fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(CoreError::NotFound(format!(
            "input folder {} does not exist",
            folder.display()
        )));
    }

    let mut images: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_image(p))
        .collect();
    images.sort();

    if images.is_empty() {
        return Err(CoreError::NotFound(format!(
            "no image files in {}",
            folder.display()
        )));
    }
    Ok(images)
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Deletes the regular files in `dir`; returns how many were removed.
pub fn reset_output(dir: &Path) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0usize;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path)?;
            log::info!("[EXTRACT] deleted {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}

/// OCR of every image; failures are logged and skipped.
pub fn recognize_all(ocr: &dyn OcrService, images: &[PathBuf]) -> (Vec<ExtractionResult>, usize) {
    let mut pages = Vec::with_capacity(images.len());
    let mut failed = 0usize;

    for (i, image) in images.iter().enumerate() {
        match ocr.recognize(image) {
            Ok(page) => {
                log::info!(
                    "[OCR] [{}/{}] {}: {} lines",
                    i + 1,
                    images.len(),
                    image.display(),
                    page.lines.len()
                );
                pages.push(page);
            }
            Err(e) => {
                log::warn!("[OCR] [{}/{}] {} failed: {e}", i + 1, images.len(), image.display());
                failed += 1;
            }
        }
    }

    (pages, failed)
}

/// The import file that stays untouched: it exists and neither force nor reset is set.
pub fn existing_output<'a>(opts: &ExtractOptions<'a>) -> Option<&'a Path> {
    let file = opts.layout.output_file.as_path();
    (!opts.force && !opts.reset && file.exists()).then_some(file)
}

pub fn run(
    folder: &Path,
    ocr: &dyn OcrService,
    parser: &VocabularyParser,
    opts: &ExtractOptions,
) -> Result<ExtractReport> {
    let layout = opts.layout;
    let images = list_images(folder)?;

    if opts.reset {
        let removed = reset_output(&layout.output_dir)?;
        log::info!("[EXTRACT] reset removed {removed} files");
    } else if let Some(path) = existing_output(opts) {
        // skip before paying for OCR
        return Ok(ExtractReport {
            write: Some(WriteOutcome::Skipped {
                path: path.to_path_buf(),
            }),
            ..ExtractReport::default()
        });
    }

    fs::create_dir_all(&layout.output_dir)?;

    let (pages, failed) = recognize_all(ocr, &images);
    let lines = pages.iter().map(|p| p.lines.len()).sum();

    let mut parsed = Vec::new();
    let mut per_image = Vec::with_capacity(pages.len());
    for page in &pages {
        let entries = parser.parse(page);
        log::info!("[EXTRACT] {}: {} entries", page.image_path.display(), entries.len());
        per_image.push((page.image_path.clone(), entries.len()));
        parsed.extend(entries);
    }
    let parsed_count = parsed.len();
    let entries = dedup_entries(parsed);
    log::info!(
        "[EXTRACT] {} entries parsed, {} after removing duplicates",
        parsed_count,
        entries.len()
    );

    let mut report = ExtractReport {
        images: images.len(),
        failed,
        lines,
        parsed: entries.len(),
        per_image,
        ..ExtractReport::default()
    };

    // the raw dump is kept when parsing found nothing so the text can be fixed by hand
    if opts.save_raw || entries.is_empty() {
        let raw: Vec<&str> = pages.iter().flat_map(|p| p.texts()).collect();
        write_atomic(&layout.raw_file, raw.join("\n").as_bytes())?;
        report.raw_file = Some(layout.raw_file.clone());
    }

    if entries.is_empty() {
        log::warn!("[EXTRACT] no vocabulary entries could be parsed");
        return Ok(report);
    }

    let mut header = DeckHeader::new(layout.deck.clone(), opts.notetype);
    header.html = opts.html;
    let doc = OutputDocument::new(header, entries);

    report.write = Some(write_document(&doc, &layout.output_file, opts.force || opts.reset)?);
    Ok(report)
}
