//! Markdown report of a validation run.

use std::fmt::Write as _;
use std::path::Path;

use crate::error::Result;

use super::files::write_atomic;
use super::validate::{EntryResult, ValidationOutcome, ValidationRun};

const SAMPLE_VALID: usize = 10;

pub fn render_report(run: &ValidationRun) -> String {
    let valid: Vec<&EntryResult> = run.valid().collect();
    let suspicious: Vec<&EntryResult> = run.suspicious().collect();
    let errors: Vec<&EntryResult> = run.errors().collect();

    let mut out = String::new();
    out.push_str("# Vocabulary Validation Report\n\n");
    let _ = writeln!(out, "**Total entries:** {}", run.results.len());
    let _ = writeln!(out, "**Valid:** {}", valid.len());
    let _ = writeln!(out, "**Suspicious:** {}", suspicious.len());
    let _ = writeln!(out, "**Errors:** {}", errors.len());
    let _ = writeln!(out, "**Annotated:** {}\n", run.annotated());

    if !suspicious.is_empty() {
        out.push_str("## Suspicious Entries (Manual Review Needed)\n\n");
        out.push_str("| # | Source Term | Stored Translation | Translator Result | Similarity | In Raw Text | Reason |\n");
        out.push_str("|---|-------------|--------------------|-------------------|------------|-------------|--------|\n");

        for (i, r) in suspicious.iter().enumerate() {
            if let ValidationOutcome::Suspicious {
                alternative,
                similarity,
                reason,
            } = &r.outcome
            {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {} | {:.2} | {} | {} |",
                    i + 1,
                    cell(&r.source_term),
                    cell(&r.translation),
                    cell(alternative.as_deref().unwrap_or("N/A")),
                    similarity,
                    raw_flag(r.in_raw_text),
                    cell(reason),
                );
            }
        }
        out.push('\n');
    }

    if !errors.is_empty() {
        out.push_str("## Errors\n\n");
        for r in &errors {
            if let ValidationOutcome::Error { reason } = &r.outcome {
                let _ = writeln!(out, "- **{}**: {}", r.source_term, reason);
            }
        }
        out.push('\n');
    }

    out.push_str("## Valid Entries\n\n");
    let _ = writeln!(out, "{} entries passed validation.\n", valid.len());

    if !valid.is_empty() {
        out.push_str("### Sample Valid Entries\n\n");
        out.push_str("| Source Term | Stored Translation | Translator Result | Similarity |\n");
        out.push_str("|-------------|--------------------|-------------------|------------|\n");
        for r in valid.iter().take(SAMPLE_VALID) {
            if let ValidationOutcome::Valid {
                alternative,
                similarity,
            } = &r.outcome
            {
                let _ = writeln!(
                    out,
                    "| {} | {} | {} | {:.2} |",
                    cell(&r.source_term),
                    cell(&r.translation),
                    cell(alternative),
                    similarity
                );
            }
        }
    }

    out
}

pub fn write_report(run: &ValidationRun, path: &Path) -> Result<()> {
    write_atomic(path, render_report(run).as_bytes())?;
    log::info!("[REPORT] wrote {}", path.display());
    Ok(())
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn raw_flag(in_raw: Option<bool>) -> &'static str {
    match in_raw {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(term: &str, translation: &str, outcome: ValidationOutcome) -> EntryResult {
        EntryResult {
            source_term: term.into(),
            translation: translation.into(),
            outcome,
            in_raw_text: None,
        }
    }

    fn run() -> ValidationRun {
        let mut results = vec![
            result(
                "to disagree (with)",
                "anderer Meinung sein",
                ValidationOutcome::Suspicious {
                    alternative: Some("widersprechen".into()),
                    similarity: 0.12,
                    reason: "Low similarity (0.12)".into(),
                },
            ),
            result(
                "lad",
                "Junge",
                ValidationOutcome::Error {
                    reason: "HTTP 503: service unavailable".into(),
                },
            ),
        ];
        for i in 0..12 {
            results.push(result(
                &format!("term{i}"),
                &format!("Wort{i}"),
                ValidationOutcome::Valid {
                    alternative: format!("Wort{i}"),
                    similarity: 1.0,
                },
            ));
        }
        ValidationRun {
            results,
            ..ValidationRun::default()
        }
    }

    #[test]
    fn totals_and_sections() {
        let text = render_report(&run());
        assert!(text.contains("**Total entries:** 14"));
        assert!(text.contains("**Valid:** 12"));
        assert!(text.contains("**Suspicious:** 1"));
        assert!(text.contains("**Errors:** 1"));
        assert!(text.contains(
            "| 1 | to disagree (with) | anderer Meinung sein | widersprechen | 0.12 | - | Low similarity (0.12) |"
        ));
        assert!(text.contains("- **lad**: HTTP 503: service unavailable"));
    }

    #[test]
    fn valid_samples_are_capped() {
        let text = render_report(&run());
        assert!(text.contains("| term9 |"));
        assert!(!text.contains("| term10 |"));
    }

    #[test]
    fn empty_run_has_no_tables() {
        let text = render_report(&ValidationRun::default());
        assert!(text.contains("**Total entries:** 0"));
        assert!(!text.contains("## Suspicious"));
        assert!(!text.contains("### Sample"));
    }
}
