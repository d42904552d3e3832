use std::io::Write;
use std::path::Path;

use citecross_core::{ComparisonStats, ProgressEvent, SubjectRegistry};
use citecross_parsing::ParsedNames;
use citecross_reporting::status_label;
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Print a progress event as a single line.
pub fn print_progress(
    w: &mut dyn Write,
    event: &ProgressEvent,
    color: ColorMode,
) -> std::io::Result<()> {
    match event {
        ProgressEvent::SubjectRegistered {
            file,
            name,
            variants,
        } => {
            writeln!(w, "Loaded {} ({} citation names) from {}", name, variants, file)?;
        }
        ProgressEvent::SubjectSkipped { file, reason } => {
            if color.enabled() {
                writeln!(w, "{} {}: {}", "SKIPPED".yellow(), file, reason.as_str())?;
            } else {
                writeln!(w, "SKIPPED {}: {}", file, reason.as_str())?;
            }
        }
        ProgressEvent::ExtractionFailed { file, message } => {
            if color.enabled() {
                writeln!(w, "{} {}: {}", "UNREADABLE".red(), file, message)?;
            } else {
                writeln!(w, "UNREADABLE {}: {}", file, message)?;
            }
        }
        ProgressEvent::ScanningCandidates { total } => {
            writeln!(w)?;
            writeln!(w, "Scanning {} candidate documents...", total)?;
        }
        ProgressEvent::CandidateScanned {
            index,
            total,
            file,
            hits,
        } => {
            let line = format!("[{}/{}] {} -> {} hit(s)", index + 1, total, file, hits);
            if color.enabled() && *hits > 0 {
                writeln!(w, "{}", line.yellow())?;
            } else {
                writeln!(w, "{}", line)?;
            }
        }
    }
    Ok(())
}

/// Print the result of parsing one subject document.
pub fn print_parsed_names(
    w: &mut dyn Write,
    file_name: &str,
    names: &ParsedNames,
    color: ColorMode,
) -> std::io::Result<()> {
    if color.enabled() {
        writeln!(w, "{} {}\n", "NAMES:".bold().cyan(), file_name.bold())?;
    } else {
        writeln!(w, "NAMES: {}\n", file_name)?;
    }

    match names.canonical_name {
        Some(ref name) => writeln!(w, "  Name:      {}", name)?,
        None => writeln!(w, "  Name:      (not found)")?,
    }
    if names.citation_variants.is_empty() {
        writeln!(w, "  Citations: (not found)")?;
    } else {
        writeln!(w, "  Citations:")?;
        for variant in &names.citation_variants {
            writeln!(w, "    - {}", variant)?;
        }
    }
    writeln!(w)?;

    let missing = match (&names.canonical_name, names.citation_variants.is_empty()) {
        (Some(_), false) => None,
        (None, false) => Some("canonical name"),
        (Some(_), true) => Some("citation names"),
        (None, true) => Some("canonical name and citation names"),
    };
    match missing {
        None => {
            if color.enabled() {
                writeln!(w, "{}", "Document would be registered.".green())?;
            } else {
                writeln!(w, "Document would be registered.")?;
            }
        }
        Some(what) => {
            let msg = format!("Document would be skipped: missing {}.", what);
            if color.enabled() {
                writeln!(w, "{}", msg.red())?;
            } else {
                writeln!(w, "{}", msg)?;
            }
        }
    }
    Ok(())
}

/// Print the end-of-run summary: counters, then one line per subject.
pub fn print_summary(
    w: &mut dyn Write,
    registry: &SubjectRegistry,
    stats: &ComparisonStats,
    report_path: &Path,
    color: ColorMode,
) -> std::io::Result<()> {
    writeln!(w)?;
    if color.enabled() {
        writeln!(w, "{}", "═══ SUMMARY ═══".bold())?;
    } else {
        writeln!(w, "=== SUMMARY ===")?;
    }
    if stats.subjects_replaced > 0 {
        writeln!(
            w,
            "Subjects:   {} loaded, {} replaced by duplicates, {} skipped ({} files)",
            stats.subjects_registered,
            stats.subjects_replaced,
            stats.subjects_skipped,
            stats.subject_files
        )?;
    } else {
        writeln!(
            w,
            "Subjects:   {} loaded, {} skipped ({} files)",
            stats.subjects_registered, stats.subjects_skipped, stats.subject_files
        )?;
    }
    writeln!(
        w,
        "Candidates: {} scanned, {} unreadable ({} files)",
        stats.candidates_scanned, stats.unreadable, stats.candidate_files
    )?;
    writeln!(w, "Hits:       {}", stats.total_hits)?;
    writeln!(w)?;

    let width = registry
        .iter()
        .map(|s| s.canonical_name.chars().count())
        .max()
        .unwrap_or(0);
    for subject in registry.iter() {
        let name = &subject.canonical_name;
        let pad = width - name.chars().count();
        let status = status_label(subject.total_matches);
        if color.enabled() {
            if subject.has_matches() {
                writeln!(w, "  {}{}  {}", name, " ".repeat(pad), status.yellow())?;
            } else {
                writeln!(w, "  {}{}  {}", name, " ".repeat(pad), status.green())?;
            }
        } else {
            writeln!(w, "  {}{}  {}", name, " ".repeat(pad), status)?;
        }
    }
    if !registry.is_empty() {
        writeln!(w)?;
    }

    writeln!(w, "Report written to {}", report_path.display())?;
    Ok(())
}
