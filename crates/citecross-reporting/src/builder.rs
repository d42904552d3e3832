use citecross_core::{Subject, SubjectRegistry};

use crate::types::{Report, ReportRow};

/// Status label for a subject's total match count.
pub fn status_label(total_matches: usize) -> String {
    if total_matches == 0 {
        "Ok".to_string()
    } else {
        format!("{total_matches} citação(ões)")
    }
}

/// Summary of what matched for one subject in one candidate:
/// `variant: excerpt` entries joined by ` | `. Empty when nothing matched.
pub fn candidate_cell(subject: &Subject, candidate: &str) -> String {
    let Some(variants) = subject.matches.for_candidate(candidate) else {
        return String::new();
    };
    let mut entries = Vec::new();
    for (variant, excerpts) in variants {
        if excerpts.is_empty() {
            entries.push(variant.clone());
        }
        for excerpt in excerpts {
            entries.push(format!("{variant}: {excerpt}"));
        }
    }
    entries.join(" | ")
}

/// Flatten the registry into one row per subject, with one cell per
/// candidate in `candidate_ids` order.
pub fn build_report(registry: &SubjectRegistry, candidate_ids: &[String]) -> Report {
    let rows = registry
        .iter()
        .map(|subject| ReportRow {
            subject_name: subject.canonical_name.clone(),
            status: status_label(subject.total_matches),
            total_matches: subject.total_matches,
            cells: candidate_ids
                .iter()
                .map(|id| candidate_cell(subject, id))
                .collect(),
        })
        .collect();

    Report {
        candidate_columns: candidate_ids.to_vec(),
        rows,
    }
}
