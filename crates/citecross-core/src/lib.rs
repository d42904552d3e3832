use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

pub mod backend;
pub mod config_file;
pub mod matching;
pub mod registry;
pub mod text_utils;

// Re-export for convenience
pub use backend::{BackendError, PdfBackend};
pub use matching::{CrossReferenceMatcher, MatchingConfig, MatchingConfigBuilder, MatchingError};
pub use registry::SubjectRegistry;

/// Excerpts recorded for one candidate, keyed by the variant that matched.
pub type VariantExcerpts = BTreeMap<String, Vec<String>>;

/// Nested accumulation of hits: candidate id → variant → context excerpts.
///
/// Writes go through [`MatchRecord::entry`], which creates missing levels
/// empty. Reads never create anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchRecord {
    by_candidate: BTreeMap<String, VariantExcerpts>,
}

impl MatchRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Excerpt list for `(candidate, variant)`, created empty if missing.
    pub fn entry(&mut self, candidate: &str, variant: &str) -> &mut Vec<String> {
        self.by_candidate
            .entry(candidate.to_string())
            .or_default()
            .entry(variant.to_string())
            .or_default()
    }

    /// Variants (and their excerpts) matched in `candidate`, if any.
    pub fn for_candidate(&self, candidate: &str) -> Option<&VariantExcerpts> {
        self.by_candidate.get(candidate)
    }

    /// Excerpts for `(candidate, variant)`; empty when nothing was recorded.
    pub fn excerpts(&self, candidate: &str, variant: &str) -> &[String] {
        self.by_candidate
            .get(candidate)
            .and_then(|v| v.get(variant))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Candidate ids with at least one recorded hit, sorted.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.by_candidate.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.by_candidate.is_empty()
    }
}

/// A person whose citation variants are searched for in candidate documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub canonical_name: String,
    citation_variants: BTreeSet<String>,
    pub total_matches: usize,
    pub matches: MatchRecord,
}

impl Subject {
    /// Build a subject. Returns `None` when no non-blank variant remains.
    pub fn new(
        canonical_name: impl Into<String>,
        variants: impl IntoIterator<Item = String>,
    ) -> Option<Self> {
        let citation_variants: BTreeSet<String> = variants
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect();
        if citation_variants.is_empty() {
            return None;
        }
        Some(Self {
            canonical_name: canonical_name.into(),
            citation_variants,
            total_matches: 0,
            matches: MatchRecord::new(),
        })
    }

    pub fn citation_variants(&self) -> &BTreeSet<String> {
        &self.citation_variants
    }

    pub fn has_matches(&self) -> bool {
        self.total_matches > 0
    }
}

/// A scanned document and the text extracted from it.
#[derive(Debug, Clone)]
pub struct CandidateDocument {
    /// File name, used as the report column header.
    pub id: String,
    pub path: PathBuf,
    pub text: String,
}

impl CandidateDocument {
    pub fn new(path: PathBuf, text: String) -> Self {
        let id = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Self { id, path, text }
    }
}

/// Why a subject document did not produce a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoText,
    NoCanonicalName,
    NoCitationVariants,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoText => "no extractable text",
            SkipReason::NoCanonicalName => "no \"Nome\" field",
            SkipReason::NoCitationVariants => "no citation names",
        }
    }
}

/// Progress events emitted while comparing two directories.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    SubjectRegistered {
        file: String,
        name: String,
        variants: usize,
    },
    SubjectSkipped {
        file: String,
        reason: SkipReason,
    },
    ExtractionFailed {
        file: String,
        message: String,
    },
    ScanningCandidates {
        total: usize,
    },
    CandidateScanned {
        index: usize,
        total: usize,
        file: String,
        hits: usize,
    },
}

/// Counters for a complete comparison run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonStats {
    pub subject_files: usize,
    pub subjects_registered: usize,
    /// Earlier documents displaced by a later one with the same canonical
    /// name. `registered + replaced + skipped == subject_files`.
    pub subjects_replaced: usize,
    pub subjects_skipped: usize,
    pub candidate_files: usize,
    pub candidates_scanned: usize,
    pub unreadable: usize,
    pub total_hits: usize,
}
