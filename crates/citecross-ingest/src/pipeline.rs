use std::path::Path;

use citecross_core::{
    CandidateDocument, ComparisonStats, CrossReferenceMatcher, PdfBackend, ProgressEvent,
    SkipReason, SubjectRegistry,
};
use citecross_parsing::NameParser;

use crate::{IngestError, TextExtractor, list_pdfs};

/// Result of comparing a subjects directory against a candidates directory.
#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub registry: SubjectRegistry,
    /// Every candidate file considered, in scan order (readable or not).
    pub candidate_ids: Vec<String>,
    pub stats: ComparisonStats,
}

/// Sequential comparison run: load subjects, then scan candidates one at a
/// time against the registry.
pub struct Comparison<'a> {
    extractor: TextExtractor<'a>,
    parser: NameParser,
    matcher: CrossReferenceMatcher,
}

impl<'a> Comparison<'a> {
    pub fn new(backend: &'a dyn PdfBackend) -> Self {
        Self {
            extractor: TextExtractor::new(backend),
            parser: NameParser::new(),
            matcher: CrossReferenceMatcher::new(),
        }
    }

    pub fn with_parser(mut self, parser: NameParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_matcher(mut self, matcher: CrossReferenceMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Run the whole comparison. Both directories are listed before any
    /// document is opened, so a bad path fails before work is done.
    pub fn run(
        &self,
        candidates_dir: &Path,
        subjects_dir: &Path,
        mut progress: impl FnMut(ProgressEvent),
    ) -> Result<ComparisonOutcome, IngestError> {
        let subject_files = list_pdfs(subjects_dir)?;
        let candidate_files = list_pdfs(candidates_dir)?;

        let mut stats = ComparisonStats::default();
        let mut registry = self.load_subjects(&subject_files, &mut stats, &mut progress);
        let candidate_ids =
            self.scan_candidates(&candidate_files, &mut registry, &mut stats, &mut progress);

        tracing::info!(
            subjects = stats.subjects_registered,
            candidates = stats.candidates_scanned,
            hits = stats.total_hits,
            unreadable = stats.unreadable,
            "comparison finished"
        );

        Ok(ComparisonOutcome {
            registry,
            candidate_ids,
            stats,
        })
    }

    /// Extract and parse every subject document into a registry.
    pub fn load_subjects(
        &self,
        files: &[impl AsRef<Path>],
        stats: &mut ComparisonStats,
        progress: &mut impl FnMut(ProgressEvent),
    ) -> SubjectRegistry {
        let mut registry = SubjectRegistry::new();

        for path in files {
            let path = path.as_ref();
            let file = file_label(path);
            stats.subject_files += 1;

            let extracted = self.extractor.extract(path);
            if let Some(message) = extracted.failure.clone() {
                stats.unreadable += 1;
                progress(ProgressEvent::ExtractionFailed {
                    file: file.clone(),
                    message,
                });
            }

            let skip = |stats: &mut ComparisonStats, reason: SkipReason| {
                stats.subjects_skipped += 1;
                tracing::info!(file = %file, reason = reason.as_str(), "subject document skipped");
                ProgressEvent::SubjectSkipped {
                    file: file.clone(),
                    reason,
                }
            };

            if extracted.is_empty() {
                progress(skip(stats, SkipReason::NoText));
                continue;
            }

            let parsed = self.parser.parse(&extracted.text);
            if parsed.canonical_name.is_none() {
                progress(skip(stats, SkipReason::NoCanonicalName));
                continue;
            }
            let Some(subject) = parsed.into_subject() else {
                progress(skip(stats, SkipReason::NoCitationVariants));
                continue;
            };

            let event = ProgressEvent::SubjectRegistered {
                file: file.clone(),
                name: subject.canonical_name.clone(),
                variants: subject.citation_variants().len(),
            };
            tracing::debug!(file = %file, subject = %subject.canonical_name, "subject registered");
            if registry.register(subject).is_some() {
                stats.subjects_replaced += 1;
            }
            progress(event);
        }

        stats.subjects_registered = registry.len();
        registry
    }

    /// Extract each candidate in turn and scan it against the registry.
    /// Returns the candidate ids in scan order.
    pub fn scan_candidates(
        &self,
        files: &[impl AsRef<Path>],
        registry: &mut SubjectRegistry,
        stats: &mut ComparisonStats,
        progress: &mut impl FnMut(ProgressEvent),
    ) -> Vec<String> {
        let total = files.len();
        let mut ids = Vec::with_capacity(total);
        progress(ProgressEvent::ScanningCandidates { total });

        for (index, path) in files.iter().enumerate() {
            let path = path.as_ref();
            stats.candidate_files += 1;

            let extracted = self.extractor.extract(path);
            let candidate = CandidateDocument::new(path.to_path_buf(), extracted.text);
            ids.push(candidate.id.clone());

            if let Some(message) = extracted.failure {
                stats.unreadable += 1;
                progress(ProgressEvent::ExtractionFailed {
                    file: candidate.id.clone(),
                    message,
                });
            }

            let hits = if candidate.text.trim().is_empty() {
                0
            } else {
                stats.candidates_scanned += 1;
                self.matcher.scan(registry, &candidate)
            };
            stats.total_hits += hits;

            progress(ProgressEvent::CandidateScanned {
                index,
                total,
                file: candidate.id,
                hits,
            });
        }

        ids
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
