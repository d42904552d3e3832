use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::registry::SubjectRegistry;
use crate::text_utils::{collapse_whitespace, truncate_chars};
use crate::{CandidateDocument, Subject};

/// Header that opens the publication list in a Lattes CV.
static SECTION_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Artigos\s+completos\s+publicados\s+em\s+peri[óo]dicos").unwrap()
});

/// Numbered list entry: a line starting with `1.`, `12.`, ...
static ENTRY_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d{1,3}\.(?:[ \t]|$)").unwrap());

/// Headers that close a bibliography-like section.
static SECTION_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?mi)^[ \t]*(?:Refer[êe]ncias|Bibliografia)\b").unwrap());

pub const DEFAULT_MAX_EXCERPT_CHARS: usize = 300;
pub const DEFAULT_MAX_EXCERPTS_PER_VARIANT: usize = 5;

#[derive(Error, Debug)]
pub enum MatchingError {
    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}

/// Configuration for citation matching and excerpt extraction.
///
/// Regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`MatchingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub(crate) section_start_re: Option<Regex>,
    pub(crate) entry_marker_re: Option<Regex>,
    pub(crate) section_end_re: Option<Regex>,
    pub(crate) max_excerpt_chars: usize,
    pub(crate) max_excerpts_per_variant: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            section_start_re: None,
            entry_marker_re: None,
            section_end_re: None,
            max_excerpt_chars: DEFAULT_MAX_EXCERPT_CHARS,
            max_excerpts_per_variant: DEFAULT_MAX_EXCERPTS_PER_VARIANT,
        }
    }
}

impl MatchingConfig {
    fn section_start(&self) -> &Regex {
        self.section_start_re.as_ref().unwrap_or(&SECTION_START_RE)
    }

    fn entry_marker(&self) -> &Regex {
        self.entry_marker_re.as_ref().unwrap_or(&ENTRY_MARKER_RE)
    }

    fn section_end(&self) -> &Regex {
        self.section_end_re.as_ref().unwrap_or(&SECTION_END_RE)
    }

    pub fn max_excerpt_chars(&self) -> usize {
        self.max_excerpt_chars
    }
}

/// Builder for [`MatchingConfig`].
///
/// Patterns are compiled in [`build()`](Self::build), which fails fast on the
/// first invalid one.
#[derive(Debug, Clone, Default)]
pub struct MatchingConfigBuilder {
    section_start_re: Option<String>,
    entry_marker_re: Option<String>,
    section_end_re: Option<String>,
    max_excerpt_chars: Option<usize>,
    max_excerpts_per_variant: Option<usize>,
}

impl MatchingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn section_start_regex(mut self, pattern: &str) -> Self {
        self.section_start_re = Some(pattern.to_string());
        self
    }

    pub fn entry_marker_regex(mut self, pattern: &str) -> Self {
        self.entry_marker_re = Some(pattern.to_string());
        self
    }

    pub fn section_end_regex(mut self, pattern: &str) -> Self {
        self.section_end_re = Some(pattern.to_string());
        self
    }

    pub fn max_excerpt_chars(mut self, chars: usize) -> Self {
        self.max_excerpt_chars = Some(chars);
        self
    }

    pub fn max_excerpts_per_variant(mut self, count: usize) -> Self {
        self.max_excerpts_per_variant = Some(count);
        self
    }

    pub fn build(self) -> Result<MatchingConfig, MatchingError> {
        let defaults = MatchingConfig::default();
        Ok(MatchingConfig {
            section_start_re: compile("section_start", self.section_start_re)?,
            entry_marker_re: compile("entry_marker", self.entry_marker_re)?,
            section_end_re: compile("section_end", self.section_end_re)?,
            max_excerpt_chars: self
                .max_excerpt_chars
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_excerpt_chars),
            max_excerpts_per_variant: self
                .max_excerpts_per_variant
                .filter(|&n| n > 0)
                .unwrap_or(defaults.max_excerpts_per_variant),
        })
    }
}

fn compile(field: &'static str, pattern: Option<String>) -> Result<Option<Regex>, MatchingError> {
    pattern
        .map(|p| Regex::new(&p).map_err(|source| MatchingError::InvalidPattern { field, source }))
        .transpose()
}

/// Boundary positions in one text, found once and binary-searched per hit.
struct SectionIndex {
    header_ends: Vec<usize>,
    marker_starts: Vec<usize>,
    end_starts: Vec<usize>,
}

impl SectionIndex {
    fn new(config: &MatchingConfig, text: &str) -> Self {
        Self {
            header_ends: config.section_start().find_iter(text).map(|m| m.end()).collect(),
            marker_starts: config.entry_marker().find_iter(text).map(|m| m.start()).collect(),
            end_starts: config.section_end().find_iter(text).map(|m| m.start()).collect(),
        }
    }
}

fn last_at_most(positions: &[usize], bound: usize) -> Option<usize> {
    let i = positions.partition_point(|&p| p <= bound);
    i.checked_sub(1).map(|i| positions[i])
}

fn last_before(positions: &[usize], bound: usize) -> Option<usize> {
    let i = positions.partition_point(|&p| p < bound);
    i.checked_sub(1).map(|i| positions[i])
}

fn first_at_or_after(positions: &[usize], bound: usize) -> Option<usize> {
    positions.get(positions.partition_point(|&p| p < bound)).copied()
}

fn line_bounds(text: &str, start: usize, end: usize) -> (usize, usize) {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = text[end..].find('\n').map(|i| end + i).unwrap_or(text.len());
    (line_start, line_end)
}

/// Scans candidate texts for the citation variants of registered subjects.
#[derive(Debug, Clone, Default)]
pub struct CrossReferenceMatcher {
    config: MatchingConfig,
}

impl CrossReferenceMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatchingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Scan one candidate against every subject. Returns the number of new
    /// (subject, variant) hits.
    pub fn scan(&self, registry: &mut SubjectRegistry, candidate: &CandidateDocument) -> usize {
        let index = SectionIndex::new(&self.config, &candidate.text);
        registry
            .iter_mut()
            .map(|subject| self.scan_indexed(&index, subject, candidate))
            .sum()
    }

    /// Scan one candidate for one subject's variants.
    ///
    /// Each variant found adds exactly one to `total_matches`, however many
    /// times it occurs; up to `max_excerpts_per_variant` distinct excerpts
    /// are recorded.
    pub fn scan_subject(&self, subject: &mut Subject, candidate: &CandidateDocument) -> usize {
        let index = SectionIndex::new(&self.config, &candidate.text);
        self.scan_indexed(&index, subject, candidate)
    }

    fn scan_indexed(
        &self,
        index: &SectionIndex,
        subject: &mut Subject,
        candidate: &CandidateDocument,
    ) -> usize {
        let mut hits = 0;
        let variants: Vec<String> = subject.citation_variants().iter().cloned().collect();

        for variant in &variants {
            let excerpts = self.collect_excerpts(index, &candidate.text, variant);
            if excerpts.is_empty() {
                continue;
            }

            tracing::debug!(
                subject = %subject.canonical_name,
                candidate = %candidate.id,
                variant = %variant,
                excerpts = excerpts.len(),
                "citation variant found"
            );

            hits += 1;
            subject.total_matches += 1;
            let slot = subject.matches.entry(&candidate.id, variant);
            for excerpt in excerpts {
                if slot.len() >= self.config.max_excerpts_per_variant {
                    break;
                }
                if !slot.contains(&excerpt) {
                    slot.push(excerpt);
                }
            }
        }
        hits
    }

    /// Distinct context excerpts for the occurrences of `variant` in `text`,
    /// in text order, at most `max_excerpts_per_variant` of them. Empty when
    /// the variant does not occur.
    pub fn excerpts_for(&self, text: &str, variant: &str) -> Vec<String> {
        let index = SectionIndex::new(&self.config, text);
        self.collect_excerpts(&index, text, variant)
    }

    fn collect_excerpts(&self, index: &SectionIndex, text: &str, variant: &str) -> Vec<String> {
        let mut excerpts = Vec::new();
        if variant.is_empty() {
            return excerpts;
        }
        for (start, m) in text.match_indices(variant) {
            let excerpt = self.excerpt_in(index, text, start, start + m.len());
            if !excerpts.contains(&excerpt) {
                excerpts.push(excerpt);
                if excerpts.len() >= self.config.max_excerpts_per_variant {
                    break;
                }
            }
        }
        excerpts
    }

    /// Bounded section entry around the occurrence at `start..end`, at most
    /// `max_excerpt_chars` characters including any `...` markers.
    pub fn excerpt_at(&self, text: &str, start: usize, end: usize) -> String {
        let index = SectionIndex::new(&self.config, text);
        self.excerpt_in(&index, text, start, end)
    }

    fn excerpt_in(&self, index: &SectionIndex, text: &str, start: usize, end: usize) -> String {
        let max = self.config.max_excerpt_chars;
        let (mut lo, mut hi) = self.entry_bounds(index, text, start, end);

        // Keep the occurrence itself inside the truncated excerpt
        let keep_before = max / 2;
        let clipped = match text[lo..start].char_indices().rev().nth(keep_before) {
            Some((i, c)) => {
                lo += i + c.len_utf8();
                true
            }
            None => false,
        };

        // Raw window after the hit; whitespace collapsing only shrinks it
        let window = max.saturating_mul(4);
        let tail_cut = match text[end..hi].char_indices().nth(window) {
            Some((i, _)) => {
                hi = end + i;
                true
            }
            None => false,
        };

        let budget = if clipped { max.saturating_sub(3) } else { max };
        let collapsed = collapse_whitespace(&text[lo..hi]);
        let body = if tail_cut && collapsed.chars().count() <= budget {
            let kept: String = collapsed.chars().take(budget.saturating_sub(3)).collect();
            format!("{}...", kept.trim_end())
        } else {
            truncate_chars(&collapsed, budget)
        };
        if clipped { format!("...{body}") } else { body }
    }

    fn entry_bounds(
        &self,
        index: &SectionIndex,
        text: &str,
        start: usize,
        end: usize,
    ) -> (usize, usize) {
        let header_end = last_at_most(&index.header_ends, start);
        let marker_start = last_before(&index.marker_starts, start);
        let closed_at = last_before(&index.end_starts, start);

        // A section end between the boundary and the hit closes that section
        let lo = header_end
            .max(marker_start)
            .filter(|&lo| !closed_at.is_some_and(|e| e >= lo));
        let Some(lo) = lo else {
            // Unstructured text: the excerpt is the line holding the occurrence
            return line_bounds(text, start, end);
        };

        let next_marker = first_at_or_after(&index.marker_starts, end);
        let next_end = first_at_or_after(&index.end_starts, end);
        let hi = [next_marker, next_end]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(text.len());

        (lo, hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn candidate(name: &str, text: &str) -> CandidateDocument {
        CandidateDocument::new(PathBuf::from(name), text.to_string())
    }

    fn subject(name: &str, variants: &[&str]) -> Subject {
        Subject::new(name, variants.iter().map(|v| v.to_string())).unwrap()
    }

    const LATTES_ARTICLES: &str = "Produção bibliográfica\n\
Artigos completos publicados em periódicos\n\
1.\n\
COSTA, A.; PEREIRA, B. Redes neurais aplicadas. Revista X, v. 1, 2019.\n\
2.\n\
SOUZA, M.; SILVA, J. Análise de dados educacionais. Revista Y, v. 3, 2021.\n\
3.\n\
LIMA, C. Outro trabalho. Revista Z, 2022.\n\
Referências adicionais\n";

    #[test]
    fn substring_match_is_case_sensitive() {
        let matcher = CrossReferenceMatcher::new();
        assert!(!matcher.excerpts_for("por J. Silva Jr. (2020)", "Silva").is_empty());
        assert!(matcher.excerpts_for("por j. silva (2020)", "SILVA").is_empty());
        assert!(matcher.excerpts_for("anything", "").is_empty());
    }

    #[test]
    fn excerpt_is_the_numbered_entry() {
        let matcher = CrossReferenceMatcher::new();
        let excerpts = matcher.excerpts_for(LATTES_ARTICLES, "SILVA, J.");
        assert_eq!(
            excerpts,
            vec!["2. SOUZA, M.; SILVA, J. Análise de dados educacionais. Revista Y, v. 3, 2021."]
        );
    }

    #[test]
    fn excerpt_stops_at_section_end() {
        let matcher = CrossReferenceMatcher::new();
        let excerpts = matcher.excerpts_for(LATTES_ARTICLES, "LIMA, C.");
        assert_eq!(excerpts, vec!["3. LIMA, C. Outro trabalho. Revista Z, 2022."]);
    }

    #[test]
    fn excerpt_starts_after_section_header() {
        let text = "Artigos completos publicados em periódicos\nSILVA, J. Um artigo.\nReferências\nfim";
        let matcher = CrossReferenceMatcher::new();
        assert_eq!(
            matcher.excerpts_for(text, "SILVA, J."),
            vec!["SILVA, J. Um artigo."]
        );
    }

    #[test]
    fn excerpt_without_structure_starts_at_line() {
        let text = "Introdução\nComo discutido por Silva (2020), o método funciona.";
        let matcher = CrossReferenceMatcher::new();
        assert_eq!(
            matcher.excerpts_for(text, "Silva"),
            vec!["Como discutido por Silva (2020), o método funciona."]
        );
    }

    #[test]
    fn long_lead_is_clipped_but_keeps_the_hit() {
        let config = MatchingConfigBuilder::new()
            .max_excerpt_chars(40)
            .build()
            .unwrap();
        let matcher = CrossReferenceMatcher::with_config(config);
        let text = format!("{} SILVA, J. e outros", "palavra ".repeat(30));
        let excerpts = matcher.excerpts_for(&text, "SILVA, J.");
        assert_eq!(excerpts.len(), 1);
        assert!(excerpts[0].starts_with("..."));
        assert!(excerpts[0].contains("SILVA, J."));
        assert!(excerpts[0].chars().count() <= 40);
    }

    #[test]
    fn clipped_on_both_sides_stays_within_limit() {
        let config = MatchingConfigBuilder::new()
            .max_excerpt_chars(40)
            .build()
            .unwrap();
        let matcher = CrossReferenceMatcher::with_config(config);
        let text = format!("{}SILVA, J.{}", "palavra ".repeat(30), " termo".repeat(100));
        let excerpts = matcher.excerpts_for(&text, "SILVA, J.");

        assert_eq!(excerpts.len(), 1);
        let excerpt = &excerpts[0];
        assert!(excerpt.starts_with("..."));
        assert!(excerpt.ends_with("..."));
        assert!(excerpt.contains("SILVA, J."));
        assert!(excerpt.chars().count() <= 40, "{excerpt:?}");
    }

    #[test]
    fn section_end_closes_the_entry_before_it() {
        let text = "Artigos completos publicados em periódicos\n\
1.\n\
SOUZA, M. Um artigo. 2019.\n\
Referências\n\
SILVA, J. Outro livro. 2020.\n\
COSTA, A. Terceiro. 2021.\n";
        let matcher = CrossReferenceMatcher::new();

        assert_eq!(
            matcher.excerpts_for(text, "SILVA, J."),
            vec!["SILVA, J. Outro livro. 2020."]
        );
        assert_eq!(
            matcher.excerpts_for(text, "SOUZA, M."),
            vec!["1. SOUZA, M. Um artigo. 2019."]
        );
    }

    #[test]
    fn numbered_list_after_section_end_is_its_own_entry() {
        let text = "1.\nSOUZA, M. Um artigo.\nReferências\n1.\nSILVA, J. Livro.\n2.\nLIMA, C.\n";
        let matcher = CrossReferenceMatcher::new();
        assert_eq!(
            matcher.excerpts_for(text, "SILVA, J."),
            vec!["1. SILVA, J. Livro."]
        );
    }

    #[test]
    fn frequent_variant_in_long_text_stops_at_the_cap() {
        let mut text = String::from("Artigos completos publicados em periódicos\n");
        for i in 0..3000 {
            if i % 3 != 2 {
                text.push_str(&format!("{}.\n", i % 999 + 1));
            }
            text.push_str(&format!("SILVA, J.; AUTOR {i}. Título {i}. Revista, 2020.\n"));
        }
        let matcher = CrossReferenceMatcher::new();

        let excerpts = matcher.excerpts_for(&text, "SILVA, J.");
        assert_eq!(excerpts.len(), DEFAULT_MAX_EXCERPTS_PER_VARIANT);
        assert_eq!(excerpts[0], "1. SILVA, J.; AUTOR 0. Título 0. Revista, 2020.");
        let distinct: std::collections::BTreeSet<_> = excerpts.iter().collect();
        assert_eq!(distinct.len(), excerpts.len());

        let mut s = subject("João Silva", &["SILVA, J."]);
        assert_eq!(matcher.scan_subject(&mut s, &candidate("tese.pdf", &text)), 1);
        assert_eq!(s.total_matches, 1);
        assert_eq!(
            s.matches.excerpts("tese.pdf", "SILVA, J.").len(),
            DEFAULT_MAX_EXCERPTS_PER_VARIANT
        );
    }

    #[test]
    fn one_hit_per_variant_per_candidate() {
        let matcher = CrossReferenceMatcher::new();
        let mut s = subject("João Silva", &["Silva"]);
        let doc = candidate("tese.pdf", "Silva (2019) e Silva (2020)\nSilva (2021)");

        assert_eq!(matcher.scan_subject(&mut s, &doc), 1);
        assert_eq!(s.total_matches, 1);
        assert_eq!(s.matches.excerpts("tese.pdf", "Silva").len(), 2);
    }

    #[test]
    fn each_matching_variant_counts() {
        let matcher = CrossReferenceMatcher::new();
        let mut s = subject("João Silva", &["SILVA, J.", "João Silva", "J. SILVA"]);
        let doc = candidate("tese.pdf", "SILVA, J. e João Silva escreveram.");

        assert_eq!(matcher.scan_subject(&mut s, &doc), 2);
        assert_eq!(s.total_matches, 2);
        assert!(s.matches.excerpts("tese.pdf", "J. SILVA").is_empty());
    }

    #[test]
    fn excerpts_are_capped_and_deduplicated() {
        let config = MatchingConfigBuilder::new()
            .max_excerpts_per_variant(2)
            .build()
            .unwrap();
        let matcher = CrossReferenceMatcher::with_config(config);
        let mut s = subject("João Silva", &["Silva"]);
        let doc = candidate("a.pdf", "Silva Silva\nSilva um\nSilva dois\nSilva três");

        matcher.scan_subject(&mut s, &doc);
        assert_eq!(
            s.matches.excerpts("a.pdf", "Silva"),
            ["Silva Silva", "Silva um"]
        );
    }

    #[test]
    fn accumulates_across_candidates() {
        let matcher = CrossReferenceMatcher::new();
        let mut registry = SubjectRegistry::new();
        registry.register(subject("João Silva", &["SILVA, J."]));
        registry.register(subject("Maria Souza", &["SOUZA, M."]));

        let first = candidate("a.pdf", LATTES_ARTICLES);
        let second = candidate("b.pdf", "Nada relevante aqui.");
        let third = candidate("c.pdf", "Citando SILVA, J. novamente.");

        assert_eq!(matcher.scan(&mut registry, &first), 2);
        assert_eq!(matcher.scan(&mut registry, &second), 0);
        assert_eq!(matcher.scan(&mut registry, &third), 1);

        let silva = registry.get("João Silva").unwrap();
        assert_eq!(silva.total_matches, 2);
        assert_eq!(silva.matches.candidates().collect::<Vec<_>>(), vec!["a.pdf", "c.pdf"]);
        assert_eq!(registry.get("Maria Souza").unwrap().total_matches, 1);
    }

    #[test]
    fn builder_rejects_invalid_pattern() {
        let err = MatchingConfigBuilder::new()
            .section_end_regex("(unclosed")
            .build()
            .unwrap_err();
        assert!(err.to_string().starts_with("invalid section_end pattern"));
    }
}
