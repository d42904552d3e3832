use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::matching::MatchingConfigBuilder;

/// Contents of a `config.toml` / `.citecross.toml` file. Every section and
/// field may be left out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub input: Option<InputConfig>,
    pub output: Option<OutputConfig>,
    pub parsing: Option<ParsingSection>,
    pub matching: Option<MatchingSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputConfig {
    pub candidates_dir: Option<String>,
    pub subjects_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsingSection {
    pub canonical_name_pattern: Option<String>,
    pub citation_names_pattern: Option<String>,
    pub variant_separator: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchingSection {
    pub section_start_pattern: Option<String>,
    pub entry_marker_pattern: Option<String>,
    pub section_end_pattern: Option<String>,
    pub max_excerpt_chars: Option<usize>,
    pub max_excerpts_per_variant: Option<usize>,
}

impl MatchingSection {
    /// Seed a [`MatchingConfigBuilder`] with the values set in this section.
    pub fn to_builder(&self) -> MatchingConfigBuilder {
        let mut builder = MatchingConfigBuilder::new();
        if let Some(ref p) = self.section_start_pattern {
            builder = builder.section_start_regex(p);
        }
        if let Some(ref p) = self.entry_marker_pattern {
            builder = builder.entry_marker_regex(p);
        }
        if let Some(ref p) = self.section_end_pattern {
            builder = builder.section_end_regex(p);
        }
        if let Some(n) = self.max_excerpt_chars {
            builder = builder.max_excerpt_chars(n);
        }
        if let Some(n) = self.max_excerpts_per_variant {
            builder = builder.max_excerpts_per_variant(n);
        }
        builder
    }
}

/// Platform config directory path: `<config_dir>/citecross/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citecross").join("config.toml"))
}

/// Load config by cascading CWD `.citecross.toml` over platform config.
/// A key set in the working directory wins over the platform file.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citecross.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Read and parse one config file. Missing or malformed files give `None`;
/// a malformed one is also logged.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config file");
            Some(config)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

fn pick<T: Clone>(overlay: Option<&T>, base: Option<&T>) -> Option<T> {
    overlay.or(base).cloned()
}

/// Field-by-field union of two configs, preferring `overlay`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bi, oi) = (base.input.unwrap_or_default(), overlay.input.unwrap_or_default());
    let (bo, oo) = (base.output.unwrap_or_default(), overlay.output.unwrap_or_default());
    let (bp, op) = (base.parsing.unwrap_or_default(), overlay.parsing.unwrap_or_default());
    let (bm, om) = (base.matching.unwrap_or_default(), overlay.matching.unwrap_or_default());

    ConfigFile {
        input: Some(InputConfig {
            candidates_dir: pick(oi.candidates_dir.as_ref(), bi.candidates_dir.as_ref()),
            subjects_dir: pick(oi.subjects_dir.as_ref(), bi.subjects_dir.as_ref()),
        }),
        output: Some(OutputConfig {
            path: pick(oo.path.as_ref(), bo.path.as_ref()),
            format: pick(oo.format.as_ref(), bo.format.as_ref()),
        }),
        parsing: Some(ParsingSection {
            canonical_name_pattern: pick(
                op.canonical_name_pattern.as_ref(),
                bp.canonical_name_pattern.as_ref(),
            ),
            citation_names_pattern: pick(
                op.citation_names_pattern.as_ref(),
                bp.citation_names_pattern.as_ref(),
            ),
            variant_separator: pick(op.variant_separator.as_ref(), bp.variant_separator.as_ref()),
        }),
        matching: Some(MatchingSection {
            section_start_pattern: pick(
                om.section_start_pattern.as_ref(),
                bm.section_start_pattern.as_ref(),
            ),
            entry_marker_pattern: pick(
                om.entry_marker_pattern.as_ref(),
                bm.entry_marker_pattern.as_ref(),
            ),
            section_end_pattern: pick(
                om.section_end_pattern.as_ref(),
                bm.section_end_pattern.as_ref(),
            ),
            max_excerpt_chars: om.max_excerpt_chars.or(bm.max_excerpt_chars),
            max_excerpts_per_variant: om.max_excerpts_per_variant.or(bm.max_excerpts_per_variant),
        }),
    }
}
