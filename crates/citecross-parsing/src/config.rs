use regex::Regex;

use citecross_core::config_file::ParsingSection;

use crate::ParsingError;

/// Configuration for name extraction.
///
/// All regex fields are `Option<Regex>`: `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    /// Pattern whose group 1 is the canonical name.
    pub(crate) canonical_name_re: Option<Regex>,
    /// Pattern whose group 1 is the `;`-separated citation name list.
    pub(crate) citation_names_re: Option<Regex>,
    /// Separator between citation name variants (default `;`).
    pub(crate) variant_separator: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            canonical_name_re: None,
            citation_names_re: None,
            variant_separator: ";".to_string(),
        }
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast if any pattern is invalid or lacks a capture group.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    canonical_name_re: Option<String>,
    citation_names_re: Option<String>,
    variant_separator: Option<String>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from the `[parsing]` section of a config file.
    pub fn from_section(section: &ParsingSection) -> Self {
        Self {
            canonical_name_re: section.canonical_name_pattern.clone(),
            citation_names_re: section.citation_names_pattern.clone(),
            variant_separator: section.variant_separator.clone(),
        }
    }

    pub fn canonical_name_regex(mut self, pattern: &str) -> Self {
        self.canonical_name_re = Some(pattern.to_string());
        self
    }

    pub fn citation_names_regex(mut self, pattern: &str) -> Self {
        self.citation_names_re = Some(pattern.to_string());
        self
    }

    pub fn variant_separator(mut self, separator: &str) -> Self {
        self.variant_separator = Some(separator.to_string());
        self
    }

    pub fn build(self) -> Result<ParsingConfig, ParsingError> {
        let variant_separator = match self.variant_separator {
            Some(sep) if sep.is_empty() => return Err(ParsingError::EmptySeparator),
            Some(sep) => sep,
            None => ";".to_string(),
        };
        Ok(ParsingConfig {
            canonical_name_re: compile("canonical_name", self.canonical_name_re)?,
            citation_names_re: compile("citation_names", self.citation_names_re)?,
            variant_separator,
        })
    }
}

fn compile(field: &'static str, pattern: Option<String>) -> Result<Option<Regex>, ParsingError> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };
    let re = Regex::new(&pattern).map_err(|source| ParsingError::InvalidPattern { field, source })?;
    if re.captures_len() < 2 {
        return Err(ParsingError::MissingCaptureGroup { field });
    }
    Ok(Some(re))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ParsingConfigBuilder::new().build().unwrap();
        assert!(config.canonical_name_re.is_none());
        assert!(config.citation_names_re.is_none());
        assert_eq!(config.variant_separator, ";");
    }

    #[test]
    fn invalid_pattern_fails_fast() {
        let err = ParsingConfigBuilder::new()
            .canonical_name_regex("Nome(")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ParsingError::InvalidPattern {
                field: "canonical_name",
                ..
            }
        ));
    }

    #[test]
    fn pattern_without_group_is_rejected() {
        let err = ParsingConfigBuilder::new()
            .citation_names_regex(r"Nome em citações")
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ParsingError::MissingCaptureGroup {
                field: "citation_names"
            }
        ));
    }

    #[test]
    fn empty_separator_is_rejected() {
        assert!(matches!(
            ParsingConfigBuilder::new().variant_separator("").build(),
            Err(ParsingError::EmptySeparator)
        ));
    }

    #[test]
    fn from_section_carries_overrides() {
        let section = ParsingSection {
            variant_separator: Some("|".into()),
            ..Default::default()
        };
        let config = ParsingConfigBuilder::from_section(&section).build().unwrap();
        assert_eq!(config.variant_separator, "|");
    }
}
