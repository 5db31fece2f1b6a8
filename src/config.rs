//! Checker configuration.
//!
//! Loaded from a TOML file by the CLI; every field has a default so an
//! empty file is a valid configuration.

use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Fortran,
    C,
    Cxx,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub language: Language,
    pub default_integer_kind: u8,
    pub default_real_kind: u8,
    pub double_precision_kind: u8,
    pub default_logical_kind: u8,
    pub default_character_kind: u8,
    /// When false, undeclared names are typed by their first letter.
    pub implicit_none: bool,
    /// Accept a derived class where deduction bound a base class.
    pub lenient_derived_deduction: bool,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        CheckerConfig {
            language: Language::Fortran,
            default_integer_kind: 4,
            default_real_kind: 4,
            double_precision_kind: 8,
            default_logical_kind: 4,
            default_character_kind: 1,
            implicit_none: true,
            lenient_derived_deduction: true,
        }
    }
}

impl CheckerConfig {
    pub fn for_language(language: Language) -> Self {
        CheckerConfig {
            language,
            ..Default::default()
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("reading configuration {}", path.display()))?;
        Self::from_toml_str(&source).with_context(|| format!("parsing configuration {}", path.display()))
    }

    pub fn is_cxx(&self) -> bool {
        self.language == Language::Cxx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CheckerConfig::default();
        assert_eq!(config.language, Language::Fortran);
        assert_eq!(config.default_real_kind, 4);
        assert!(config.implicit_none);
        assert!(config.lenient_derived_deduction);
    }

    #[test]
    fn test_partial_toml() {
        let config = CheckerConfig::from_toml_str("language = \"cxx\"\nlenient_derived_deduction = false\n").unwrap();
        assert_eq!(config.language, Language::Cxx);
        assert!(!config.lenient_derived_deduction);
        assert_eq!(config.default_integer_kind, 4);
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        assert!(CheckerConfig::from_toml_str("language = \"cobol\"").is_err());
    }
}
