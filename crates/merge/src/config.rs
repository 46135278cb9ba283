use std::path::PathBuf;

use serde::Deserialize;

use crate::error::MergeError;

pub const DEFAULT_DELIMITER: char = ',';
pub const DEFAULT_OUTPUT_DIR: &str = "results";
pub const DEFAULT_INDENT: usize = 4;
pub const MAX_INDENT: usize = 16;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration. Every section is optional; an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub address: AddressConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

fn default_delimiter() -> char {
    DEFAULT_DELIMITER
}

// ---------------------------------------------------------------------------
// Address comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddressConfig {
    #[serde(default)]
    pub match_mode: AddressMatch,
}

/// How address fields are compared when looking for duplicates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressMatch {
    /// Byte-for-byte, case- and whitespace-sensitive.
    #[default]
    Exact,
    /// Trimmed, internal whitespace collapsed, lowercased.
    Normalized,
}

impl std::fmt::Display for AddressMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::Normalized => write!(f, "normalized"),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            indent: DEFAULT_INDENT,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_indent() -> usize {
    DEFAULT_INDENT
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MergeConfig {
    pub fn from_toml(input: &str) -> Result<Self, MergeError> {
        let config = Self::parse_toml(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Deserialize without validating, for callers that apply overrides first.
    pub fn parse_toml(input: &str) -> Result<Self, MergeError> {
        toml::from_str(input).map_err(|e| MergeError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), MergeError> {
        let d = self.input.delimiter;
        if !d.is_ascii() || d == '"' || d == '\n' || d == '\r' {
            return Err(MergeError::ConfigValidation(format!(
                "delimiter must be a single ASCII character other than a quote or newline, got {d:?}"
            )));
        }

        if self.output.indent > MAX_INDENT {
            return Err(MergeError::ConfigValidation(format!(
                "output.indent must be at most {MAX_INDENT}, got {}",
                self.output.indent
            )));
        }

        if self.output.dir.as_os_str().is_empty() {
            return Err(MergeError::ConfigValidation(
                "output.dir must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Delimiter as the byte the CSV reader expects. Valid after `validate()`.
    pub fn delimiter_byte(&self) -> u8 {
        self.input.delimiter as u8
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = MergeConfig::from_toml("").unwrap();
        assert_eq!(config.input.delimiter, ',');
        assert_eq!(config.address.match_mode, AddressMatch::Exact);
        assert_eq!(config.output.dir, PathBuf::from("results"));
        assert_eq!(config.output.indent, 4);
        assert_eq!(config.delimiter_byte(), b',');
    }

    #[test]
    fn parse_all_sections() {
        let input = r#"
[input]
delimiter = ";"

[address]
match_mode = "normalized"

[output]
dir = "out/groups"
indent = 2
"#;
        let config = MergeConfig::from_toml(input).unwrap();
        assert_eq!(config.delimiter_byte(), b';');
        assert_eq!(config.address.match_mode, AddressMatch::Normalized);
        assert_eq!(config.output.dir, PathBuf::from("out/groups"));
        assert_eq!(config.output.indent, 2);
    }

    #[test]
    fn parse_toml_defers_validation() {
        let input = "[output]\nindent = 99\n";
        assert!(MergeConfig::from_toml(input).is_err());

        let mut config = MergeConfig::parse_toml(input).unwrap();
        assert!(config.validate().is_err());
        config.output.indent = 2;
        config.validate().unwrap();
    }

    #[test]
    fn tab_delimiter() {
        let config = MergeConfig::from_toml("[input]\ndelimiter = \"\\t\"\n").unwrap();
        assert_eq!(config.delimiter_byte(), b'\t');
    }

    #[test]
    fn reject_unknown_match_mode() {
        let err = MergeConfig::from_toml("[address]\nmatch_mode = \"fuzzy\"\n");
        assert!(matches!(err, Err(MergeError::ConfigParse(_))));
    }

    #[test]
    fn reject_unknown_key() {
        let err = MergeConfig::from_toml("[output]\nfolder = \"x\"\n");
        assert!(matches!(err, Err(MergeError::ConfigParse(_))));
    }

    #[test]
    fn reject_multi_char_delimiter() {
        let err = MergeConfig::from_toml("[input]\ndelimiter = \";;\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn reject_non_ascii_delimiter() {
        let err = MergeConfig::from_toml("[input]\ndelimiter = \"§\"\n").unwrap_err();
        assert!(err.to_string().contains("delimiter"));
    }

    #[test]
    fn reject_large_indent() {
        let err = MergeConfig::from_toml("[output]\nindent = 40\n").unwrap_err();
        assert!(err.to_string().contains("at most 16"));
    }
}
