//! Generator configuration.
//!
//! Handles loading, validating and layering `pubgen.toml`. Stock defaults are
//! the base layer, the user's file goes on top, and command-line overrides
//! go on top of that.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input = "publications.json"     # .json, .csv, .tsv or .bib
//! output_dir = "../_publications"
//! collection = "publications"     # collection name, also the permalink prefix
//! strict = false                  # abort on the first malformed record
//! duplicates = "overwrite"        # or "error"
//!
//! [citation]
//! site_url = ""                   # prepended to paper_url for BibTeX input
//! owner = ""                      # author name to highlight with <strong>
//! files_prefix = "/files"         # where paper PDFs live on the site
//!
//! [processing]
//! max_processes = 4               # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! input = "papers.bib"
//!
//! [citation]
//! owner = "Dana Van Aken"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `pubgen.toml`.
///
/// All fields have defaults that reproduce the classic academic-site layout:
/// read `publications.json`, write into `../_publications`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Publication list to read. The extension selects the format.
    pub input: String,
    /// Directory that receives one `.md` file per publication.
    pub output_dir: String,
    /// Collection name written into each page and used as permalink prefix.
    pub collection: String,
    /// Abort the run on the first record that cannot be rendered.
    pub strict: bool,
    /// What to do when two records map to the same output file.
    pub duplicates: DuplicatePolicy,
    /// Settings that only apply to BibTeX input.
    pub citation: CitationConfig,
    /// Parallel rendering settings.
    pub processing: ProcessingConfig,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input: "publications.json".to_string(),
            output_dir: "../_publications".to_string(),
            collection: "publications".to_string(),
            strict: false,
            duplicates: DuplicatePolicy::default(),
            citation: CitationConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl GeneratorConfig {
    /// Validate config values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.input.trim().is_empty() {
            return Err(ConfigError::Validation("input must not be empty".into()));
        }
        if self.output_dir.trim().is_empty() {
            return Err(ConfigError::Validation(
                "output_dir must not be empty".into(),
            ));
        }
        // Both end up unquoted in BibTeX front matter.
        if self.collection.is_empty() || !self.collection.chars().all(is_plain_path_char) {
            return Err(ConfigError::Validation(
                "collection may only contain letters, digits, '_', '-' and '.'".into(),
            ));
        }
        let prefix = &self.citation.files_prefix;
        if !prefix.starts_with('/') || !prefix.chars().all(|c| c == '/' || is_plain_path_char(c)) {
            return Err(ConfigError::Validation(
                "citation.files_prefix must start with '/' and contain only letters, digits, '_', '-', '.' and '/'"
                    .into(),
            ));
        }
        Ok(())
    }
}

fn is_plain_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Handling of records that derive the same identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Later records replace earlier ones; each collision is reported.
    #[default]
    Overwrite,
    /// Stop before writing anything.
    Error,
}

/// BibTeX-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CitationConfig {
    /// Site root prepended to each paper's permalink, e.g. `https://example.com`.
    pub site_url: String,
    /// Author name rendered in bold in citations. Empty disables highlighting.
    pub owner: String,
    /// Site path that holds `<cite-key>.pdf` files.
    pub files_prefix: String,
}

impl Default for CitationConfig {
    fn default() -> Self {
        Self {
            site_url: String::new(),
            owner: String::new(),
            files_prefix: "/files".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(GeneratorConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config does not serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file doesn't exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge overlays onto a base value in order, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlays: impl IntoIterator<Item = toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let merged = overlays.into_iter().fold(base, merge_toml);
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, then apply command-line `overrides` on top.
///
/// A missing file means stock defaults. Unknown keys are rejected in both
/// layers.
pub fn load_config(
    path: &Path,
    overrides: Option<toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let file = load_raw_config(path)?;
    resolve_config(base, file.into_iter().chain(overrides))
}

/// Returns a fully-commented stock `pubgen.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pubgen configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Publication list to convert. The extension picks the reader:
#   .json  list of objects (date, urlslug, title, authors, venue, paperurl, pubtype)
#   .csv   table, comma separated, first row is the header
#   .tsv   table, tab separated, first row is the header
#   .bib   BibTeX
input = "publications.json"

# Directory that receives one <date>-<slug>.md file per publication.
# Created if missing. Existing files with the same name are overwritten.
output_dir = "../_publications"

# Collection name written into every page. Permalinks become
# /<collection>/<date>-<slug>. Letters, digits, '_', '-' and '.' only.
collection = "publications"

# Stop at the first record that is missing a required field.
# When false, such records are skipped and listed at the end.
strict = false

# Two records that produce the same file name:
#   "overwrite"  the later record wins (each collision is reported)
#   "error"      stop before writing anything
duplicates = "overwrite"

# ---------------------------------------------------------------------------
# BibTeX input only
# ---------------------------------------------------------------------------
[citation]
# Prefix for paper_url, e.g. "https://example.com". paper_url becomes
# <site_url><files_prefix>/<cite-key>.pdf
site_url = ""

# Your name as it appears in author lists; it is wrapped in <strong> tags.
owner = ""

# Site path holding the paper PDFs. Starts with '/'; letters, digits,
# '_', '-', '.' and '/' only.
files_prefix = "/files"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel render workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.input, "publications.json");
        assert_eq!(config.output_dir, "../_publications");
        assert_eq!(config.collection, "publications");
        assert!(!config.strict);
        assert_eq!(config.duplicates, DuplicatePolicy::Overwrite);
        assert_eq!(config.citation.files_prefix, "/files");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
            input = "papers.bib"

            [citation]
            owner = "Dana Van Aken"
        "#;
        let config: GeneratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.input, "papers.bib");
        assert_eq!(config.citation.owner, "Dana Van Aken");
        assert_eq!(config.citation.files_prefix, "/files");
        assert_eq!(config.output_dir, "../_publications");
    }

    #[test]
    fn parse_duplicate_policy() {
        let config: GeneratorConfig = toml::from_str(r#"duplicates = "error""#).unwrap();
        assert_eq!(config.duplicates, DuplicatePolicy::Error);
        assert!(toml::from_str::<GeneratorConfig>(r#"duplicates = "maybe""#).is_err());
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(toml::from_str::<GeneratorConfig>("outptu_dir = \"x\"").is_err());
        assert!(toml::from_str::<GeneratorConfig>("[citation]\nsite = \"x\"").is_err());
    }

    #[test]
    fn validate_rejects_bad_collection() {
        let mut config = GeneratorConfig::default();
        config.collection = "a/b".into();
        assert!(config.validate().is_err());
        config.collection = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_yaml_significant_characters() {
        let mut config = GeneratorConfig::default();
        config.collection = "my papers".into();
        assert!(config.validate().is_err());
        config.collection = "a: b".into();
        assert!(config.validate().is_err());
        config.collection = "papers #1".into();
        assert!(config.validate().is_err());
        config.collection = "selected_papers-2.0".into();
        assert!(config.validate().is_ok());

        config.citation.files_prefix = "/files #old".into();
        assert!(config.validate().is_err());
        config.citation.files_prefix = "/assets/papers".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_relative_files_prefix() {
        let mut config = GeneratorConfig::default();
        config.citation.files_prefix = "files".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("pubgen.toml"), None).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pubgen.toml");
        fs::write(&path, "collection = \"papers\"\nstrict = true\n").unwrap();
        let config = load_config(&path, None).unwrap();
        assert_eq!(config.collection, "papers");
        assert!(config.strict);
        assert_eq!(config.input, "publications.json");
    }

    #[test]
    fn overrides_win_over_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pubgen.toml");
        fs::write(&path, "input = \"a.json\"\noutput_dir = \"out\"\n").unwrap();
        let overrides: toml::Value = toml::from_str("input = \"b.tsv\"").unwrap();
        let config = load_config(&path, Some(overrides)).unwrap();
        assert_eq!(config.input, "b.tsv");
        assert_eq!(config.output_dir, "out");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pubgen.toml");
        fs::write(&path, "input = ").unwrap();
        assert!(matches!(
            load_config(&path, None),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: GeneratorConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_nested_tables() {
        let base: toml::Value =
            toml::from_str("[citation]\nsite_url = \"x\"\nowner = \"A\"").unwrap();
        let overlay: toml::Value = toml::from_str("[citation]\nowner = \"B\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["citation"]["site_url"].as_str(), Some("x"));
        assert_eq!(merged["citation"]["owner"].as_str(), Some("B"));
    }

    #[test]
    fn effective_threads_auto() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        assert_eq!(effective_threads(&ProcessingConfig::default()), cores);
    }

    #[test]
    fn effective_threads_user_constrains_down() {
        let config = ProcessingConfig {
            max_processes: Some(1),
        };
        assert_eq!(effective_threads(&config), 1);
    }

    #[test]
    fn effective_threads_clamped_to_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = ProcessingConfig {
            max_processes: Some(100_000),
        };
        assert_eq!(effective_threads(&config), cores);
    }
}
