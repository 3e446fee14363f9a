//! Shared test utilities for the pubgen test suite.
//!
//! Provides a fixture copy in a temp directory, a config pointing at it, and
//! extractors for plans and output directories.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let out = tmp.path().join("out");
//! let config = fixture_config(&tmp, "publications.json", &out);
//!
//! run(&config, &BibtexParser).unwrap();
//! assert_eq!(output_files(&out).len(), 3);
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::GeneratorConfig;
use crate::pipeline::Plan;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    for entry in std::fs::read_dir(&fixtures).unwrap() {
        let entry = entry.unwrap();
        if entry.path().is_file() {
            std::fs::copy(entry.path(), tmp.path().join(entry.file_name())).unwrap();
        }
    }
    tmp
}

/// Default config reading `input` from the fixture copy and writing to `out`.
pub fn fixture_config(tmp: &TempDir, input: &str, out: &Path) -> GeneratorConfig {
    GeneratorConfig {
        input: tmp.path().join(input).display().to_string(),
        output_dir: out.display().to_string(),
        ..GeneratorConfig::default()
    }
}

// =========================================================================
// Extractors
// =========================================================================

/// Identifiers of the planned pages, in plan order.
pub fn planned_identifiers(plan: &Plan) -> Vec<&str> {
    plan.pages
        .iter()
        .map(|p| p.page.identifier.as_str())
        .collect()
}

/// Sorted file names in a directory. Panics if it cannot be read.
pub fn output_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", dir.display()))
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
