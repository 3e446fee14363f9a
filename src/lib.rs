//! # pubgen
//!
//! Turns a publication list into a directory of front-matter pages for a
//! static site: one `<date>-<slug>.md` file per publication, holding nothing
//! but a YAML front-matter block.
//!
//! # Pipeline
//!
//! ```text
//! 1. Load      publications.{json,csv,tsv,bib}  →  [Publication]
//! 2. Render    [Publication]                    →  Plan (pages, skipped, collisions)
//! 3. Write     Plan                             →  _publications/*.md
//! ```
//!
//! `check` stops after step 2. Rendering finishes for every record before
//! anything is written, so a run that fails leaves the output directory as it
//! was.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`load`] | Picks a reader by file extension, returns tagged publications |
//! | [`citation`] | BibTeX parsing behind the [`citation::CitationParser`] trait |
//! | [`types`] | `Record`, `Publication`, citation entries and table column aliases |
//! | [`publication`] | Per-variant key tables and rendering of one publication |
//! | [`frontmatter`] | Serializes a record into a `---` block, one `key: value` per line |
//! | [`escape`] | Entity escaping for quoted values, BibTeX markup cleanup |
//! | [`naming`] | Page identifiers and file names |
//! | [`write`] | Output directory creation and page writes |
//! | [`pipeline`] | Load → render → resolve collisions → write, with rayon |
//! | [`config`] | `pubgen.toml` loading, layering and validation |
//! | [`output`] | CLI output formatting for `build` and `check` |
//!
//! # Front Matter Values
//!
//! Quoted values are wrapped in single quotes after escaping `&`, `"` and `'`
//! as HTML entities, so no value can terminate its own quoting. Dates are
//! written bare so the site generator parses them as dates.

pub mod citation;
pub mod config;
pub mod escape;
pub mod frontmatter;
pub mod load;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod publication;
pub mod types;
pub mod write;

#[cfg(test)]
pub(crate) mod test_helpers;
