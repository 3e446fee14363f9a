//! The batch run: load → render → resolve collisions → write.
//!
//! ```text
//! publications.json ──load──▶ [Publication] ──render (parallel)──▶ [RenderedPage]
//!                                                   │
//!                              skipped records ◀────┤ MissingField
//!                                                   ▼
//!                                          plan: one page per identifier
//!                                                   │
//!                                                   ▼
//!                                  _publications/<identifier>.md (parallel)
//! ```
//!
//! ## Record errors
//!
//! A record missing a required field is skipped and reported; the rest of the
//! batch still runs. With `strict = true` the first such record (in input
//! order) aborts the run instead. Rendering happens before any write, so an
//! aborted run leaves the output directory untouched.
//!
//! ## Collisions
//!
//! Two records can derive the same identifier. Written one after another, the
//! later one would replace the earlier file, so the plan keeps only the last
//! page for each identifier and records the collision. Every file is then
//! written by exactly one worker. With `duplicates = "error"` the run stops
//! before writing.
//!
//! Identifiers that differ only in case (`2020-A`, `2020-a`) are separate
//! pages, but name the same file on a case-insensitive filesystem. They are
//! written one after another by a single worker, in input order, so the later
//! record wins there as well.

use crate::citation::CitationParser;
use crate::config::{DuplicatePolicy, GeneratorConfig};
use crate::frontmatter::RenderError;
use crate::load::{self, LoadError};
use crate::publication::{self, RenderedPage};
use crate::types::Publication;
use crate::write;
use indexmap::IndexMap;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Record {label}: {source}")]
    Record { label: String, source: RenderError },
    #[error("Duplicate output file {identifier}.md from records {}", .labels.join(", "))]
    DuplicateIdentifier {
        identifier: String,
        labels: Vec<String>,
    },
}

/// A page together with the record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedPage {
    /// 0-based position of the record in the input.
    pub position: usize,
    pub label: String,
    pub page: RenderedPage,
}

/// A record that could not be rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub label: String,
    pub error: RenderError,
}

/// Records that derived the same identifier, in input order. The last one wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub identifier: String,
    pub labels: Vec<String>,
}

/// Everything that would be written, before touching the disk.
#[derive(Debug, Default)]
pub struct Plan {
    pub pages: Vec<PlannedPage>,
    pub skipped: Vec<SkippedRecord>,
    pub collisions: Vec<Collision>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenPage {
    pub label: String,
    pub identifier: String,
    pub path: PathBuf,
}

/// Outcome of a full run.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub output_dir: PathBuf,
    pub written: Vec<WrittenPage>,
    pub skipped: Vec<SkippedRecord>,
    pub collisions: Vec<Collision>,
}

/// Render every publication on the rayon pool. Results keep input order.
pub fn render_all(
    publications: &[Publication],
    config: &GeneratorConfig,
) -> Vec<(String, Result<RenderedPage, RenderError>)> {
    publications
        .par_iter()
        .enumerate()
        .map(|(index, publication)| {
            (
                publication.label(index),
                publication::render(publication, config),
            )
        })
        .collect()
}

/// Render and resolve collisions according to the config's policies.
pub fn plan(publications: &[Publication], config: &GeneratorConfig) -> Result<Plan, BuildError> {
    let mut skipped = Vec::new();
    let mut by_identifier: IndexMap<String, Vec<PlannedPage>> = IndexMap::new();

    for (position, (label, result)) in render_all(publications, config).into_iter().enumerate() {
        match result {
            Ok(page) => {
                tracing::debug!(record = %label, identifier = %page.identifier, "rendered");
                by_identifier
                    .entry(page.identifier.clone())
                    .or_default()
                    .push(PlannedPage {
                        position,
                        label,
                        page,
                    });
            }
            Err(error) if config.strict => {
                return Err(BuildError::Record {
                    label,
                    source: error,
                });
            }
            Err(error) => {
                tracing::warn!(record = %label, %error, "skipping record");
                skipped.push(SkippedRecord { label, error });
            }
        }
    }

    let mut pages = Vec::with_capacity(by_identifier.len());
    let mut collisions = Vec::new();
    for (identifier, mut group) in by_identifier {
        if group.len() > 1 {
            let labels: Vec<String> = group.iter().map(|p| p.label.clone()).collect();
            if config.duplicates == DuplicatePolicy::Error {
                return Err(BuildError::DuplicateIdentifier { identifier, labels });
            }
            tracing::warn!(
                %identifier,
                records = %labels.join(", "),
                "identifier collision, keeping the last record"
            );
            collisions.push(Collision { identifier, labels });
        }
        if let Some(last) = group.pop() {
            pages.push(last);
        }
    }

    Ok(Plan {
        pages,
        skipped,
        collisions,
    })
}

/// Load the configured input and plan it without writing anything.
pub fn check(config: &GeneratorConfig, parser: &dyn CitationParser) -> Result<Plan, BuildError> {
    let publications = load::load_publications(Path::new(&config.input), parser)?;
    plan(&publications, config)
}

/// Group pages whose file names collide when case is ignored.
///
/// Each group is in input order. Most groups hold a single page.
fn case_folded_groups(pages: &[PlannedPage]) -> Vec<Vec<&PlannedPage>> {
    let mut groups: IndexMap<String, Vec<&PlannedPage>> = IndexMap::new();
    for planned in pages {
        groups
            .entry(planned.page.identifier.to_lowercase())
            .or_default()
            .push(planned);
    }
    groups
        .into_values()
        .map(|mut group| {
            if group.len() > 1 {
                group.sort_by_key(|p| p.position);
                let identifiers: Vec<&str> =
                    group.iter().map(|p| p.page.identifier.as_str()).collect();
                tracing::warn!(
                    identifiers = %identifiers.join(", "),
                    "identifiers differ only in case; written in input order"
                );
            }
            group
        })
        .collect()
}

/// Write planned pages into `output_dir`, creating it first.
pub fn write_plan(plan: Plan, output_dir: &Path) -> Result<BuildReport, BuildError> {
    write::ensure_output_dir(output_dir)?;
    let written = case_folded_groups(&plan.pages)
        .par_iter()
        .map(|group| -> std::io::Result<Vec<WrittenPage>> {
            let mut written = Vec::with_capacity(group.len());
            for planned in group {
                let path = write::write_page(
                    output_dir,
                    &planned.page.identifier,
                    &planned.page.front_matter,
                )?;
                tracing::debug!(path = %path.display(), "wrote page");
                written.push(WrittenPage {
                    label: planned.label.clone(),
                    identifier: planned.page.identifier.clone(),
                    path,
                });
            }
            Ok(written)
        })
        .collect::<std::io::Result<Vec<_>>>()?
        .into_iter()
        .flatten()
        .collect();

    Ok(BuildReport {
        output_dir: output_dir.to_path_buf(),
        written,
        skipped: plan.skipped,
        collisions: plan.collisions,
    })
}

/// Full run: load, plan, write.
pub fn run(config: &GeneratorConfig, parser: &dyn CitationParser) -> Result<BuildReport, BuildError> {
    let plan = check(config, parser)?;
    let report = write_plan(plan, Path::new(&config.output_dir))?;
    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        collisions = report.collisions.len(),
        "build finished"
    );
    Ok(report)
}
