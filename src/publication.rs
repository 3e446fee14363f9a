//! Turning one loaded publication into a page.
//!
//! Each input variant has its own key table and identifier rule:
//!
//! | Variant | Identifier | Key table |
//! |---------|------------|-----------|
//! | JSON list | `{date}-{urlslug}` | [`LIST_FIELDS`] |
//! | CSV/TSV table | `{date}-{urlslug}` | [`TABLE_FIELDS`] |
//! | BibTeX | `{year}-{sanitized title}` | [`CITATION_FIELDS`] |
//!
//! Some keys never come from the input. `collection` and `permalink` are
//! synthesized for every variant; BibTeX pages also get `date`, `paper_url`
//! and a formatted `citation`.

use crate::config::GeneratorConfig;
use crate::escape::clean_markup;
use crate::frontmatter::{self, FieldSpec, RenderError};
use crate::naming;
use crate::types::{CitationEntry, Person, Publication, Record};

/// Keys for JSON list entries. Everything except `pubtype` is required.
pub const LIST_FIELDS: &[FieldSpec] = &[
    FieldSpec::quoted("title"),
    FieldSpec::quoted("collection"),
    FieldSpec::quoted("permalink"),
    FieldSpec::bare("date"),
    FieldSpec::quoted("authors"),
    FieldSpec::quoted("venue"),
    FieldSpec::quoted("paperurl"),
    FieldSpec::quoted("pubtype").optional(),
];

/// Keys for table rows. Tables often leave columns blank, so only the
/// title, date and venue are required.
pub const TABLE_FIELDS: &[FieldSpec] = &[
    FieldSpec::quoted("title"),
    FieldSpec::quoted("collection"),
    FieldSpec::quoted("permalink"),
    FieldSpec::quoted("excerpt").optional(),
    FieldSpec::bare("date"),
    FieldSpec::quoted("authors").optional(),
    FieldSpec::quoted("venue"),
    FieldSpec::quoted("paperurl").optional(),
    FieldSpec::quoted("pubtype").optional(),
    FieldSpec::quoted("citation").optional(),
];

/// Keys for BibTeX entries. All are filled in by [`render`].
pub const CITATION_FIELDS: &[FieldSpec] = &[
    FieldSpec::quoted("title"),
    FieldSpec::bare("collection"),
    FieldSpec::bare("permalink"),
    FieldSpec::bare("date"),
    FieldSpec::quoted("venue"),
    FieldSpec::quoted("paper_url"),
    FieldSpec::quoted("citation"),
];

/// A page ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub identifier: String,
    pub front_matter: String,
}

impl RenderedPage {
    pub fn filename(&self) -> String {
        naming::output_filename(&self.identifier)
    }
}

/// Render one publication.
pub fn render(
    publication: &Publication,
    config: &GeneratorConfig,
) -> Result<RenderedPage, RenderError> {
    match publication {
        Publication::List(record) => render_record(record, LIST_FIELDS, config),
        Publication::Table(record) => render_record(record, TABLE_FIELDS, config),
        Publication::Citation(entry) => render_citation(entry, config),
    }
}

fn missing(key: &str) -> RenderError {
    RenderError::MissingField(key.to_string())
}

fn require<'a>(record: &'a Record, key: &str) -> Result<&'a str, RenderError> {
    record
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| missing(key))
}

fn permalink(collection: &str, identifier: &str) -> String {
    format!("/{collection}/{identifier}")
}

fn render_record(
    record: &Record,
    fields: &[FieldSpec],
    config: &GeneratorConfig,
) -> Result<RenderedPage, RenderError> {
    let identifier =
        naming::explicit_identifier(require(record, "date")?, require(record, "urlslug")?);

    let mut page = record.clone();
    page.insert("collection".to_string(), config.collection.clone());
    page.insert(
        "permalink".to_string(),
        permalink(&config.collection, &identifier),
    );

    let front_matter = frontmatter::serialize(&page, fields)?;
    Ok(RenderedPage {
        identifier,
        front_matter,
    })
}

/// Join author display names, bolding the site owner.
fn format_authors(authors: &[Person], owner: &str) -> String {
    authors
        .iter()
        .map(|person| {
            let name = person.display_name();
            if !owner.is_empty() && name == owner {
                format!("<strong>{name}</strong>")
            } else {
                name
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_citation(
    entry: &CitationEntry,
    config: &GeneratorConfig,
) -> Result<RenderedPage, RenderError> {
    let field = |key: &str| entry.fields.get(key).map(String::as_str);

    let year = naming::year_of(field("year").ok_or_else(|| missing("year"))?);
    let date = naming::citation_date(year);
    let title = clean_markup(field("title").ok_or_else(|| missing("title"))?);
    let venue = clean_markup(
        field("booktitle")
            .or_else(|| field("journal"))
            .ok_or_else(|| missing("booktitle"))?,
    );
    let authors = entry
        .persons
        .get("author")
        .ok_or_else(|| missing("author"))?;
    let authors = format_authors(authors, &config.citation.owner);

    let identifier = naming::title_identifier(year, &title);
    let permalink = clean_markup(&format!(
        "{}/{}.pdf",
        config.citation.files_prefix, entry.key
    ));
    let paper_url = format!("{}{}", config.citation.site_url, permalink);
    // Unescaped, closed with `</i>`; the serializer escapes it exactly once.
    let citation = format!("{authors}.\n<i>{venue}</i>, {year}.");

    let page: Record = [
        ("title", title),
        ("collection", config.collection.clone()),
        ("permalink", permalink),
        ("date", date),
        ("venue", venue),
        ("paper_url", paper_url),
        ("citation", citation),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let front_matter = frontmatter::serialize(&page, CITATION_FIELDS)?;
    Ok(RenderedPage {
        identifier,
        front_matter,
    })
}
