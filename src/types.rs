//! Shared record types passed from the loader to the renderer.

use indexmap::IndexMap;

/// One publication as an ordered field-name → value mapping.
///
/// Order follows the input (JSON object order, table column order). The
/// serializer never relies on it; key order in the output comes from the
/// variant's key table.
pub type Record = IndexMap<String, String>;

/// A loaded publication, tagged with the input family it came from.
///
/// The tag decides which key table and identifier derivation apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    /// Entry from a JSON list.
    List(Record),
    /// Row from a CSV or TSV table (already normalized, see [`normalize_table_record`]).
    Table(Record),
    /// Entry from a BibTeX file.
    Citation(CitationEntry),
}

impl Publication {
    /// Human-readable label for progress and error output.
    ///
    /// BibTeX entries are labelled by cite key; other records by position and
    /// title, e.g. `#3 (Learning to Tune)`.
    pub fn label(&self, index: usize) -> String {
        match self {
            Publication::Citation(entry) => entry.key.clone(),
            Publication::List(record) | Publication::Table(record) => match record.get("title") {
                Some(title) => format!("#{} ({})", index + 1, title),
                None => format!("#{}", index + 1),
            },
        }
    }
}

/// Column names from the legacy table layout and the keys they map to.
const TABLE_ALIASES: &[(&str, &str)] = &[
    ("pub_date", "date"),
    ("url_slug", "urlslug"),
    ("paper_url", "paperurl"),
];

/// Bring a raw table row onto the canonical key names.
///
/// - Legacy columns (`pub_date`, `url_slug`, `paper_url`) are renamed unless
///   the canonical key is also present, in which case the canonical value wins
/// - Cells that are blank after trimming are removed; a table has no other way
///   to say "absent"
pub fn normalize_table_record(raw: Record) -> Record {
    let mut record: Record = raw
        .into_iter()
        .filter(|(_, value)| !value.trim().is_empty())
        .collect();
    for (legacy, canonical) in TABLE_ALIASES {
        if let Some(value) = record.shift_remove(*legacy) {
            if !record.contains_key(*canonical) {
                record.insert((*canonical).to_string(), value);
            }
        }
    }
    record
}

/// A single BibTeX entry as handed over by a [`CitationParser`](crate::citation::CitationParser).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationEntry {
    /// Cite key (`vanaken2017` in `@inproceedings{vanaken2017, ...}`).
    pub key: String,
    /// Lowercased entry type.
    pub entry_type: String,
    /// Lowercased field name → value with outer delimiters removed.
    pub fields: IndexMap<String, String>,
    /// Person roles (`author`, `editor`) → names in source order.
    pub persons: IndexMap<String, Vec<Person>>,
}

/// A name split into BibTeX parts.
///
/// `Ludwig van Beethoven` → first `Ludwig`, prelast `van`, last `Beethoven`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Person {
    pub first: Vec<String>,
    pub middle: Vec<String>,
    /// The "von" part.
    pub prelast: Vec<String>,
    pub last: Vec<String>,
    /// The "Jr." part.
    pub lineage: Vec<String>,
}

impl Person {
    /// First, middle and last names joined with spaces.
    ///
    /// The von and Jr. parts are left out: `van Aken, Dana` displays as
    /// `Dana Aken`.
    pub fn display_name(&self) -> String {
        self.first
            .iter()
            .chain(&self.middle)
            .chain(&self.last)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
