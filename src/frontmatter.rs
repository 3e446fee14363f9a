//! Front-matter serialization.
//!
//! A page is nothing but a front-matter block:
//!
//! ```text
//! ---
//! title: 'Automatic Tuning'
//! collection: 'publications'
//! date: 2017-05-14
//! venue: 'SIGMOD &apos;17'
//! ---
//! ```
//!
//! Which keys appear, in which order, and how each value is written is fixed
//! by a [`FieldSpec`] table per input variant (see [`crate::publication`]).
//! The record's own field order never matters.

use crate::escape::escape;
use crate::types::Record;
use thiserror::Error;

/// Delimiter line above and below the block.
pub const MARKER: &str = "---";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("missing required field `{0}`")]
    MissingField(String),
}

/// How a value is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueStyle {
    /// Entity-escaped and wrapped in single quotes: `title: 'It&apos;s'`.
    Quoted,
    /// Written verbatim without quotes: `date: 2020-05-01`.
    Bare,
}

/// What happens when the record has no value for the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// Missing value is a [`RenderError::MissingField`].
    Required,
    /// Missing value drops the line.
    Optional,
}

/// One row of a key table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub style: ValueStyle,
    pub presence: Presence,
}

impl FieldSpec {
    pub const fn quoted(key: &'static str) -> Self {
        Self {
            key,
            style: ValueStyle::Quoted,
            presence: Presence::Required,
        }
    }

    pub const fn bare(key: &'static str) -> Self {
        Self {
            key,
            style: ValueStyle::Bare,
            presence: Presence::Required,
        }
    }

    pub const fn optional(self) -> Self {
        Self {
            presence: Presence::Optional,
            ..self
        }
    }

    /// Render the `key: value` line.
    fn line(&self, value: &str) -> String {
        match self.style {
            ValueStyle::Quoted => format!("{}: '{}'", self.key, escape(value)),
            ValueStyle::Bare => format!("{}: {}", self.key, value),
        }
    }
}

/// Serialize `record` according to `fields`.
///
/// Returns the first required key that is missing. Keys in the record that
/// the table does not mention are ignored. The block has no trailing newline.
pub fn serialize(record: &Record, fields: &[FieldSpec]) -> Result<String, RenderError> {
    let mut lines = Vec::with_capacity(fields.len() + 2);
    lines.push(MARKER.to_string());
    for spec in fields {
        match (record.get(spec.key), spec.presence) {
            (Some(value), _) => lines.push(spec.line(value)),
            (None, Presence::Optional) => {}
            (None, Presence::Required) => {
                return Err(RenderError::MissingField(spec.key.to_string()));
            }
        }
    }
    lines.push(MARKER.to_string());
    Ok(lines.join("\n"))
}
