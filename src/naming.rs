//! Output identifiers for publication pages.
//!
//! Every page is named `<date-prefix>-<slug>` and written as `<identifier>.md`.
//! The identifier doubles as the last segment of the page permalink, so it has
//! to be safe in both a filename and a URL.
//!
//! Two derivations exist, one per input family:
//!
//! - **Explicit slug** (JSON and table inputs): the record carries its own
//!   `urlslug`, used verbatim. `2020-05-01` + `my-paper` → `2020-05-01-my-paper`.
//!   Nothing is sanitized; a slug containing `/` or spaces goes straight into
//!   the filename.
//! - **Title-derived** (BibTeX input): only a year and a title are known, so the
//!   slug comes from [`sanitize_title`]. `2019` + `A [Draft] Study -- On Caching`
//!   → `2019-A-Study-On-Caching`.
//!
//! Case is never changed.

/// Build an identifier from a date and a caller-supplied slug.
pub fn explicit_identifier(date: &str, slug: &str) -> String {
    format!("{date}-{slug}")
}

/// Build an identifier from a year and a free-text title.
///
/// Hyphen runs are collapsed across the whole identifier, so a title that
/// sanitizes to a leading dash does not produce `2019--...`.
pub fn title_identifier(year: &str, title: &str) -> String {
    collapse_dashes(&format!("{year}-{}", sanitize_title(title)))
}

/// Turn a title into a slug.
///
/// - Spaces become dashes
/// - A bracketed span is dropped with its content: from a `[` through the last
///   `]` after it (`A [Draft] B [v2] C` loses everything from `[Draft` to `v2]`)
/// - Characters outside `[A-Za-z0-9_-]` are dropped
/// - Runs of dashes collapse to one
///
/// Leading and trailing dashes are kept. An empty or all-punctuation title
/// yields an empty slug.
pub fn sanitize_title(title: &str) -> String {
    let chars: Vec<char> = title.chars().map(|c| if c == ' ' { '-' } else { c }).collect();
    let last_close = chars.iter().rposition(|&c| c == ']');

    let mut kept = String::with_capacity(chars.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == '[' {
            if let Some(end) = last_close.filter(|&end| end > i) {
                i = end + 1;
                continue;
            }
        }
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            kept.push(c);
        }
        i += 1;
    }

    collapse_dashes(&kept)
}

/// Collapse every run of two or more dashes into a single dash.
fn collapse_dashes(s: &str) -> String {
    let mut collapsed = String::with_capacity(s.len());
    let mut prev_dash = false;
    for c in s.chars() {
        if c == '-' {
            if !prev_dash {
                collapsed.push('-');
            }
            prev_dash = true;
        } else {
            collapsed.push(c);
            prev_dash = false;
        }
    }
    collapsed
}

/// Year prefix of a date field: the leading four digits of `2021-03-01`.
///
/// Dates are not validated. Anything without a four-digit prefix comes back
/// unchanged.
pub fn year_of(date: &str) -> &str {
    match date.get(..4) {
        Some(prefix) if prefix.bytes().all(|b| b.is_ascii_digit()) => prefix,
        _ => date,
    }
}

/// Synthesize a full date for sources that only know the year.
pub fn citation_date(year: &str) -> String {
    format!("{year}-01-01")
}

/// Markdown filename for an identifier.
pub fn output_filename(identifier: &str) -> String {
    format!("{identifier}.md")
}
