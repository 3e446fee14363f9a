//! Text escaping for front-matter values.
//!
//! Front-matter parsers are picky about quotes inside string values, so free
//! text is rewritten with HTML entities before it is wrapped in single quotes.
//! The entities are decoded again when the site renders the page.
//!
//! | Char | Entity   |
//! |------|----------|
//! | `&`  | `&amp;`  |
//! | `"`  | `&quot;` |
//! | `'`  | `&apos;` |
//!
//! The scan is character-by-character, not pattern-based: an existing entity
//! such as `&amp;` is escaped again to `&amp;amp;`. Escaping is therefore not
//! idempotent and must be applied exactly once per value.

/// Replace `&`, `"` and `'` with their HTML entities.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Strip BibTeX formatting characters: `{`, `}` and `\`.
///
/// Entries often protect capitalization with braces (`{GPU} Scheduling`) or
/// carry TeX escapes (`Caf\'e`); neither belongs in a page title.
pub fn clean_markup(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '{' | '}' | '\\'))
        .collect()
}
