//! BibTeX reading.
//!
//! The renderer only ever sees [`CitationEntry`] values; how they are produced
//! sits behind the [`CitationParser`] trait. [`BibtexParser`] is the built-in
//! implementation and covers what publication lists exported from reference
//! managers actually contain:
//!
//! ```text
//! @string{vldb = "Proc. VLDB Endowment"}
//!
//! @inproceedings{vanaken2017,
//!   title     = {Automatic Database Management System Tuning Through
//!                Large-scale Machine Learning},
//!   author    = {Van Aken, Dana and Pavlo, Andrew and Gordon, Geoffrey J.},
//!   booktitle = vldb # " 2017",
//!   year      = 2017,
//!   month     = may,
//! }
//! ```
//!
//! - Values in braces, double quotes, bare numbers or macro names, joined with `#`
//! - `@string` macros plus the predefined month names (`jan` … `dec`)
//! - `@comment` and `@preamble` are skipped, as is any text between entries
//! - Entry types and field names are case-insensitive and stored lowercased
//! - Runs of whitespace inside values collapse to one space; inner braces are kept
//!
//! `author` and `editor` are moved out of `fields` into `persons`, split on
//! the top-level word `and` and broken into name parts.

use crate::types::{CitationEntry, Person};
use indexmap::IndexMap;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CitationError {
    #[error("BibTeX syntax error on line {line}: {message}")]
    Syntax { line: usize, message: String },
}

/// Turns raw citation text into entries.
pub trait CitationParser: Sync {
    fn parse(&self, source: &str) -> Result<Vec<CitationEntry>, CitationError>;
}

/// Built-in BibTeX reader.
#[derive(Debug, Default, Clone, Copy)]
pub struct BibtexParser;

impl CitationParser for BibtexParser {
    fn parse(&self, source: &str) -> Result<Vec<CitationEntry>, CitationError> {
        parse_bibtex(source)
    }
}

/// Fields whose values are lists of names.
const PERSON_FIELDS: &[&str] = &["author", "editor"];

const MONTHS: &[(&str, &str)] = &[
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

/// Parse a complete BibTeX document.
pub fn parse_bibtex(source: &str) -> Result<Vec<CitationEntry>, CitationError> {
    let mut cursor = Cursor::new(source);
    let mut macros: HashMap<String, String> = MONTHS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let mut entries = Vec::new();

    while cursor.skip_to('@') {
        cursor.bump();
        cursor.skip_ws();
        let entry_type = cursor.read_ident().to_lowercase();
        if entry_type.is_empty() {
            return Err(cursor.error("expected entry type after '@'"));
        }
        cursor.skip_ws();

        if entry_type == "comment" {
            match cursor.peek() {
                Some('{') | Some('(') => cursor.skip_balanced()?,
                _ => cursor.skip_line(),
            }
            continue;
        }

        let close = match cursor.peek() {
            Some('{') => '}',
            Some('(') => ')',
            _ => return Err(cursor.error(&format!("expected '{{' after @{entry_type}"))),
        };

        match entry_type.as_str() {
            "preamble" => cursor.skip_balanced()?,
            "string" => {
                cursor.bump();
                let defined = cursor.read_fields(close, &macros)?;
                for (name, value) in defined {
                    macros.insert(name, value);
                }
            }
            _ => {
                cursor.bump();
                let key = cursor.read_key(close);
                let mut fields = if cursor.peek() == Some(close) {
                    cursor.bump();
                    IndexMap::new()
                } else {
                    cursor.bump();
                    cursor.read_fields(close, &macros)?
                };

                let mut persons = IndexMap::new();
                for role in PERSON_FIELDS {
                    if let Some(names) = fields.shift_remove(*role) {
                        persons.insert(role.to_string(), parse_names(&names));
                    }
                }

                entries.push(CitationEntry {
                    key,
                    entry_type,
                    fields,
                    persons,
                });
            }
        }
    }

    Ok(entries)
}

struct Cursor {
    chars: Vec<char>,
    pos: usize,
}

fn is_ident_char(c: char) -> bool {
    !c.is_whitespace() && !matches!(c, '{' | '}' | '(' | ')' | ',' | '=' | '"' | '#' | '@' | '%')
}

impl Cursor {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn line(&self) -> usize {
        self.chars[..self.pos.min(self.chars.len())]
            .iter()
            .filter(|&&c| c == '\n')
            .count()
            + 1
    }

    fn error(&self, message: &str) -> CitationError {
        CitationError::Syntax {
            line: self.line(),
            message: message.to_string(),
        }
    }

    /// Advance to the next `target`. Returns false at end of input.
    fn skip_to(&mut self, target: char) -> bool {
        while let Some(c) = self.peek() {
            if c == target {
                return true;
            }
            self.pos += 1;
        }
        false
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Skip a `{...}` or `(...)` group including its delimiters.
    fn skip_balanced(&mut self) -> Result<(), CitationError> {
        let (open, close) = match self.bump() {
            Some('{') => ('{', '}'),
            Some('(') => ('(', ')'),
            _ => return Err(self.error("expected an opening delimiter")),
        };
        let mut depth = 1;
        while let Some(c) = self.bump() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(self.error("unexpected end of input inside a group"))
    }

    /// Read the cite key, stopping before `,` or the entry's closing delimiter.
    fn read_key(&mut self, close: char) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == ',' || c == close {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos]
            .iter()
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Read `name = value` pairs up to and including the closing delimiter.
    fn read_fields(
        &mut self,
        close: char,
        macros: &HashMap<String, String>,
    ) -> Result<IndexMap<String, String>, CitationError> {
        let mut fields = IndexMap::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return Err(self.error("unexpected end of input inside an entry")),
                Some(c) if c == close => {
                    self.pos += 1;
                    return Ok(fields);
                }
                Some(',') => {
                    self.pos += 1;
                    continue;
                }
                Some(_) => {}
            }

            let name = self.read_ident().to_lowercase();
            if name.is_empty() {
                return Err(self.error("expected a field name"));
            }
            self.skip_ws();
            if self.bump() != Some('=') {
                return Err(self.error(&format!("expected '=' after field '{name}'")));
            }
            let value = self.read_value(macros)?;
            fields.insert(name, value);
        }
    }

    /// Read a value expression: pieces joined with `#`.
    fn read_value(&mut self, macros: &HashMap<String, String>) -> Result<String, CitationError> {
        let mut value = String::new();
        loop {
            self.skip_ws();
            match self.peek() {
                Some('{') => {
                    self.pos += 1;
                    value.push_str(&self.read_delimited('}')?);
                }
                Some('"') => {
                    self.pos += 1;
                    value.push_str(&self.read_delimited('"')?);
                }
                Some(c) if is_ident_char(c) => {
                    let word = self.read_ident();
                    if word.chars().all(|c| c.is_ascii_digit()) {
                        value.push_str(&word);
                    } else {
                        match macros.get(&word.to_lowercase()) {
                            Some(expansion) => value.push_str(expansion),
                            None => {
                                return Err(self.error(&format!("undefined macro '{word}'")));
                            }
                        }
                    }
                }
                _ => return Err(self.error("expected a field value")),
            }
            self.skip_ws();
            if self.peek() == Some('#') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(value.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Read up to the unnested `end` (past the opening delimiter already).
    /// Inner braces are kept in the returned text.
    fn read_delimited(&mut self, end: char) -> Result<String, CitationError> {
        let mut text = String::new();
        let mut depth = 0usize;
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth == 0 && end == '}' => return Ok(text),
                '}' if depth == 0 => return Err(self.error("unbalanced '}' in value")),
                '}' => depth -= 1,
                '"' if depth == 0 && end == '"' => return Ok(text),
                _ => {}
            }
            text.push(c);
        }
        Err(self.error("unexpected end of input inside a value"))
    }
}

// =============================================================================
// Names
// =============================================================================

#[derive(Debug, PartialEq)]
enum NameToken {
    Word(String),
    Comma,
}

/// Split on top-level whitespace, `~` ties and commas; braced groups stay in
/// one word.
fn tokenize_names(value: &str) -> Vec<NameToken> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;

    let flush = |word: &mut String, tokens: &mut Vec<NameToken>| {
        if !word.is_empty() {
            tokens.push(NameToken::Word(std::mem::take(word)));
        }
    };

    for c in value.chars() {
        match c {
            '{' => {
                depth += 1;
                word.push(c);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                word.push(c);
            }
            ',' if depth == 0 => {
                flush(&mut word, &mut tokens);
                tokens.push(NameToken::Comma);
            }
            c if (c.is_whitespace() || c == '~') && depth == 0 => {
                flush(&mut word, &mut tokens)
            }
            _ => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Parse an `author`/`editor` value into people.
pub fn parse_names(value: &str) -> Vec<Person> {
    let mut people = Vec::new();
    let mut current: Vec<NameToken> = Vec::new();
    for token in tokenize_names(value) {
        match &token {
            NameToken::Word(w) if w.eq_ignore_ascii_case("and") => {
                if !current.is_empty() {
                    people.push(parse_person(std::mem::take(&mut current)));
                }
            }
            _ => current.push(token),
        }
    }
    if !current.is_empty() {
        people.push(parse_person(current));
    }
    people
}

/// A "von" word starts with a lowercase letter (`van`, `de`, `von`).
fn is_von(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_lowercase)
}

fn split_first_middle(words: &[String]) -> (Vec<String>, Vec<String>) {
    match words.split_first() {
        Some((first, middle)) => (vec![first.clone()], middle.to_vec()),
        None => (Vec::new(), Vec::new()),
    }
}

/// Split `von Last` words: leading lowercase words are the von part, but the
/// last name always keeps at least one word.
fn split_von_last(words: &[String]) -> (Vec<String>, Vec<String>) {
    if words.len() < 2 {
        return (Vec::new(), words.to_vec());
    }
    let von_len = words[..words.len() - 1]
        .iter()
        .take_while(|w| is_von(w))
        .count();
    (words[..von_len].to_vec(), words[von_len..].to_vec())
}

fn parse_person(tokens: Vec<NameToken>) -> Person {
    let mut parts: Vec<Vec<String>> = vec![Vec::new()];
    for token in tokens {
        match token {
            NameToken::Comma => parts.push(Vec::new()),
            NameToken::Word(w) => {
                if let Some(part) = parts.last_mut() {
                    part.push(w);
                }
            }
        }
    }

    match parts.len() {
        // First von Last
        1 => {
            let words = &parts[0];
            let Some(last_idx) = words.len().checked_sub(1) else {
                return Person::default();
            };
            let head = &words[..last_idx];
            match head.iter().position(|w| is_von(w)) {
                Some(von_start) => {
                    let von_end = head
                        .iter()
                        .rposition(|w| is_von(w))
                        .map_or(von_start, |i| i + 1);
                    let (first, middle) = split_first_middle(&words[..von_start]);
                    Person {
                        first,
                        middle,
                        prelast: words[von_start..von_end].to_vec(),
                        last: words[von_end..].to_vec(),
                        lineage: Vec::new(),
                    }
                }
                None => {
                    let (first, middle) = split_first_middle(head);
                    Person {
                        first,
                        middle,
                        prelast: Vec::new(),
                        last: vec![words[last_idx].clone()],
                        lineage: Vec::new(),
                    }
                }
            }
        }
        // von Last, First
        2 => {
            let (prelast, last) = split_von_last(&parts[0]);
            let (first, middle) = split_first_middle(&parts[1]);
            Person {
                first,
                middle,
                prelast,
                last,
                lineage: Vec::new(),
            }
        }
        // von Last, Jr, First
        _ => {
            let (prelast, last) = split_von_last(&parts[0]);
            let rest: Vec<String> = parts[2..].concat();
            let (first, middle) = split_first_middle(&rest);
            Person {
                first,
                middle,
                prelast,
                last,
                lineage: parts[1].clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_single_entry() {
        let src = r#"
            @inproceedings{vanaken2017,
              title = {Automatic {DBMS} Tuning},
              booktitle = "SIGMOD",
              year = 2017,
            }
        "#;
        let entries = parse_bibtex(src).unwrap();
        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.key, "vanaken2017");
        assert_eq!(e.entry_type, "inproceedings");
        assert_eq!(e.fields["title"], "Automatic {DBMS} Tuning");
        assert_eq!(e.fields["booktitle"], "SIGMOD");
        assert_eq!(e.fields["year"], "2017");
    }

    #[test]
    fn field_names_and_types_are_lowercased() {
        let entries = parse_bibtex("@ARTICLE{k, TITLE={T}, Year={2001}}").unwrap();
        assert_eq!(entries[0].entry_type, "article");
        assert_eq!(entries[0].fields["title"], "T");
        assert_eq!(entries[0].fields["year"], "2001");
    }

    #[test]
    fn whitespace_in_values_is_collapsed() {
        let src = "@misc{k, title = {A   long\n        title}}";
        let entries = parse_bibtex(src).unwrap();
        assert_eq!(entries[0].fields["title"], "A long title");
    }

    #[test]
    fn string_macros_and_concatenation() {
        let src = r#"
            @string{vldb = "Proc. VLDB"}
            @inproceedings{k, booktitle = vldb # " 2017", month = may}
        "#;
        let entries = parse_bibtex(src).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].fields["booktitle"], "Proc. VLDB 2017");
        assert_eq!(entries[0].fields["month"], "May");
    }

    #[test]
    fn undefined_macro_is_an_error() {
        let err = parse_bibtex("@misc{k, journal = nosuch}").unwrap_err();
        assert!(err.to_string().contains("nosuch"));
    }

    #[test]
    fn comments_preamble_and_stray_text_are_skipped() {
        let src = r#"
            Exported from my reference manager.
            @comment{ignore {me} please}
            @preamble{"\newcommand{\x}{y}"}
            @misc(paren, title = "Parens")
        "#;
        let entries = parse_bibtex(src).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "paren");
        assert_eq!(entries[0].fields["title"], "Parens");
    }

    #[test]
    fn quoted_value_may_contain_braced_quote() {
        let entries = parse_bibtex(r#"@misc{k, title = "The {"}Quote{"} Test"}"#).unwrap();
        assert_eq!(entries[0].fields["title"], r#"The {"}Quote{"} Test"#);
    }

    #[test]
    fn unterminated_entry_reports_line() {
        let err = parse_bibtex("\n\n@misc{k, title = {oops").unwrap_err();
        let CitationError::Syntax { line, .. } = err;
        assert_eq!(line, 3);
    }

    #[test]
    fn authors_move_into_persons() {
        let src = "@misc{k, author = {Van Aken, Dana and Andrew Pavlo}, title = {T}}";
        let entries = parse_bibtex(src).unwrap();
        let e = &entries[0];
        assert!(!e.fields.contains_key("author"));
        let authors = &e.persons["author"];
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].display_name(), "Dana Van Aken");
        assert_eq!(authors[1].display_name(), "Andrew Pavlo");
    }

    #[test]
    fn name_first_von_last() {
        let people = parse_names("Ludwig van Beethoven");
        assert_eq!(people[0].first, words(&["Ludwig"]));
        assert_eq!(people[0].prelast, words(&["van"]));
        assert_eq!(people[0].last, words(&["Beethoven"]));
    }

    #[test]
    fn name_first_middle_last() {
        let people = parse_names("Geoffrey J. Gordon");
        assert_eq!(people[0].first, words(&["Geoffrey"]));
        assert_eq!(people[0].middle, words(&["J."]));
        assert_eq!(people[0].last, words(&["Gordon"]));
    }

    #[test]
    fn name_von_last_comma_first() {
        let people = parse_names("de la Fontaine, Jean Pierre");
        assert_eq!(people[0].prelast, words(&["de", "la"]));
        assert_eq!(people[0].last, words(&["Fontaine"]));
        assert_eq!(people[0].first, words(&["Jean"]));
        assert_eq!(people[0].middle, words(&["Pierre"]));
    }

    #[test]
    fn name_with_lineage() {
        let people = parse_names("King, Jr., Martin Luther");
        assert_eq!(people[0].last, words(&["King"]));
        assert_eq!(people[0].lineage, words(&["Jr."]));
        assert_eq!(people[0].first, words(&["Martin"]));
        assert_eq!(people[0].middle, words(&["Luther"]));
        assert_eq!(people[0].display_name(), "Martin Luther King");
    }

    #[test]
    fn name_single_word_is_last() {
        let people = parse_names("Plato");
        assert_eq!(people[0].last, words(&["Plato"]));
        assert!(people[0].first.is_empty());
    }

    #[test]
    fn tilde_ties_separate_name_parts() {
        let people = parse_names("Dana~Van~Aken and Van~Aken, Dana and {Le~Roux}, Nicolas");
        assert_eq!(people.len(), 3);
        assert_eq!(people[0].first, words(&["Dana"]));
        assert_eq!(people[0].middle, words(&["Van"]));
        assert_eq!(people[0].last, words(&["Aken"]));
        assert_eq!(people[0].display_name(), "Dana Van Aken");
        assert_eq!(people[1].last, words(&["Van", "Aken"]));
        assert_eq!(people[1].display_name(), "Dana Van Aken");
        // Braced ties stay inside the word.
        assert_eq!(people[2].last, words(&["{Le~Roux}"]));
    }

    #[test]
    fn braced_and_is_not_a_separator() {
        let people = parse_names("{Barnes and Noble} and Jane Doe");
        assert_eq!(people.len(), 2);
        assert_eq!(people[0].last, words(&["{Barnes and Noble}"]));
        assert_eq!(people[1].display_name(), "Jane Doe");
    }

    #[test]
    fn uppercase_and_separates_names() {
        let people = parse_names("Ada Lovelace AND Charles Babbage");
        assert_eq!(people.len(), 2);
        assert_eq!(people[1].display_name(), "Charles Babbage");
    }
}
