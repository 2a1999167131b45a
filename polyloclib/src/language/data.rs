//! Serialized form of the language table.
//!
//! The table ships inside the library as JSON, one entry per language, keyed
//! by the language's display name. Every field except the name is optional
//! in the JSON; missing lists deserialize as empty.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Result;

/// The language table compiled into the library.
pub const EMBEDDED_LANGUAGES: &str = include_str!("languages.json");

/// String delimiter definition for a language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Opening marker, e.g. `"` or `@"` or `r"""`
    pub start: String,
    /// Closing marker
    pub end: String,
    /// Backslash has no escaping meaning inside this string (C# `@"..."`, Go raw strings)
    #[serde(default, rename = "ignoreEscape")]
    pub ignore_escape: bool,
    /// The string may act as a documentation comment when used as a bare statement
    #[serde(default, rename = "docString")]
    pub doc_string: bool,
}

/// Raw per-language definition as stored in the table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default)]
    pub line_comment: Vec<String>,
    #[serde(default, rename = "complexitychecks")]
    pub complexity_checks: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
    /// Open/close pairs for block comments
    #[serde(default)]
    pub multi_line: Vec<(String, String)>,
    #[serde(default)]
    pub quotes: Vec<Quote>,
    #[serde(default, rename = "nestedmultiline")]
    pub nested_multi_line: bool,
    /// Words used to tell apart languages sharing an extension
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub filenames: Vec<String>,
    /// Interpreter names recognised after `#!`
    #[serde(default)]
    pub shebangs: Vec<String>,
}

impl Language {
    /// True when the language has no comment, string or complexity tokens.
    ///
    /// Such files are counted with a plain newline scan.
    pub fn is_plain_text(&self) -> bool {
        self.line_comment.is_empty()
            && self.complexity_checks.is_empty()
            && self.multi_line.is_empty()
            && self.quotes.is_empty()
    }
}

/// Parse a language table from its JSON form.
pub fn parse_languages(json: &str) -> Result<BTreeMap<String, Language>> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_parses() {
        let languages = parse_languages(EMBEDDED_LANGUAGES).unwrap();
        assert!(languages.len() > 250);
        assert!(languages.contains_key("Rust"));
        assert!(languages.contains_key("Plain Text"));
    }

    #[test]
    fn optional_fields_default() {
        let languages = parse_languages(r#"{"Tiny": {"line_comment": [";"]}}"#).unwrap();
        let tiny = &languages["Tiny"];
        assert_eq!(tiny.line_comment, vec![";".to_string()]);
        assert!(tiny.quotes.is_empty());
        assert!(!tiny.nested_multi_line);
        assert!(!tiny.is_plain_text());
    }

    #[test]
    fn quote_flags_deserialize() {
        let languages = parse_languages(
            r#"{"X": {"quotes": [{"start": "@\"", "end": "\"", "ignoreEscape": true},
                                 {"start": "'''", "end": "'''", "docString": true}]}}"#,
        )
        .unwrap();
        let quotes = &languages["X"].quotes;
        assert!(quotes[0].ignore_escape);
        assert!(!quotes[0].doc_string);
        assert!(quotes[1].doc_string);
    }

    #[test]
    fn multi_line_pairs() {
        let languages = parse_languages(EMBEDDED_LANGUAGES).unwrap();
        let rust = &languages["Rust"];
        assert_eq!(rust.multi_line, vec![("/*".to_string(), "*/".to_string())]);
        assert!(rust.nested_multi_line);
        assert!(languages["JSON"].is_plain_text());
    }
}
