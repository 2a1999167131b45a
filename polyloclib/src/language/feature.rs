//! Compiled per-language token tables.
//!
//! A [`LanguageDatabase`] is built once from the JSON table and then shared
//! read-only between every worker thread.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};

use crate::error::PolylocError;
use crate::language::bloom::BloomFilter;
use crate::language::data::{parse_languages, Language, EMBEDDED_LANGUAGES};
use crate::language::trie::{TokenKind, TokenTrie};
use crate::options::ScanConfig;
use crate::Result;

/// Everything the lexer needs to know about one language.
#[derive(Debug, Clone)]
pub struct LanguageFeature {
    pub name: String,
    /// Every marker the language recognises
    pub tokens: TokenTrie,
    /// Block comment openers only, used to detect nesting
    pub multi_line_comments: TokenTrie,
    /// Block comments may nest
    pub nested: bool,
    /// Union of the bloom hashes of every token's first byte
    pub process_mask: BloomFilter,
    pub keywords: Vec<String>,
    /// No tokens at all; counted with a newline scan
    pub plain_text: bool,
}

impl LanguageFeature {
    /// Compile the token tables for `language`.
    ///
    /// Markers are inserted complexity keywords first, then line comments,
    /// block comments and finally quotes, so a quote spelled like a comment
    /// is treated as a quote.
    pub fn new(name: &str, language: &Language, count_complexity: bool) -> Result<Self> {
        let malformed = |message: String| PolylocError::MalformedLanguage {
            language: name.to_string(),
            message,
        };

        let mut tokens = TokenTrie::new();
        let mut multi_line_comments = TokenTrie::new();
        let mut process_mask = BloomFilter::new();

        if count_complexity {
            for check in &language.complexity_checks {
                let first = first_byte(check)
                    .ok_or_else(|| malformed("empty complexity check".to_string()))?;
                process_mask.insert(first);
                tokens.insert(TokenKind::Complexity, check.as_bytes());
            }
        }

        for comment in &language.line_comment {
            let first =
                first_byte(comment).ok_or_else(|| malformed("empty line comment".to_string()))?;
            process_mask.insert(first);
            tokens.insert(TokenKind::SingleLineComment, comment.as_bytes());
        }

        for (open, close) in &language.multi_line {
            let first = first_byte(open)
                .ok_or_else(|| malformed("empty multi-line comment opener".to_string()))?;
            if close.is_empty() {
                return Err(malformed(format!("multi-line comment '{open}' has no end")));
            }
            process_mask.insert(first);
            tokens.insert_close(TokenKind::MultiLineComment, open.as_bytes(), close.as_bytes());
            multi_line_comments.insert_close(
                TokenKind::MultiLineComment,
                open.as_bytes(),
                close.as_bytes(),
            );
        }

        for quote in &language.quotes {
            let first =
                first_byte(&quote.start).ok_or_else(|| malformed("empty quote start".to_string()))?;
            if quote.end.is_empty() {
                return Err(malformed(format!("quote '{}' has no end", quote.start)));
            }
            process_mask.insert(first);
            tokens.insert_quote(
                quote.start.as_bytes(),
                quote.end.as_bytes(),
                quote.ignore_escape,
                quote.doc_string,
            );
        }

        Ok(Self {
            name: name.to_string(),
            tokens,
            multi_line_comments,
            nested: language.nested_multi_line,
            process_mask,
            keywords: language.keywords.clone(),
            plain_text: language.is_plain_text(),
        })
    }
}

fn first_byte(token: &str) -> Option<u8> {
    token.as_bytes().first().copied()
}

/// All compiled languages plus the lookup tables used for detection.
#[derive(Debug, Clone, Default)]
pub struct LanguageDatabase {
    features: HashMap<String, LanguageFeature>,
    extensions: HashMap<String, Vec<String>>,
    filenames: HashMap<String, String>,
    /// Sorted by language name
    shebangs: Vec<(String, Vec<String>)>,
}

impl LanguageDatabase {
    /// Compile the table shipped with the library.
    pub fn embedded(count_complexity: bool) -> Result<Self> {
        Self::from_json(EMBEDDED_LANGUAGES, count_complexity)
    }

    /// Compile the embedded table for `config`: complexity on or off, with
    /// the config's count-as rules applied.
    pub fn configured(config: &ScanConfig) -> Result<Self> {
        let mut db = Self::embedded(config.count_complexity)?;
        for (extension, target) in &config.count_as {
            if !db.count_as(extension, target) {
                warn!("unable to count extension {extension} as {target}: no such language or extension");
            }
        }
        Ok(db)
    }

    /// Compile a table in the same JSON format as the embedded one.
    pub fn from_json(json: &str, count_complexity: bool) -> Result<Self> {
        Self::from_languages(&parse_languages(json)?, count_complexity)
    }

    pub fn from_languages(
        languages: &BTreeMap<String, Language>,
        count_complexity: bool,
    ) -> Result<Self> {
        let mut db = Self::default();

        for (name, language) in languages {
            let feature = LanguageFeature::new(name, language, count_complexity)?;
            db.features.insert(name.clone(), feature);

            for extension in &language.extensions {
                db.extensions
                    .entry(extension.to_lowercase())
                    .or_default()
                    .push(name.clone());
            }
            for filename in &language.filenames {
                db.filenames.insert(filename.to_lowercase(), name.clone());
            }
            if !language.shebangs.is_empty() {
                db.shebangs.push((name.clone(), language.shebangs.clone()));
            }
        }

        Ok(db)
    }

    /// Feature table for `name`, or `None` if the language is unknown.
    pub fn feature(&self, name: &str) -> Option<&LanguageFeature> {
        self.features.get(name)
    }

    /// Like [`feature`](Self::feature) but unknown languages are an error.
    pub fn get(&self, name: &str) -> Result<&LanguageFeature> {
        self.feature(name)
            .ok_or_else(|| PolylocError::UnknownLanguage(name.to_string()))
    }

    /// Languages claiming a lower-cased extension (without the dot).
    pub fn languages_for_extension(&self, extension: &str) -> Option<&[String]> {
        self.extensions.get(extension).map(Vec::as_slice)
    }

    /// Language owning a lower-cased full filename such as `makefile`.
    pub fn language_for_filename(&self, filename: &str) -> Option<&str> {
        self.filenames.get(filename).map(String::as_str)
    }

    /// Language whose interpreter list contains `command`.
    pub fn language_for_interpreter(&self, command: &str) -> Option<&str> {
        self.shebangs
            .iter()
            .find(|(_, commands)| commands.iter().any(|c| c == command))
            .map(|(name, _)| name.as_str())
    }

    /// Count files with `extension` as `target`.
    ///
    /// `target` is matched case-insensitively against language names first,
    /// then looked up as an extension. Returns `false` when it matches
    /// neither.
    pub fn count_as(&mut self, extension: &str, target: &str) -> bool {
        let extension = extension.to_lowercase();

        let named: Vec<String> = self
            .features
            .keys()
            .filter(|name| name.eq_ignore_ascii_case(target))
            .cloned()
            .collect();
        if !named.is_empty() {
            debug!("counting extension {extension} as language {}", named[0]);
            self.extensions.insert(extension, named);
            return true;
        }

        match self.extensions.get(&target.to_lowercase()).cloned() {
            Some(languages) => {
                debug!("counting extension {extension} as {languages:?} by extension");
                self.extensions.insert(extension, languages);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Names of every known language, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.features.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
