//! Unique lines of code.
//!
//! A line is unique when no other line with the same bytes was seen before,
//! in the same file, the same language or anywhere in the scan. Lines are
//! split on `\n` only, so a trailing newline contributes one empty line.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use crate::stats::ScanResult;

/// Number of distinct lines in one file.
pub fn unique_line_count(content: &[u8]) -> u64 {
    content
        .split(|&b| b == b'\n')
        .collect::<HashSet<_>>()
        .len() as u64
}

#[derive(Debug, Default)]
struct LineSets {
    languages: HashMap<String, HashSet<Vec<u8>>>,
    total: HashSet<Vec<u8>>,
}

/// Distinct lines per language and across the whole scan.
///
/// Shared by all classifier workers of a scan. Only files that made it into
/// the results should be added.
#[derive(Debug, Default)]
pub struct UniqueLines {
    sets: Mutex<LineSets>,
}

impl UniqueLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every line of a counted file under `language`.
    pub fn add(&self, language: &str, content: &[u8]) {
        let mut sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        let LineSets { languages, total } = &mut *sets;

        let language = languages.entry(language.to_string()).or_default();
        for line in content.split(|&b| b == b'\n') {
            if !language.contains(line) {
                language.insert(line.to_vec());
            }
            if !total.contains(line) {
                total.insert(line.to_vec());
            }
        }
    }

    /// Distinct lines recorded for `language`.
    pub fn language_count(&self, language: &str) -> u64 {
        let sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        sets.languages
            .get(language)
            .map_or(0, |lines| lines.len() as u64)
    }

    /// Distinct lines recorded across all languages.
    pub fn total_count(&self) -> u64 {
        let sets = self.sets.lock().unwrap_or_else(PoisonError::into_inner);
        sets.total.len() as u64
    }

    /// Store the per-language and total counts on `result`.
    pub fn fold_into(self, result: &mut ScanResult) {
        let sets = self.sets.into_inner().unwrap_or_else(PoisonError::into_inner);
        for (name, summary) in result.languages.iter_mut() {
            let count = sets.languages.get(name).map_or(0, HashSet::len);
            summary.unique_lines = Some(count as u64);
        }
        result.unique_lines = Some(sets.total.len() as u64);
    }
}
