//! Aggregated counts per language and for a whole scan

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::job::FileJob;

/// Counts summed over a set of files
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocStats {
    /// Number of files
    pub count: u64,
    pub bytes: u64,
    /// Physical lines, always `code + comment + blank`
    pub lines: u64,
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
    pub complexity: u64,
}

impl LocStats {
    /// Create new empty stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts of a single classified file
    pub fn from_job(job: &FileJob) -> Self {
        Self {
            count: 1,
            bytes: job.bytes,
            lines: job.lines,
            code: job.code,
            comment: job.comment,
            blank: job.blank,
            complexity: job.complexity,
        }
    }
}

impl fmt::Display for LocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} lines, {} code, {} comment, {} blank, {} complexity",
            self.count, self.lines, self.code, self.comment, self.blank, self.complexity
        )
    }
}

impl Add for LocStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            count: self.count + other.count,
            bytes: self.bytes + other.bytes,
            lines: self.lines + other.lines,
            code: self.code + other.code,
            comment: self.comment + other.comment,
            blank: self.blank + other.blank,
            complexity: self.complexity + other.complexity,
        }
    }
}

impl AddAssign for LocStats {
    fn add_assign(&mut self, other: Self) {
        self.count += other.count;
        self.bytes += other.bytes;
        self.lines += other.lines;
        self.code += other.code;
        self.comment += other.comment;
        self.blank += other.blank;
        self.complexity += other.complexity;
    }
}

/// Longest and mean physical line length, in bytes.
///
/// Lines are split on `\n`, so a trailing newline adds an empty line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineLengths {
    pub max: u64,
    pub total: u64,
    pub lines: u64,
}

impl LineLengths {
    pub fn from_content(content: &[u8]) -> Self {
        content
            .split(|&b| b == b'\n')
            .fold(Self::default(), |mut acc, line| {
                let len = line.len() as u64;
                acc.max = acc.max.max(len);
                acc.total += len;
                acc.lines += 1;
                acc
            })
    }

    /// Mean line length, rounded down.
    pub fn mean(&self) -> u64 {
        if self.lines == 0 {
            0
        } else {
            self.total / self.lines
        }
    }
}

impl AddAssign for LineLengths {
    fn add_assign(&mut self, other: Self) {
        self.max = self.max.max(other.max);
        self.total += other.total;
        self.lines += other.lines;
    }
}

/// Running total for one language
#[derive(Debug, Default, Serialize)]
pub struct LanguageSummary {
    pub name: String,
    #[serde(flatten)]
    pub stats: LocStats,
    /// Distinct lines over all files of the language
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_lines: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_lengths: Option<LineLengths>,
    /// Individual files, only kept when per-file results are requested
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<FileJob>,
}

impl LanguageSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Result of scanning one or more paths
#[derive(Debug, Default, Serialize)]
pub struct ScanResult {
    /// Per-language totals keyed by language name
    pub languages: BTreeMap<String, LanguageSummary>,
    /// Totals across all languages
    pub total: LocStats,
    /// Distinct lines across all languages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_lines: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_lengths: Option<LineLengths>,
}

impl ScanResult {
    /// Create a new empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a classified file into the totals.
    ///
    /// The job is retained only when `keep_file` is set; its content is
    /// dropped either way.
    pub fn add_job(&mut self, mut job: FileJob, keep_file: bool) {
        let stats = LocStats::from_job(&job);
        self.total += stats;

        let summary = self
            .languages
            .entry(job.language.clone())
            .or_insert_with(|| LanguageSummary::new(job.language.clone()));
        summary.stats += stats;

        if let Some(lengths) = job.line_lengths {
            *summary.line_lengths.get_or_insert_with(LineLengths::default) += lengths;
            *self.line_lengths.get_or_insert_with(LineLengths::default) += lengths;
        }

        if keep_file {
            job.content = Vec::new();
            job.callback = None;
            summary.files.push(job);
        }
    }

    /// Summary for one language, if any file of it was counted.
    pub fn language(&self, name: &str) -> Option<&LanguageSummary> {
        self.languages.get(name)
    }

    /// Number of files counted
    pub fn file_count(&self) -> u64 {
        self.total.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(language: &str, lines: u64, code: u64, comment: u64, blank: u64) -> FileJob {
        let mut job = FileJob::new(language, vec![b'x'; 10]);
        job.lines = lines;
        job.code = code;
        job.comment = comment;
        job.blank = blank;
        job.complexity = 1;
        job
    }

    #[test]
    fn test_loc_stats_add() {
        let a = LocStats {
            count: 1,
            bytes: 10,
            lines: 5,
            code: 3,
            comment: 1,
            blank: 1,
            complexity: 2,
        };
        let b = LocStats {
            count: 2,
            bytes: 20,
            lines: 8,
            code: 4,
            comment: 2,
            blank: 2,
            complexity: 0,
        };

        let sum = a + b;
        assert_eq!(sum.count, 3);
        assert_eq!(sum.bytes, 30);
        assert_eq!(sum.lines, 13);
        assert_eq!(sum.code, 7);
        assert_eq!(sum.complexity, 2);

        let mut acc = LocStats::new();
        acc += a;
        acc += b;
        assert_eq!(acc, sum);
    }

    #[test]
    fn test_loc_stats_display() {
        let stats = LocStats {
            count: 2,
            lines: 10,
            code: 6,
            comment: 3,
            blank: 1,
            ..LocStats::new()
        };
        assert_eq!(
            stats.to_string(),
            "2 files, 10 lines, 6 code, 3 comment, 1 blank, 0 complexity"
        );
    }

    #[test]
    fn test_add_job_groups_by_language() {
        let mut result = ScanResult::new();
        result.add_job(job("Rust", 10, 7, 2, 1), false);
        result.add_job(job("Rust", 5, 5, 0, 0), false);
        result.add_job(job("C", 3, 1, 1, 1), false);

        let rust = result.language("Rust").unwrap();
        assert_eq!(rust.stats.count, 2);
        assert_eq!(rust.stats.lines, 15);
        assert_eq!(rust.stats.code, 12);
        assert_eq!(rust.stats.complexity, 2);
        assert!(rust.files.is_empty());

        assert_eq!(result.file_count(), 3);
        assert_eq!(result.total.lines, 18);
        assert_eq!(result.total.bytes, 30);
        assert_eq!(
            result.languages.keys().collect::<Vec<_>>(),
            vec!["C", "Rust"]
        );
    }

    #[test]
    fn test_add_job_keeps_files_without_content() {
        let mut result = ScanResult::new();
        result.add_job(job("Go", 1, 1, 0, 0), true);

        let go = result.language("Go").unwrap();
        assert_eq!(go.files.len(), 1);
        assert!(go.files[0].content.is_empty());
        assert_eq!(go.files[0].bytes, 10);
    }

    #[test]
    fn test_line_lengths() {
        let lengths = LineLengths::from_content(b"ab\nabcdef\n");
        assert_eq!(lengths.max, 6);
        assert_eq!(lengths.lines, 3);
        assert_eq!(lengths.mean(), 2);
        assert_eq!(LineLengths::default().mean(), 0);
    }

    #[test]
    fn test_add_job_merges_line_lengths() {
        let mut result = ScanResult::new();
        let mut a = job("Go", 1, 1, 0, 0);
        a.line_lengths = Some(LineLengths { max: 10, total: 20, lines: 4 });
        let mut b = job("Go", 1, 1, 0, 0);
        b.line_lengths = Some(LineLengths { max: 30, total: 40, lines: 2 });
        result.add_job(a, false);
        result.add_job(b, false);
        result.add_job(job("C", 1, 1, 0, 0), false);

        let go = result.language("Go").unwrap().line_lengths.unwrap();
        assert_eq!(go.max, 30);
        assert_eq!(go.mean(), 10);
        assert!(result.language("C").unwrap().line_lengths.is_none());
        assert_eq!(result.line_lengths.unwrap().lines, 6);
    }

    #[test]
    fn test_summary_serializes_flat() {
        let mut result = ScanResult::new();
        result.add_job(job("Go", 1, 1, 0, 0), false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["languages"]["Go"]["code"], 1);
        assert_eq!(json["languages"]["Go"]["name"], "Go");
        assert!(json["languages"]["Go"].get("files").is_none());
        assert!(json["languages"]["Go"].get("unique_lines").is_none());
    }
}
