//! Scan configuration.
//!
//! Everything that changes how a scan behaves lives in [`ScanConfig`]. A
//! config is built once, then shared read-only by every worker of a scan.

use std::path::Path;

use glob::Pattern;

use crate::error::PolylocError;
use crate::Result;

/// Markers that identify generated files when found near the top.
pub const DEFAULT_GENERATED_MARKERS: &[&str] = &["do not edit", "<auto-generated />"];

/// Directory names never descended into.
pub const DEFAULT_PATH_DENY_LIST: &[&str] = &[".git", ".hg", ".svn"];

/// Options for a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Count complexity keywords
    pub count_complexity: bool,
    /// Drop files whose content was already seen
    pub duplicates: bool,
    /// Keep each file's job in its language summary
    pub per_file: bool,
    /// NUL bytes in the first 10 000 bytes mark a file as binary
    pub check_binary: bool,
    pub minified: bool,
    pub generated: bool,
    pub ignore_minified: bool,
    pub ignore_generated: bool,
    /// Average bytes per line at or above which a file is minified
    pub minified_line_bytes: u64,
    pub generated_markers: Vec<String>,
    /// Skip files at or above the line or byte limits
    pub no_large: bool,
    pub large_line_count: u64,
    pub large_byte_count: u64,
    /// Glob patterns excluded from the walk
    pub exclude: Vec<Pattern>,
    pub path_deny_list: Vec<String>,
    /// Only count these extensions (empty = all)
    pub allow_extensions: Vec<String>,
    pub exclude_extensions: Vec<String>,
    /// Threads loading file content
    pub reader_workers: usize,
    /// Threads classifying loaded files
    pub classifier_workers: usize,
    /// Directory handles the walker may hold open
    pub walker_workers: usize,
    pub file_list_queue_size: usize,
    pub summary_queue_size: usize,
    /// Count unique lines per file, per language and overall
    pub uloc: bool,
    /// Collect longest and mean line length
    pub max_mean: bool,
    /// `(marker, language)`: files whose head contains the marker are
    /// counted as that language, whatever was detected
    pub remap_all: Vec<(String, String)>,
    /// Like `remap_all`, but only for files with no detected language
    pub remap_unknown: Vec<(String, String)>,
    /// `(extension, target)`: count the extension as the language named by
    /// `target`, or as the language(s) of the extension `target`
    pub count_as: Vec<(String, String)>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        let cpus = num_cpus::get().max(1);
        Self {
            count_complexity: true,
            duplicates: false,
            per_file: false,
            check_binary: true,
            minified: false,
            generated: false,
            ignore_minified: false,
            ignore_generated: false,
            minified_line_bytes: 255,
            generated_markers: DEFAULT_GENERATED_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            no_large: false,
            large_line_count: 40_000,
            large_byte_count: 1_000_000,
            exclude: Vec::new(),
            path_deny_list: DEFAULT_PATH_DENY_LIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
            allow_extensions: Vec::new(),
            exclude_extensions: Vec::new(),
            reader_workers: cpus * 4,
            classifier_workers: cpus,
            walker_workers: 8,
            file_list_queue_size: cpus,
            summary_queue_size: cpus,
            uloc: false,
            max_mean: false,
            remap_all: Vec::new(),
            remap_unknown: Vec::new(),
            count_as: Vec::new(),
        }
    }
}

impl ScanConfig {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_complexity(mut self, enabled: bool) -> Self {
        self.count_complexity = enabled;
        self
    }

    pub fn duplicates(mut self, enabled: bool) -> Self {
        self.duplicates = enabled;
        self
    }

    /// Keep individual file results.
    pub fn with_file_stats(mut self) -> Self {
        self.per_file = true;
        self
    }

    pub fn check_binary(mut self, enabled: bool) -> Self {
        self.check_binary = enabled;
        self
    }

    pub fn minified(mut self, enabled: bool) -> Self {
        self.minified = enabled;
        self
    }

    pub fn generated(mut self, enabled: bool) -> Self {
        self.generated = enabled;
        self
    }

    /// Detect minified files and leave them out of the results.
    pub fn ignore_minified(mut self) -> Self {
        self.minified = true;
        self.ignore_minified = true;
        self
    }

    /// Detect generated files and leave them out of the results.
    pub fn ignore_generated(mut self) -> Self {
        self.generated = true;
        self.ignore_generated = true;
        self
    }

    pub fn minified_line_bytes(mut self, bytes: u64) -> Self {
        self.minified_line_bytes = bytes;
        self
    }

    pub fn generated_markers(mut self, markers: Vec<String>) -> Self {
        self.generated_markers = markers;
        self
    }

    pub fn no_large(mut self, enabled: bool) -> Self {
        self.no_large = enabled;
        self
    }

    pub fn large_line_count(mut self, lines: u64) -> Self {
        self.large_line_count = lines;
        self
    }

    pub fn large_byte_count(mut self, bytes: u64) -> Self {
        self.large_byte_count = bytes;
        self
    }

    /// Add an exclude pattern.
    pub fn exclude(mut self, pattern: &str) -> Result<Self> {
        let pat = Pattern::new(pattern).map_err(|e| PolylocError::InvalidGlob {
            pattern: pattern.to_string(),
            message: e.to_string(),
        })?;
        self.exclude.push(pat);
        Ok(self)
    }

    /// Add multiple exclude patterns.
    pub fn exclude_many(mut self, patterns: &[&str]) -> Result<Self> {
        for pattern in patterns {
            self = self.exclude(pattern)?;
        }
        Ok(self)
    }

    pub fn path_deny_list(mut self, names: Vec<String>) -> Self {
        self.path_deny_list = names;
        self
    }

    pub fn allow_extensions(mut self, extensions: Vec<String>) -> Self {
        self.allow_extensions = extensions;
        self
    }

    pub fn exclude_extensions(mut self, extensions: Vec<String>) -> Self {
        self.exclude_extensions = extensions;
        self
    }

    pub fn reader_workers(mut self, workers: usize) -> Self {
        self.reader_workers = workers.max(1);
        self
    }

    pub fn classifier_workers(mut self, workers: usize) -> Self {
        self.classifier_workers = workers.max(1);
        self
    }

    pub fn walker_workers(mut self, workers: usize) -> Self {
        self.walker_workers = workers.max(1);
        self
    }

    pub fn file_list_queue_size(mut self, size: usize) -> Self {
        self.file_list_queue_size = size;
        self
    }

    pub fn summary_queue_size(mut self, size: usize) -> Self {
        self.summary_queue_size = size;
        self
    }

    pub fn uloc(mut self, enabled: bool) -> Self {
        self.uloc = enabled;
        self
    }

    pub fn max_mean(mut self, enabled: bool) -> Self {
        self.max_mean = enabled;
        self
    }

    /// Count any file whose first 1000 bytes contain `marker` as `language`.
    pub fn remap_all(mut self, marker: impl Into<String>, language: impl Into<String>) -> Self {
        self.remap_all.push((marker.into(), language.into()));
        self
    }

    /// Count a file with no detected language as `language` when its first
    /// 1000 bytes contain `marker`.
    pub fn remap_unknown(mut self, marker: impl Into<String>, language: impl Into<String>) -> Self {
        self.remap_unknown.push((marker.into(), language.into()));
        self
    }

    /// Count files with `extension` as `target`, a language name or another
    /// extension.
    pub fn count_as(mut self, extension: impl Into<String>, target: impl Into<String>) -> Self {
        self.count_as.push((extension.into(), target.into()));
        self
    }

    /// Check a path against the exclude patterns.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|pattern| pattern.matches(&path_str))
    }

    /// Check an extension against the allow and exclude lists.
    pub fn extension_allowed(&self, extension: &str) -> bool {
        if !self.allow_extensions.is_empty() && !self.allow_extensions.iter().any(|x| x == extension)
        {
            return false;
        }
        !self.exclude_extensions.iter().any(|x| x == extension)
    }
}
