//! One file's unit of work.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::lexer::LineCallback;
use crate::stats::LineLengths;

/// A file travelling through the pipeline, and its counts once classified.
///
/// A job is owned by exactly one worker at a time, so its counters need no
/// synchronisation.
#[derive(Default, Serialize)]
pub struct FileJob {
    pub language: String,
    /// Candidates from name based detection, resolved after loading
    pub possible_languages: Vec<String>,
    pub filename: String,
    pub extension: String,
    pub location: PathBuf,
    #[serde(skip)]
    pub content: Vec<u8>,
    pub bytes: u64,
    pub lines: u64,
    pub code: u64,
    pub comment: u64,
    pub blank: u64,
    pub complexity: u64,
    pub binary: bool,
    pub minified: bool,
    pub generated: bool,
    /// Distinct lines, when unique line counting is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uloc: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_lengths: Option<LineLengths>,
    /// Scan stops here instead of at the end of the content
    #[serde(skip)]
    pub end_point: Option<usize>,
    /// xxh3-128 of the content, when duplicate detection is on
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<u128>,
    #[serde(skip)]
    pub callback: Option<Box<dyn LineCallback + Send>>,
}

impl FileJob {
    /// Job for in-memory content of a known language.
    pub fn new(language: impl Into<String>, content: Vec<u8>) -> Self {
        let language = language.into();
        Self {
            possible_languages: vec![language.clone()],
            language,
            bytes: content.len() as u64,
            content,
            ..Self::default()
        }
    }

    /// Attach a per-line callback.
    pub fn with_callback(mut self, callback: impl LineCallback + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for FileJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileJob")
            .field("language", &self.language)
            .field("location", &self.location)
            .field("bytes", &self.bytes)
            .field("lines", &self.lines)
            .field("code", &self.code)
            .field("comment", &self.comment)
            .field("blank", &self.blank)
            .field("complexity", &self.complexity)
            .field("binary", &self.binary)
            .field("minified", &self.minified)
            .field("generated", &self.generated)
            .field("uloc", &self.uloc)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::LineType;

    #[test]
    fn new_sets_bytes_and_candidates() {
        let job = FileJob::new("Rust", b"fn main() {}\n".to_vec());
        assert_eq!(job.bytes, 13);
        assert_eq!(job.language, "Rust");
        assert_eq!(job.possible_languages, vec!["Rust".to_string()]);
        assert_eq!(job.lines, 0);
    }

    #[test]
    fn serializes_without_content() {
        let job = FileJob::new("Rust", b"secret".to_vec())
            .with_callback(|_: &FileJob, _: u64, _: LineType| true);
        let json = serde_json::to_string(&job).unwrap();
        assert!(json.contains("\"language\":\"Rust\""));
        assert!(!json.contains("secret"));
        assert!(!json.contains("hash"));
        assert!(!json.contains("uloc"));
    }

    #[test]
    fn debug_skips_callback() {
        let job = FileJob::new("C", Vec::new());
        let debug = format!("{job:?}");
        assert!(debug.contains("FileJob"));
        assert!(debug.contains("\"C\""));
    }
}
