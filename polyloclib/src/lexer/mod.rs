//! Line classification.
//!
//! [`count_stats`] walks a file's content once and sorts every physical line
//! into blank, code or comment while counting complexity keywords. The
//! actual byte handling lives in [`state`]; this module drives it line by
//! line and commits each finished line to the job's counters.

pub mod state;

use std::mem;

use log::{trace, warn};
use serde::{Deserialize, Serialize};

use crate::job::FileJob;
use crate::language::feature::LanguageFeature;
use crate::options::ScanConfig;
use crate::stats::LineLengths;
use crate::uloc::unique_line_count;

pub use state::State;

/// Only the first 10 000 bytes are inspected for NUL bytes.
const BINARY_CHECK_LIMIT: usize = 10_000;

/// Leading bytes searched for generated-file markers.
const GENERATED_HEAD_BYTES: usize = 1000;

/// Byte order marks, UTF-8 first.
pub const BYTE_ORDER_MARKS: &[&[u8]] = &[
    &[0xEF, 0xBB, 0xBF],
    &[0xFE, 0xFF],
    &[0xFF, 0xFE],
    &[0x00, 0x00, 0xFE, 0xFF],
    &[0xFF, 0xFE, 0x00, 0x00],
    &[0x2B, 0x2F, 0x76, 0x38],
    &[0x2B, 0x2F, 0x76, 0x39],
    &[0x2B, 0x2F, 0x76, 0x2B],
    &[0x2B, 0x2F, 0x76, 0x2F],
    &[0x2B, 0x2F, 0x76, 0x38, 0x2D],
    &[0xF7, 0x64, 0x4C],
    &[0xDD, 0x73, 0x66, 0x73],
    &[0x0E, 0xFE, 0xFF],
    &[0xFB, 0xEE, 0x28],
    &[0x84, 0x31, 0x95, 0x33],
];

/// Classification of one physical line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    Blank,
    Code,
    Comment,
}

impl LineType {
    /// A comment marker makes a blank line a comment line, code stays code.
    #[inline]
    pub fn with_comment(self) -> Self {
        match self {
            LineType::Blank => LineType::Comment,
            other => other,
        }
    }
}

/// Receives every committed line of a file.
///
/// Returning `false` stops counting the file.
pub trait LineCallback {
    fn process_line(&mut self, job: &FileJob, line: u64, line_type: LineType) -> bool;
}

impl<F> LineCallback for F
where
    F: FnMut(&FileJob, u64, LineType) -> bool,
{
    fn process_line(&mut self, job: &FileJob, line: u64, line_type: LineType) -> bool {
        self(job, line, line_type)
    }
}

/// Read-only context shared by the states while scanning one file.
#[derive(Debug, Clone, Copy)]
pub struct Scan<'a> {
    pub content: &'a [u8],
    pub feature: &'a LanguageFeature,
    pub check_binary: bool,
}

impl Scan<'_> {
    /// Index of the last byte.
    #[inline]
    pub fn last(&self) -> usize {
        self.content.len().saturating_sub(1)
    }
}

#[inline]
pub fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

#[inline]
pub(crate) fn is_binary(scan: &Scan<'_>, index: usize, byte: u8) -> bool {
    scan.check_binary && byte == 0 && index < BINARY_CHECK_LIMIT
}

/// Does `token` occur at `index`?
#[inline]
pub fn check_for_match_single(content: &[u8], index: usize, token: &[u8]) -> bool {
    content[index..].starts_with(token)
}

/// True when the byte at `index` is preceded by an even number of
/// backslashes, i.e. it is not escaped.
pub fn judge_escape(content: &[u8], index: usize) -> bool {
    content[..index]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count()
        % 2
        == 0
}

/// Length of the longest byte order mark `content` starts with.
pub fn bom_length(content: &[u8]) -> usize {
    BYTE_ORDER_MARKS
        .iter()
        .filter(|bom| content.starts_with(bom))
        .map(|bom| bom.len())
        .max()
        .unwrap_or(0)
}

fn skip_bom(job: &FileJob, content: &[u8]) -> usize {
    let skip = bom_length(content);
    if skip > 0 && !content.starts_with(BYTE_ORDER_MARKS[0]) {
        warn!(
            "BOM found for file {} indicating it is not ASCII/UTF-8 and may be counted incorrectly",
            job.location.display()
        );
    }
    skip
}

/// Count lines, code, comments, blanks and complexity of `job.content`.
///
/// Counters are accumulated into the job. Counting stops early when binary
/// content is found, when the line callback asks to stop or when the large
/// file line limit is reached. Minified and generated files are flagged once
/// counting finishes.
pub fn count_stats(job: &mut FileJob, feature: &LanguageFeature, config: &ScanConfig) {
    let content = mem::take(&mut job.content);
    let mut callback = job.callback.take();

    let end = job.end_point.unwrap_or(content.len()).min(content.len());
    let scan = Scan {
        content: &content[..end],
        feature,
        check_binary: config.check_binary,
    };

    if feature.plain_text {
        count_text(scan, job, config, &mut callback);
    } else {
        count_code(scan, job, config, &mut callback);
    }

    if !job.binary {
        if config.uloc {
            job.uloc = Some(unique_line_count(&content));
        }
        if config.max_mean {
            job.line_lengths = Some(LineLengths::from_content(&content));
        }
        detect_minified_generated(job, &content, config);
    }

    job.content = content;
    job.callback = callback;
}

type Callback = Option<Box<dyn LineCallback + Send>>;

/// Commit one finished line. Returns `false` when counting should stop.
fn commit_line(
    job: &mut FileJob,
    line_type: LineType,
    config: &ScanConfig,
    callback: &mut Callback,
) -> bool {
    job.lines += 1;
    match line_type {
        LineType::Blank => job.blank += 1,
        LineType::Code => job.code += 1,
        LineType::Comment => job.comment += 1,
    }
    trace!("{} line {} {:?}", job.location.display(), job.lines, line_type);

    if let Some(callback) = callback {
        if !callback.process_line(job, job.lines, line_type) {
            return false;
        }
    }

    !(config.no_large && job.lines >= config.large_line_count)
}

fn count_code(scan: Scan<'_>, job: &mut FileJob, config: &ScanConfig, callback: &mut Callback) {
    let content = scan.content;
    let len = content.len();
    let mut index = skip_bom(job, content);
    let mut line_type = LineType::Blank;
    let mut state = State::Blank;

    while index < len {
        if !is_whitespace(content[index]) {
            (index, line_type, state) = state.process(&scan, job, index, line_type);
        }

        if job.binary {
            return;
        }

        if content[index] == b'\n' || index >= len - 1 {
            if !commit_line(job, line_type, config, callback) {
                return;
            }
            (line_type, state) = state.reset();
        }

        index += 1;
    }
}

/// Newline scan for languages without any tokens.
fn count_text(scan: Scan<'_>, job: &mut FileJob, config: &ScanConfig, callback: &mut Callback) {
    let content = scan.content;
    let len = content.len();
    let mut line_type = LineType::Blank;

    for index in skip_bom(job, content)..len {
        let byte = content[index];

        if is_binary(&scan, index, byte) {
            job.binary = true;
            return;
        }
        if !is_whitespace(byte) {
            line_type = LineType::Code;
        }

        if byte == b'\n' || index == len - 1 {
            if !commit_line(job, line_type, config, callback) {
                return;
            }
            line_type = LineType::Blank;
        }
    }
}

fn detect_minified_generated(job: &mut FileJob, content: &[u8], config: &ScanConfig) {
    if config.generated {
        let head = content[..content.len().min(GENERATED_HEAD_BYTES)].to_ascii_lowercase();
        let marked = config.generated_markers.iter().any(|marker| {
            let marker = marker.to_ascii_lowercase();
            !marker.is_empty()
                && head
                    .windows(marker.len())
                    .any(|window| window == marker.as_bytes())
        });
        if marked {
            job.generated = true;
            job.language.push_str(" (gen)");
            warn!("{} identified as generated with heading comment", job.location.display());
            return;
        }
    }

    if config.minified && job.lines != 0 {
        let average = content.len() as u64 / job.lines;
        if average >= config.minified_line_bytes {
            job.minified = true;
            job.language.push_str(" (min)");
            warn!(
                "{} identified as minified with average line byte length of {average}",
                job.location.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::feature::LanguageDatabase;

    fn count(language: &str, content: &str) -> FileJob {
        count_bytes(language, content.as_bytes())
    }

    fn count_bytes(language: &str, content: &[u8]) -> FileJob {
        let db = LanguageDatabase::embedded(true).unwrap();
        let mut job = FileJob::new(language, content.to_vec());
        count_stats(&mut job, db.get(language).unwrap(), &ScanConfig::new());
        job
    }

    fn lcbc(job: &FileJob) -> (u64, u64, u64, u64) {
        (job.lines, job.code, job.comment, job.blank)
    }

    #[test]
    fn empty_file_has_no_lines() {
        assert_eq!(lcbc(&count("Java", "")), (0, 0, 0, 0));
    }

    #[test]
    fn missing_trailing_newline_still_counts() {
        assert_eq!(lcbc(&count("Java", "int x;")), (1, 1, 0, 0));
        assert_eq!(lcbc(&count("Java", "int x;\n")), (1, 1, 0, 0));
    }

    #[test]
    fn blank_lines() {
        assert_eq!(lcbc(&count("Java", "\n\n   \n")), (3, 0, 0, 3));
    }

    #[test]
    fn comment_after_code_is_code() {
        assert_eq!(lcbc(&count("Java", "int x; // note\n// only\n")), (2, 1, 1, 0));
    }

    #[test]
    fn block_comment_spanning_lines() {
        let job = count("C", "/*\n  text\n*/\nint x;\n");
        assert_eq!(lcbc(&job), (4, 1, 3, 0));
    }

    #[test]
    fn code_after_block_comment_close() {
        assert_eq!(lcbc(&count("C", "/* a */ int x;\n")), (1, 1, 0, 0));
    }

    #[test]
    fn nested_comments_keep_outer_open() {
        let job = count("Rust", "/* outer /* inner */ still comment\nfn x() {}\n*/\nfn y() {}\n");
        assert_eq!(lcbc(&job), (4, 1, 3, 0));
    }

    #[test]
    fn non_nested_language_closes_at_first_end() {
        let job = count("C", "/* outer /* inner */ int x;\nint y;\n");
        assert_eq!(lcbc(&job), (2, 2, 0, 0));
    }

    #[test]
    fn escaped_quote_keeps_string_open() {
        let job = count("C", "char *s = \"a \\\" /* not */\";\n/* real */\n");
        assert_eq!(lcbc(&job), (2, 1, 1, 0));
    }

    #[test]
    fn escaped_backslash_closes_string() {
        let job = count("C", "char *s = \"a \\\\\";\n/* real */\n");
        assert_eq!(lcbc(&job), (2, 1, 1, 0));
    }

    #[test]
    fn multi_line_string_lines_are_code() {
        let job = count("Go", "x := `\n// inside\n`\n");
        assert_eq!(lcbc(&job), (3, 3, 0, 0));
    }

    #[test]
    fn docstring_statement_is_comment() {
        let job = count("Python", "def f():\n    \"\"\"Doc\n    more\n    \"\"\"\n    return 1\n");
        assert_eq!(lcbc(&job), (5, 2, 3, 0));
    }

    #[test]
    fn docstring_assignment_is_code() {
        let job = count("Python", "x = \"\"\"value\ntext\n\"\"\"\n");
        assert_eq!(lcbc(&job), (3, 3, 0, 0));
    }

    #[test]
    fn docstring_followed_by_code_is_code() {
        let job = count("Python", "\"\"\"a\"\"\" + b\n");
        assert_eq!(lcbc(&job), (1, 1, 0, 0));
    }

    #[test]
    fn complexity_needs_word_boundary() {
        let job = count("Java", "if (a) {\n  elif (b);\n  x = a || b;\n}\n");
        assert_eq!(job.complexity, 2);
    }

    #[test]
    fn complexity_disabled() {
        let db = LanguageDatabase::embedded(false).unwrap();
        let mut job = FileJob::new("Java", b"if (a) {}\n".to_vec());
        count_stats(&mut job, db.get("Java").unwrap(), &ScanConfig::new());
        assert_eq!(job.complexity, 0);
        assert_eq!(job.code, 1);
    }

    #[test]
    fn binary_content_stops_counting() {
        let job = count_bytes("Java", b"int x;\nint \0y;\n");
        assert!(job.binary);

        let job = count_bytes("Java", b"\0\n");
        assert!(job.binary);
    }

    #[test]
    fn binary_check_can_be_disabled() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let mut job = FileJob::new("Java", b"int \0y;\n".to_vec());
        let config = ScanConfig::new().check_binary(false);
        count_stats(&mut job, db.get("Java").unwrap(), &config);
        assert!(!job.binary);
        assert_eq!(job.code, 1);
    }

    #[test]
    fn bom_is_skipped() {
        let plain = count("Java", "int x;\n\n// c\n");
        for bom in BYTE_ORDER_MARKS {
            let mut content = bom.to_vec();
            content.extend_from_slice(b"int x;\n\n// c\n");
            assert_eq!(lcbc(&count_bytes("Java", &content)), lcbc(&plain), "{bom:?}");
        }
    }

    #[test]
    fn longest_bom_wins() {
        assert_eq!(bom_length(&[0x2B, 0x2F, 0x76, 0x38, 0x2D, b'x']), 5);
        assert_eq!(bom_length(&[0xFF, 0xFE, 0x00, 0x00]), 4);
        assert_eq!(bom_length(b"plain"), 0);
    }

    #[test]
    fn test_judge_escape() {
        assert!(judge_escape(b"a\"", 1));
        assert!(!judge_escape(b"\\\"", 1));
        assert!(judge_escape(b"\\\\\"", 2));
        assert!(!judge_escape(b"\\\\\\\"", 3));
    }

    #[test]
    fn plain_text_fast_path() {
        let job = count("Plain Text", "hello\n\n  \nworld");
        assert_eq!(lcbc(&job), (4, 2, 0, 2));
    }

    #[test]
    fn callback_sees_every_line_and_can_stop() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let feature = db.get("Java").unwrap();

        let seen = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut job = FileJob::new("Java", b"int a;\n// b\n\nint c;\n".to_vec());
        job.callback = Some(Box::new(move |_: &FileJob, line: u64, t: LineType| {
            sink.lock().unwrap().push((line, t));
            line < 2
        }));
        count_stats(&mut job, feature, &ScanConfig::new());

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, LineType::Code), (2, LineType::Comment)]
        );
        assert_eq!(job.lines, 2);
        assert!(job.callback.is_some());
        assert!(!job.content.is_empty());
    }

    #[test]
    fn large_line_limit_stops_counting() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let mut job = FileJob::new("Java", b"a;\nb;\nc;\nd;\n".to_vec());
        let config = ScanConfig::new().no_large(true).large_line_count(2);
        count_stats(&mut job, db.get("Java").unwrap(), &config);
        assert_eq!(job.lines, 2);
    }

    #[test]
    fn end_point_limits_scan() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let mut job = FileJob::new("Java", b"a;\nb;\nc;\n".to_vec());
        job.end_point = Some(3);
        count_stats(&mut job, db.get("Java").unwrap(), &ScanConfig::new());
        assert_eq!(job.lines, 1);

        let mut job = FileJob::new("Java", b"a;\n".to_vec());
        job.end_point = Some(100);
        count_stats(&mut job, db.get("Java").unwrap(), &ScanConfig::new());
        assert_eq!(job.lines, 1);
    }

    #[test]
    fn uloc_and_line_lengths_when_enabled() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let content = b"}\nint x;\n}\n".to_vec();

        let mut job = FileJob::new("C", content.clone());
        count_stats(&mut job, db.get("C").unwrap(), &ScanConfig::new());
        assert_eq!(job.uloc, None);
        assert_eq!(job.line_lengths, None);

        let mut job = FileJob::new("C", content);
        let config = ScanConfig::new().uloc(true).max_mean(true);
        count_stats(&mut job, db.get("C").unwrap(), &config);
        assert_eq!(job.uloc, Some(3));
        let lengths = job.line_lengths.unwrap();
        assert_eq!(lengths.max, 6);
        assert_eq!(lengths.lines, 4);
        assert_eq!(lengths.mean(), 2);
    }

    #[test]
    fn generated_marker() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let mut job = FileJob::new("Go", b"// Code generated. DO NOT EDIT.\npackage x\n".to_vec());
        count_stats(&mut job, db.get("Go").unwrap(), &ScanConfig::new().generated(true));
        assert!(job.generated);
        assert_eq!(job.language, "Go (gen)");
    }

    #[test]
    fn minified_average() {
        let db = LanguageDatabase::embedded(true).unwrap();
        let line = format!("var a={};\n", "1+".repeat(200));
        let mut job = FileJob::new("JavaScript", line.into_bytes());
        count_stats(
            &mut job,
            db.get("JavaScript").unwrap(),
            &ScanConfig::new().minified(true),
        );
        assert!(job.minified);
        assert_eq!(job.language, "JavaScript (min)");

        let mut job = FileJob::new("JavaScript", b"var a = 1;\n".to_vec());
        count_stats(
            &mut job,
            db.get("JavaScript").unwrap(),
            &ScanConfig::new().minified(true),
        );
        assert!(!job.minified);
    }
}
