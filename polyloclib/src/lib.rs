//! # polyloclib
//!
//! A fast, multi-language lines of code counter library that separates code,
//! comments and blank lines and estimates cyclomatic complexity.
//!
//! ## Overview
//!
//! Files are classified without any real grammar. Each language is described
//! by a table of markers (line comments, block comments, string delimiters
//! and complexity keywords) and a small state machine sorts every physical
//! line into one of:
//!
//! - **Code**: any line containing something other than comments and whitespace
//! - **Comment**: lines containing only comments, including doc strings used as statements
//! - **Blank**: whitespace-only lines
//!
//! Complexity is the number of branch keywords (`if `, `for `, `&& `, ...)
//! found at a word boundary outside comments and strings.
//!
//! ## Features
//!
//! - **300+ languages**: embedded language table, detection by extension, filename or `#!` line
//! - **Nested comments**, escaped quotes, doc strings and byte order marks
//! - **Concurrent pipeline**: bounded reader and classifier pools joined by channels
//! - **Multiple scans at once** with [`MultiProcessor`]
//! - **Duplicate, minified, generated and large file detection**
//! - **Unique lines of code** and line length statistics
//! - **Remapping** by content marker and extension
//!
//! ## Example
//!
//! ```rust
//! use polyloclib::{count_directory, count_file, ScanConfig};
//! use std::fs;
//! use tempfile::tempdir;
//!
//! let dir = tempdir().unwrap();
//! let file_path = dir.path().join("main.c");
//! fs::write(&file_path, "int main() {\n    // say hi\n    return 0;\n}\n").unwrap();
//!
//! // Count a single file
//! let job = count_file(&file_path, &ScanConfig::new()).unwrap();
//! assert_eq!(job.language, "C");
//! assert_eq!(job.code, 3);
//! assert_eq!(job.comment, 1);
//!
//! // Count an entire directory
//! let result = count_directory(dir.path(), ScanConfig::new()).unwrap();
//! assert_eq!(result.language("C").unwrap().stats.lines, 4);
//!
//! // Count with filtering
//! let config = ScanConfig::new().exclude("**/generated/**").unwrap();
//! let result = count_directory(dir.path(), config).unwrap();
//! assert_eq!(result.total.count, 1);
//! ```

pub mod counter;
pub mod duplicates;
pub mod error;
pub mod job;
pub mod language;
pub mod lexer;
pub mod limits;
pub mod options;
pub mod orchestrator;
pub mod pipeline;
pub mod source;
pub mod stats;
pub mod uloc;

pub use counter::{count_content, count_directory, count_file, count_file_with};
pub use duplicates::DuplicateTable;
pub use error::PolylocError;
pub use job::FileJob;
pub use language::{LanguageDatabase, LanguageFeature};
pub use lexer::{count_stats, LineCallback, LineType};
pub use options::ScanConfig;
pub use orchestrator::MultiProcessor;
pub use pipeline::Pipeline;
pub use source::{discover_files, WalkedFile};
pub use stats::{LanguageSummary, LineLengths, LocStats, ScanResult};
pub use uloc::UniqueLines;

/// Result type for polyloclib operations
pub type Result<T> = std::result::Result<T, PolylocError>;
