//! Source discovery: find files to count.
//!
//! This module handles the first stage of the pipeline. It walks directory
//! trees, prunes denied directories and excluded globs, and emits the
//! remaining regular files as [`WalkedFile`]s.
//!
//! ## Example
//!
//! ```rust,ignore
//! use polyloclib::source::discover_files;
//! use polyloclib::ScanConfig;
//!
//! let config = ScanConfig::new().exclude("**/generated/**")?;
//! let files = discover_files(".", &config)?;
//! ```

pub mod walker;

pub use walker::{discover_files, walk_into, walk_path, WalkedFile};
