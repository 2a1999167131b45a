//! Error types for polyloclib

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading the language table or scanning files
#[derive(Error, Debug)]
pub enum PolylocError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The embedded or user supplied language table could not be parsed
    #[error("failed to parse language table: {0}")]
    LanguageTable(#[from] serde_json::Error),

    /// A language entry contains a token that can never match
    #[error("malformed language '{language}': {message}")]
    MalformedLanguage { language: String, message: String },

    /// No feature table exists for the requested language
    #[error("unknown language: {0}")]
    UnknownLanguage(String),

    /// Invalid glob pattern
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// Path does not exist
    #[error("path does not exist: {0}")]
    PathNotFound(PathBuf),

    /// The orchestrator's workers have shut down
    #[error("scan workers have stopped")]
    WorkersStopped,
}
