//! High-level counting API.
//!
//! Convenience entry points for counting a buffer, a single file or a
//! directory tree without wiring up a [`Pipeline`] by hand.

use std::fs;
use std::path::Path;

use crate::error::PolylocError;
use crate::job::FileJob;
use crate::language::detect::{detect_language, resolve_language};
use crate::language::feature::LanguageDatabase;
use crate::lexer::count_stats;
use crate::options::ScanConfig;
use crate::pipeline::Pipeline;
use crate::stats::ScanResult;
use crate::Result;

/// Count in-memory content as `language`.
///
/// # Example
///
/// ```rust
/// use polyloclib::{count_content, LanguageDatabase, ScanConfig};
///
/// let db = LanguageDatabase::embedded(true).unwrap();
/// let job = count_content(&db, "C", "int x; /* y */\n\n// z\n", &ScanConfig::new()).unwrap();
/// assert_eq!((job.lines, job.code, job.blank, job.comment), (3, 1, 1, 1));
/// ```
pub fn count_content(
    database: &LanguageDatabase,
    language: &str,
    content: impl Into<Vec<u8>>,
    config: &ScanConfig,
) -> Result<FileJob> {
    let feature = database.get(language)?;
    let mut job = FileJob::new(language, content.into());
    count_stats(&mut job, feature, config);
    Ok(job)
}

/// Count a single file, detecting its language from its name and content.
///
/// Binary files are returned with [`FileJob::binary`] set and partial counts.
///
/// # Example
///
/// ```rust,ignore
/// use polyloclib::{count_file, ScanConfig};
///
/// let job = count_file("src/main.rs", &ScanConfig::new())?;
/// println!("{}: {} code, {} comment", job.language, job.code, job.comment);
/// ```
pub fn count_file(path: impl AsRef<Path>, config: &ScanConfig) -> Result<FileJob> {
    let database = LanguageDatabase::configured(config)?;
    count_file_with(&database, path, config)
}

/// Like [`count_file`] with a database built by the caller.
pub fn count_file_with(
    database: &LanguageDatabase,
    path: impl AsRef<Path>,
    config: &ScanConfig,
) -> Result<FileJob> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PolylocError::PathNotFound(path.to_path_buf()));
    }

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content = fs::read(path).map_err(|e| PolylocError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let detection = detect_language(database, &filename);
    let fallback = detection.languages.first().cloned().unwrap_or_default();
    let language = resolve_language(
        database,
        &filename,
        &fallback,
        &detection.languages,
        &content,
        config,
    )
    .filter(|language| !language.is_empty())
    .ok_or_else(|| PolylocError::UnknownLanguage(filename.clone()))?;

    let mut job = count_content(database, &language, content, config)?;
    job.possible_languages = detection.languages;
    job.filename = filename;
    job.extension = detection.extension;
    job.location = path.to_path_buf();
    Ok(job)
}

/// Count every file under a directory.
///
/// # Example
///
/// ```rust,ignore
/// use polyloclib::{count_directory, ScanConfig};
///
/// let config = ScanConfig::new().exclude("**/vendor/**")?;
/// let result = count_directory("src/", config)?;
/// for (name, summary) in &result.languages {
///     println!("{name}: {}", summary.stats);
/// }
/// ```
pub fn count_directory(path: impl AsRef<Path>, config: ScanConfig) -> Result<ScanResult> {
    Pipeline::new(config)?.scan(&[path.as_ref().to_path_buf()])
}
