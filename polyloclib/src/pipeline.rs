//! Concurrent file pipeline.
//!
//! ```text
//! walker ──► readers (N) ──► classifiers (M) ──► aggregator
//!   WalkedFile        FileJob            FileJob       ScanResult
//! ```
//!
//! Stages are fixed thread pools joined by bounded channels. Each stage
//! closes its output by dropping the last sender once all of its workers
//! have finished, so the shutdown cascades from the walker down to the
//! aggregator, which runs on the calling thread.
//!
//! A file that cannot be read, is binary, or is otherwise rejected is
//! dropped with a log message; it never fails the scan.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, warn};

use crate::duplicates::{content_hash, DuplicateTable};
use crate::error::PolylocError;
use crate::job::FileJob;
use crate::language::detect::{detect_language, resolve_language};
use crate::language::feature::LanguageDatabase;
use crate::lexer::count_stats;
use crate::limits::fit_config;
use crate::options::ScanConfig;
use crate::source::walker::{walk_into, WalkedFile};
use crate::stats::ScanResult;
use crate::uloc::UniqueLines;
use crate::Result;

/// A configured scanner. Cheap to clone; every clone shares the same
/// language database.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: Arc<ScanConfig>,
    database: Arc<LanguageDatabase>,
}

impl Pipeline {
    /// Build a pipeline over the embedded language table, fitting the worker
    /// counts to the open file limit first.
    pub fn new(config: ScanConfig) -> Result<Self> {
        let config = fit_config(config, 1);
        let database = LanguageDatabase::configured(&config)?;
        Ok(Self::with_database(config, Arc::new(database)))
    }

    /// Build a pipeline over an existing database. The config is used as is.
    pub fn with_database(config: ScanConfig, database: Arc<LanguageDatabase>) -> Self {
        Self {
            config: Arc::new(config),
            database,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn database(&self) -> &LanguageDatabase {
        &self.database
    }

    /// Walk `paths` and count every file found.
    ///
    /// Fails only when a path does not exist.
    pub fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult> {
        if let Some(missing) = paths.iter().find(|p| !p.exists()) {
            return Err(PolylocError::PathNotFound(missing.clone()));
        }

        let (sender, receiver) = bounded(self.config.file_list_queue_size);

        thread::scope(|s| {
            s.spawn(move || {
                if let Err(e) = walk_into(paths, &self.config, &sender) {
                    warn!("walk failed: {e}");
                }
            });
            Ok(self.run(receiver))
        })
    }

    /// Count every file arriving on `files` until the channel closes.
    pub fn run(&self, files: Receiver<WalkedFile>) -> ScanResult {
        let config = &*self.config;
        let database = &*self.database;
        let duplicates = DuplicateTable::new();
        let unique_lines = UniqueLines::new();

        debug!(
            "starting pipeline with {} readers and {} classifiers",
            config.reader_workers, config.classifier_workers
        );

        let (loaded_tx, loaded_rx) = bounded::<FileJob>(config.file_list_queue_size);
        let (done_tx, done_rx) = bounded::<FileJob>(config.summary_queue_size);

        let mut result = thread::scope(|s| {
            for _ in 0..config.reader_workers.max(1) {
                let files = files.clone();
                let loaded_tx = loaded_tx.clone();
                s.spawn(move || read_worker(files, loaded_tx, config, database));
            }
            drop(loaded_tx);

            for _ in 0..config.classifier_workers.max(1) {
                let loaded_rx = loaded_rx.clone();
                let done_tx = done_tx.clone();
                let shared = Shared {
                    duplicates: &duplicates,
                    unique_lines: &unique_lines,
                };
                s.spawn(move || classify_worker(loaded_rx, done_tx, config, database, shared));
            }
            drop(done_tx);

            let mut result = ScanResult::new();
            for job in done_rx {
                result.add_job(job, config.per_file);
            }
            result
        });

        if config.uloc {
            unique_lines.fold_into(&mut result);
        }

        debug!("pipeline finished, {} files counted", result.file_count());
        result
    }
}

fn read_worker(
    files: Receiver<WalkedFile>,
    loaded: Sender<FileJob>,
    config: &ScanConfig,
    database: &LanguageDatabase,
) {
    for file in files {
        if let Some(job) = load_file(file, config, database) {
            if loaded.send(job).is_err() {
                break;
            }
        }
    }
}

/// Tables every classifier of one scan writes to.
#[derive(Debug, Clone, Copy)]
pub struct Shared<'a> {
    pub duplicates: &'a DuplicateTable,
    pub unique_lines: &'a UniqueLines,
}

fn classify_worker(
    loaded: Receiver<FileJob>,
    done: Sender<FileJob>,
    config: &ScanConfig,
    database: &LanguageDatabase,
    shared: Shared<'_>,
) {
    for job in loaded {
        if let Some(job) = classify(job, config, database, shared) {
            if done.send(job).is_err() {
                break;
            }
        }
    }
}

/// Turn a walked file into a job with its content loaded.
///
/// Returns `None` for files that should not be counted.
pub fn load_file(
    file: WalkedFile,
    config: &ScanConfig,
    database: &LanguageDatabase,
) -> Option<FileJob> {
    let location = file.location;

    let metadata = match fs::symlink_metadata(&location) {
        Ok(m) => m,
        Err(e) => {
            warn!("unable to stat {}: {e}", location.display());
            return None;
        }
    };
    if metadata.file_type().is_symlink() {
        warn!("skipping symlink file: {}", location.display());
        return None;
    }
    if !metadata.is_file() {
        warn!("skipping non-regular file: {}", location.display());
        return None;
    }
    if config.no_large && metadata.len() >= config.large_byte_count {
        warn!("skipping large file due to byte size: {}", location.display());
        return None;
    }

    let detection = detect_language(database, &file.filename);
    if detection.languages.is_empty() {
        debug!("skipping file with unknown language: {}", location.display());
        return None;
    }
    if !config.extension_allowed(&detection.extension) {
        debug!("skipping file by extension list: {}", location.display());
        return None;
    }

    let content = match fs::read(&location) {
        Ok(c) => c,
        Err(e) => {
            warn!("{}", PolylocError::FileRead { path: location, source: e });
            return None;
        }
    };

    Some(FileJob {
        language: detection.languages[0].clone(),
        possible_languages: detection.languages,
        filename: file.filename,
        extension: detection.extension,
        location,
        bytes: content.len() as u64,
        content,
        ..FileJob::default()
    })
}

/// Resolve the language of a loaded job and count it.
///
/// Returns `None` when the job is to be left out of the results: unknown
/// script, duplicate, minified or generated (when ignored), too large, or
/// binary. Only jobs that are kept add to the unique line table.
pub fn classify(
    mut job: FileJob,
    config: &ScanConfig,
    database: &LanguageDatabase,
    shared: Shared<'_>,
) -> Option<FileJob> {
    let Some(language) = resolve_language(
        database,
        &job.filename,
        &job.language,
        &job.possible_languages,
        &job.content,
        config,
    ) else {
        warn!("unable to determine #! language for {}", job.location.display());
        return None;
    };

    let Some(feature) = database.feature(&language) else {
        warn!("unknown language {language} for {}", job.location.display());
        return None;
    };
    job.language = language;

    count_stats(&mut job, feature, config);

    if config.duplicates {
        let hash = content_hash(&job.content);
        job.hash = Some(hash);
        if shared.duplicates.check_and_add(job.bytes, hash) {
            warn!("skipping duplicate file: {}", job.location.display());
            return None;
        }
    }
    if config.ignore_minified && job.minified {
        warn!("skipping minified file: {}", job.location.display());
        return None;
    }
    if config.ignore_generated && job.generated {
        warn!("skipping generated file: {}", job.location.display());
        return None;
    }
    if config.no_large && job.lines >= config.large_line_count {
        warn!("skipping large file due to line length: {}", job.location.display());
        return None;
    }
    if job.binary {
        warn!("skipping file identified as binary: {}", job.location.display());
        return None;
    }

    if config.uloc {
        shared.unique_lines.add(&job.language, &job.content);
    }
    job.content = Vec::new();

    Some(job)
}
