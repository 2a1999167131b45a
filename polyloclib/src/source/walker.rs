//! Directory traversal producing the files to count.
//!
//! Denied directory names and exclude globs prune whole subtrees. Symbolic
//! links and anything that is not a regular file are skipped.

use std::path::{Path, PathBuf};

use crossbeam_channel::Sender;
use log::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::PolylocError;
use crate::options::ScanConfig;
use crate::Result;

/// A file accepted by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    pub location: PathBuf,
    pub filename: String,
}

impl WalkedFile {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let filename = location
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { location, filename }
    }
}

fn is_denied(entry: &DirEntry, config: &ScanConfig) -> bool {
    // Always include the root
    if entry.depth() == 0 {
        return false;
    }
    if entry.file_type().is_dir() {
        let name = entry.file_name().to_string_lossy();
        if config.path_deny_list.iter().any(|denied| *denied == name) {
            debug!("skipping denied directory: {}", entry.path().display());
            return true;
        }
    }
    config.is_excluded(entry.path())
}

/// Walk `root`, calling `on_file` for every accepted file until it returns
/// `false`. Returns whether the walk ran to completion.
pub fn walk_path(
    root: impl AsRef<Path>,
    config: &ScanConfig,
    mut on_file: impl FnMut(WalkedFile) -> bool,
) -> Result<bool> {
    let root = root.as_ref();

    if !root.exists() {
        return Err(PolylocError::PathNotFound(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .max_open(config.walker_workers.max(1))
        .into_iter()
        .filter_entry(|e| !is_denied(e, config));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("error walking {}: {e}", root.display());
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            continue;
        }
        if file_type.is_symlink() {
            warn!("skipping symlink file: {}", entry.path().display());
            continue;
        }
        if !file_type.is_file() {
            warn!("skipping non-regular file: {}", entry.path().display());
            continue;
        }

        let file = WalkedFile {
            filename: entry.file_name().to_string_lossy().into_owned(),
            location: entry.into_path(),
        };
        if !on_file(file) {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Walk every path, feeding accepted files into `sender`.
///
/// Stops early when the receiving side has gone away.
pub fn walk_into(paths: &[PathBuf], config: &ScanConfig, sender: &Sender<WalkedFile>) -> Result<()> {
    for path in paths {
        let completed = walk_path(path, config, |file| sender.send(file).is_ok())?;
        if !completed {
            debug!("file receiver closed, stopping walk");
            break;
        }
    }
    Ok(())
}

/// Collect the files under `root` in sorted order.
pub fn discover_files(root: impl AsRef<Path>, config: &ScanConfig) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_path(root, config, |file| {
        files.push(file.location);
        true
    })?;
    files.sort();
    Ok(files)
}
