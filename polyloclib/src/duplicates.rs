//! Content hashes of files seen so far in a scan.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use xxhash_rust::xxh3::xxh3_128;

/// Hash of a file's whole content.
pub fn content_hash(content: &[u8]) -> u128 {
    xxh3_128(content)
}

/// Table of content hashes, bucketed by file size.
///
/// Shared by all classifier workers of a scan.
#[derive(Debug, Default)]
pub struct DuplicateTable {
    seen: Mutex<HashMap<u64, Vec<u128>>>,
}

impl DuplicateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file and report whether an identical one was recorded before.
    ///
    /// The lookup and the insert happen under one lock, so of two identical
    /// files exactly one is reported as the duplicate.
    pub fn check_and_add(&self, bytes: u64, hash: u128) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        let hashes = seen.entry(bytes).or_default();
        if hashes.contains(&hash) {
            return true;
        }
        hashes.push(hash);
        false
    }

    /// Number of distinct files recorded.
    pub fn len(&self) -> usize {
        let seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        seen.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
