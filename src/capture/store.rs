/// Ownership of captured photo files
///
/// The camera program writes into files allocated here. Captures live in
/// an app-owned subdirectory of the configured location, so files that
/// merely look like captures are never touched. The store keeps a bounded
/// number of them and deletes the rest, so captures never pile up.

use chrono::Utc;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::CaptureError;

/// Subdirectory of the configured location that the store owns
pub const CAPTURE_SUBDIR: &str = "text-capture-captures";

const PREFIX: &str = "JPEG_";
const SUFFIX: &str = ".jpg";

#[derive(Debug)]
pub struct CaptureStore {
    dir: PathBuf,
    max_files: usize,
    /// Per-run sequence, keeps names unique within a second
    sequence: AtomicU32,
    /// Captures allocated in this run, oldest first
    allocated: Mutex<VecDeque<PathBuf>>,
}

impl CaptureStore {
    /// Create a store under `root`. The owned directory is created on
    /// first allocation. At least two captures are kept: the one on screen
    /// and the one being written.
    pub fn new(root: PathBuf, max_files: usize) -> Self {
        Self {
            dir: root.join(CAPTURE_SUBDIR),
            max_files: max_files.max(2),
            sequence: AtomicU32::new(0),
            allocated: Mutex::new(VecDeque::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create a new, empty capture file with a timestamped name
    pub fn allocate(&self) -> Result<PathBuf, CaptureError> {
        fs::create_dir_all(&self.dir).map_err(|source| CaptureError::Directory {
            path: self.dir.clone(),
            source,
        })?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");

        let path = loop {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            let candidate = self
                .dir
                .join(format!("{}{}_{:04}{}", PREFIX, stamp, sequence, SUFFIX));

            match OpenOptions::new().write(true).create_new(true).open(&candidate) {
                Ok(_) => break candidate,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(CaptureError::Allocate(e)),
            }
        };

        let mut allocated = self.allocated();
        allocated.push_back(path.clone());
        self.prune(&mut allocated);

        Ok(path)
    }

    /// Remove a capture that never got populated
    pub fn discard(&self, path: &Path) {
        if !self.owns(path) {
            return;
        }
        self.allocated().retain(|p| p != path);
        remove(path, "could not remove capture");
    }

    /// Delete every capture, including leftovers from earlier runs.
    /// Returns how many files were removed.
    pub fn purge(&self) -> usize {
        self.allocated().clear();

        let removed = self
            .captures()
            .iter()
            .filter(|path| remove(path, "could not remove capture"))
            .count();

        if removed > 0 {
            tracing::info!(removed, dir = %self.dir.display(), "🧹 purged captures");
        }
        removed
    }

    /// Keep only the newest `max_files` captures, in allocation order
    fn prune(&self, allocated: &mut VecDeque<PathBuf>) {
        while allocated.len() > self.max_files {
            let Some(path) = allocated.pop_front() else {
                break;
            };
            if remove(&path, "could not prune capture") {
                tracing::debug!(path = %path.display(), "pruned old capture");
            }
        }
    }

    fn allocated(&self) -> MutexGuard<'_, VecDeque<PathBuf>> {
        // The list stays consistent even if a holder panicked
        self.allocated.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn owns(&self, path: &Path) -> bool {
        path.parent() == Some(self.dir.as_path()) && is_capture_name(path)
    }

    /// Capture files currently in the owned directory
    fn captures(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!(dir = %self.dir.display(), error = %e, "could not list captures");
                return Vec::new();
            }
        };

        entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|path| path.is_file() && is_capture_name(path))
            .collect()
    }
}

/// Remove `path`; true if a file was deleted
fn remove(path: &Path, context: &str) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) if e.kind() == ErrorKind::NotFound => false,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "{}", context);
            false
        }
    }
}

fn is_capture_name(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|n| n.starts_with(PREFIX) && n.ends_with(SUFFIX))
}
