//! Advisory locking around schedule updates
//!
//! Uses `fs2` exclusive locks on a sidecar `<status>.lock` file. The status
//! document itself is replaced by rename on every save, so the lock cannot
//! live on it. Locks are cooperative: only writers going through
//! [`StateLock`] are serialised.

use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{MortyError, Result};

/// Held exclusive lock. Released when dropped.
#[derive(Debug)]
pub struct StateLock {
    file: File,
    path: PathBuf,
}

impl StateLock {
    /// Block until the exclusive lock for `status_file` is acquired.
    pub fn acquire(status_file: &Path) -> Result<Self> {
        let path = lock_path(status_file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MortyError::persistence(parent, e))?;
        }
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| MortyError::persistence(&path, e))?;
        file.lock_exclusive()
            .map_err(|e| MortyError::persistence(&path, e))?;
        tracing::debug!(path = %path.display(), "acquired state lock");
        Ok(Self { file, path })
    }

    /// Like [`StateLock::acquire`], but returns `None` instead of waiting.
    pub fn try_acquire(status_file: &Path) -> Result<Option<Self>> {
        let path = lock_path(status_file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MortyError::persistence(parent, e))?;
        }
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&path)
            .map_err(|e| MortyError::persistence(&path, e))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file, path })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(MortyError::persistence(&path, e)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release state lock");
        }
    }
}

/// `status.json` -> `status.json.lock`
pub fn lock_path(status_file: &Path) -> PathBuf {
    let mut name = status_file
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("status"));
    name.push(".lock");
    status_file.with_file_name(name)
}
