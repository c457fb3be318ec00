//! Load and save the schedule document.
//!
//! Every save writes the complete document to a temp file next to the
//! target, syncs it and renames it into place, so a crash leaves either the
//! old or the new document on disk and never a partial one.

use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::locking::StateLock;
use crate::config::Config;
use crate::error::{MortyError, Result};
use crate::models::constants::SCHEDULE_VERSION;
use crate::models::schedule::Schedule;

/// Version reported for documents that predate the `version` field.
const LEGACY_VERSION: &str = "1.0";

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(config: &Config) -> Self {
        Self::at(&config.status_file)
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read the document, rejecting any format version other than the current one.
    pub fn load(&self) -> Result<Schedule> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| MortyError::persistence(&self.path, e))?;
        let value: Value = serde_json::from_str(&content)?;
        check_version(&value)?;
        let schedule: Schedule = serde_json::from_value(value)?;
        tracing::debug!(path = %self.path.display(), jobs = schedule.global.total_jobs, "loaded schedule");
        Ok(schedule)
    }

    /// Replace the document atomically.
    pub fn save(&self, schedule: &Schedule) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| MortyError::persistence(parent, e))?;

        let mut content = serde_json::to_string_pretty(schedule)?;
        content.push('\n');

        let mut staging =
            NamedTempFile::new_in(parent).map_err(|e| MortyError::persistence(parent, e))?;
        staging
            .write_all(content.as_bytes())
            .and_then(|()| staging.as_file().sync_all())
            .map_err(|e| MortyError::persistence(staging.path(), e))?;
        staging
            .persist(&self.path)
            .map_err(|e| MortyError::persistence(&self.path, e.error))?;

        tracing::debug!(path = %self.path.display(), "saved schedule");
        Ok(())
    }

    /// Load, apply one mutation, save. Runs under the exclusive state lock.
    ///
    /// Nothing is written when `f` fails.
    pub fn update<T>(&self, f: impl FnOnce(&mut Schedule) -> Result<T>) -> Result<T> {
        let _lock = StateLock::acquire(&self.path)?;
        let mut schedule = self.load()?;
        let value = f(&mut schedule)?;
        self.save(&schedule)?;
        Ok(value)
    }
}

fn check_version(value: &Value) -> Result<()> {
    match value.get("version").and_then(Value::as_str) {
        Some(SCHEDULE_VERSION) => Ok(()),
        Some(other) => Err(MortyError::UnsupportedVersion {
            found: other.to_string(),
        }),
        None if value.get("modules").is_some_and(Value::is_object) => {
            Err(MortyError::UnsupportedVersion {
                found: LEGACY_VERSION.to_string(),
            })
        }
        None => Err(MortyError::UnsupportedVersion {
            found: "unknown".to_string(),
        }),
    }
}
