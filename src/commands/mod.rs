//! Subcommand implementations for the `morty` binary.

pub mod compile;
pub mod init;
pub mod job;
pub mod reset;
pub mod status;

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Config;
use crate::fs::{StateStore, WorkDir};

/// Resolved configuration plus the handles every command needs.
pub(crate) struct Project {
    pub config: Config,
    pub work_dir: WorkDir,
    pub store: StateStore,
}

impl Project {
    pub fn open(root: &Path) -> Result<Self> {
        let config = Config::load(root)
            .with_context(|| format!("Failed to load configuration for {}", root.display()))?;
        Ok(Self {
            work_dir: WorkDir::new(&config),
            store: StateStore::new(&config),
            config,
        })
    }

    /// Fail with a hint when no schedule has been compiled yet.
    pub fn require_schedule(&self) -> Result<()> {
        if !self.store.exists() {
            anyhow::bail!(
                "no schedule at {}. Run 'morty compile' first.",
                self.store.path().display()
            );
        }
        Ok(())
    }
}
