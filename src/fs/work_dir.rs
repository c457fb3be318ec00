use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::models::constants::paths;

/// The `.morty` directory and the locations inside it.
#[derive(Debug, Clone)]
pub struct WorkDir {
    root: PathBuf,
    plan_dir: PathBuf,
    status_file: PathBuf,
}

impl WorkDir {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.work_dir.clone(),
            plan_dir: config.plan_dir.clone(),
            status_file: config.status_file.clone(),
        }
    }

    /// Create the work and plan directories. Existing content is kept.
    ///
    /// Returns `true` when the work directory did not exist before.
    pub fn initialize(&self) -> Result<bool> {
        let created = !self.root.exists();

        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;
        fs::create_dir_all(&self.plan_dir)
            .with_context(|| format!("Failed to create {}", self.plan_dir.display()))?;
        if let Some(parent) = self.status_file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        if created {
            self.create_readme()?;
        }
        Ok(created)
    }

    /// Fail unless the plan directory exists.
    pub fn load(&self) -> Result<()> {
        if !self.plan_dir.is_dir() {
            anyhow::bail!(
                "plan directory {} does not exist. Run 'morty init' first.",
                self.plan_dir.display()
            );
        }
        Ok(())
    }

    fn create_readme(&self) -> Result<()> {
        let readme_content = r#"# morty Work Directory

This directory is managed by the morty CLI and contains:

- `plan/` - One markdown plan per module
- `status.json` - The compiled schedule and job progress
- `config.toml` - Optional path and retry overrides

Do not manually edit `status.json` while a run is in progress.
"#;

        let readme_path = self.root.join("README.md");
        fs::write(readme_path, readme_content).context("Failed to create README.md")?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plan_dir(&self) -> &Path {
        &self.plan_dir
    }

    pub fn status_file(&self) -> &Path {
        &self.status_file
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(paths::CONFIG_FILE)
    }
}
