//! Runtime configuration.
//!
//! A `Config` value is resolved once (defaults, then `.morty/config.toml`,
//! then `MORTY_*` environment variables) and handed to every component that
//! touches the filesystem.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::constants::{paths, MAX_RETRIES};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub work_dir: PathBuf,
    pub plan_dir: PathBuf,
    pub status_file: PathBuf,
    /// Automatic retry budget per job, never above [`MAX_RETRIES`].
    pub max_retries: u32,
}

/// On-disk shape of `config.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    paths: PathsSection,
    #[serde(default)]
    execution: ExecutionSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PathsSection {
    work_dir: Option<String>,
    plan_dir: Option<String>,
    status_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ExecutionSection {
    max_retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self::rooted_at(Path::new("."))
    }
}

impl Config {
    /// Default layout under `root`: `.morty/`, `.morty/plan/`, `.morty/status.json`.
    pub fn rooted_at(root: &Path) -> Self {
        let work_dir = root.join(paths::WORK_DIR);
        Self {
            plan_dir: work_dir.join(paths::PLAN_DIR),
            status_file: work_dir.join(paths::STATUS_FILE),
            work_dir,
            max_retries: MAX_RETRIES,
        }
    }

    /// Resolve configuration for the project at `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(paths::WORK_DIR).join(paths::CONFIG_FILE);
        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
            Self::from_toml(root, &content)
                .with_context(|| format!("Failed to parse config: {}", config_path.display()))?
        } else {
            Self::rooted_at(root)
        };
        config.apply_env(root)?;
        Ok(config)
    }

    /// Build a config from TOML text; relative paths resolve against `root`.
    pub fn from_toml(root: &Path, content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        let mut config = Self::rooted_at(root);

        if let Some(work_dir) = file.paths.work_dir {
            config.work_dir = resolve_path(root, &work_dir);
            // Plan dir and status file follow a relocated work dir unless set explicitly.
            config.plan_dir = config.work_dir.join(paths::PLAN_DIR);
            config.status_file = config.work_dir.join(paths::STATUS_FILE);
        }
        if let Some(plan_dir) = file.paths.plan_dir {
            config.plan_dir = resolve_path(root, &plan_dir);
        }
        if let Some(status_file) = file.paths.status_file {
            config.status_file = resolve_path(root, &status_file);
        }
        if let Some(max_retries) = file.execution.max_retries {
            config.max_retries = max_retries.min(MAX_RETRIES);
        }
        Ok(config)
    }

    fn apply_env(&mut self, root: &Path) -> Result<()> {
        if let Ok(work_dir) = env::var("MORTY_WORK_DIR") {
            let previous = std::mem::replace(&mut self.work_dir, resolve_path(root, &work_dir));
            // Children still at their default spot follow the work dir.
            if self.plan_dir == previous.join(paths::PLAN_DIR) {
                self.plan_dir = self.work_dir.join(paths::PLAN_DIR);
            }
            if self.status_file == previous.join(paths::STATUS_FILE) {
                self.status_file = self.work_dir.join(paths::STATUS_FILE);
            }
        }
        if let Ok(plan_dir) = env::var("MORTY_PLAN_DIR") {
            self.plan_dir = resolve_path(root, &plan_dir);
        }
        if let Ok(status_file) = env::var("MORTY_STATUS_FILE") {
            self.status_file = resolve_path(root, &status_file);
        }
        if let Ok(max_retries) = env::var("MORTY_MAX_RETRIES") {
            let value: u32 = max_retries
                .trim()
                .parse()
                .with_context(|| format!("MORTY_MAX_RETRIES is not a number: {max_retries:?}"))?;
            self.max_retries = value.min(MAX_RETRIES);
        }
        Ok(())
    }
}

/// Expand `~/` and anchor relative paths at `root`.
fn resolve_path(root: &Path, raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}
