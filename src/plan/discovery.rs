//! Locate plan documents in the plan directory.

use glob::glob;
use std::path::{Path, PathBuf};

use super::parser::PlanParser;
use super::Plan;
use crate::error::{MortyError, Result};

/// A parsed plan together with the module identity derived from its file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSource {
    /// File stem; the module's stable identifier.
    pub module_name: String,
    /// File name within the plan directory.
    pub source_file: String,
    pub plan: Plan,
}

impl PlanSource {
    /// Human-facing name: the plan title, or the module name when untitled.
    pub fn display_name(&self) -> &str {
        if self.plan.name.is_empty() {
            &self.module_name
        } else {
            &self.plan.name
        }
    }
}

impl PlanParser {
    /// Every `*.md` plan in the plan directory except `README*`, sorted by
    /// file name.
    pub fn discover_files(&self) -> Result<Vec<PathBuf>> {
        let dir = self.plan_dir();
        if !dir.is_dir() {
            return Err(MortyError::persistence(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "plan directory does not exist"),
            ));
        }

        let pattern = dir.join("*.md");
        let entries = glob(&pattern.to_string_lossy()).map_err(|e| MortyError::Parse {
            source_file: dir.display().to_string(),
            message: format!("invalid plan directory pattern: {e}"),
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                MortyError::persistence(path, e.into_error())
            })?;
            if path.is_file() && !is_readme(&path) {
                files.push(path);
            }
        }
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(files)
    }

    /// Parse every discovered plan.
    pub fn discover(&self) -> Result<Vec<PlanSource>> {
        let files = self.discover_files()?;
        let mut sources = Vec::with_capacity(files.len());
        for path in files {
            let plan = self.parse_file(&path)?;
            let module_name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source_file = path
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            sources.push(PlanSource {
                module_name,
                source_file,
                plan,
            });
        }
        tracing::info!(
            dir = %self.plan_dir().display(),
            plans = sources.len(),
            "discovered plans"
        );
        Ok(sources)
    }
}

fn is_readme(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase().starts_with("readme"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use std::fs;
    use tempfile::TempDir;

    fn setup_plans(files: &[(&str, &str)]) -> (TempDir, PlanParser) {
        let temp = TempDir::new().unwrap();
        let config = Config::rooted_at(temp.path());
        fs::create_dir_all(&config.plan_dir).unwrap();
        for (name, content) in files {
            fs::write(config.plan_dir.join(name), content).unwrap();
        }
        (temp, PlanParser::new(&config))
    }

    #[test]
    fn test_discover_sorted_and_skips_readme() {
        let (_temp, parser) = setup_plans(&[
            ("storage.md", "# Plan: Storage\n"),
            ("README.md", "# Readme\n"),
            ("config.md", "# Plan: Config\n"),
            ("notes.txt", "ignored"),
        ]);

        let sources = parser.discover().unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.module_name.as_str()).collect();
        assert_eq!(names, vec!["config", "storage"]);
        assert_eq!(sources[0].source_file, "config.md");
        assert_eq!(sources[0].display_name(), "Config");
    }

    #[test]
    fn test_display_name_falls_back_to_stem() {
        let (_temp, parser) = setup_plans(&[("untitled.md", "no heading here\n")]);
        let sources = parser.discover().unwrap();
        assert_eq!(sources[0].display_name(), "untitled");
    }

    #[test]
    fn test_missing_plan_dir_is_persistence_error() {
        let temp = TempDir::new().unwrap();
        let parser = PlanParser::new(&Config::rooted_at(temp.path()));
        assert!(matches!(
            parser.discover(),
            Err(MortyError::Persistence { .. })
        ));
    }
}
