//! Plan document parser - turns one module's markdown into a [`Plan`]

use std::fs;
use std::path::{Path, PathBuf};

mod extraction;

pub use extraction::{extract_plan_name, parse_job_heading};

use crate::config::Config;
use crate::error::{MortyError, Result};
use crate::parser::{fields, MarkdownDocument};
use crate::plan::{labels, Plan};

/// Parses plan documents found under the configured plan directory.
///
/// Parsing is pure: the same text always yields the same [`Plan`], and
/// missing optional sections produce empty values rather than errors.
#[derive(Debug, Clone)]
pub struct PlanParser {
    plan_dir: PathBuf,
}

impl PlanParser {
    pub fn new(config: &Config) -> Self {
        Self {
            plan_dir: config.plan_dir.clone(),
        }
    }

    pub fn plan_dir(&self) -> &Path {
        &self.plan_dir
    }

    /// Parse plan text that did not come from a file.
    pub fn parse(&self, text: &str) -> Result<Plan> {
        parse_plan_content(text, "<inline>")
    }

    /// Read and parse one plan file. Relative paths resolve against the plan dir.
    pub fn parse_file(&self, path: &Path) -> Result<Plan> {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.plan_dir.join(path)
        };
        let content = fs::read_to_string(&path).map_err(|e| MortyError::persistence(&path, e))?;
        let source = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        parse_plan_content(&content, &source)
    }
}

/// Parse plan content; `source` names the document in errors.
pub fn parse_plan_content(content: &str, source: &str) -> Result<Plan> {
    let doc = MarkdownDocument::parse(content);
    let overview = extraction::overview_text(&doc, content);

    let plan = Plan {
        name: extract_plan_name(&doc).unwrap_or_default(),
        responsibility: fields::bold_field(&overview, labels::RESPONSIBILITY)
            .unwrap_or_default(),
        research: fields::list_field(&overview, labels::RESEARCH),
        dependencies: fields::list_field(&overview, labels::DEPENDENCIES),
        dependents: fields::list_field(&overview, labels::DEPENDENTS),
        jobs: extraction::extract_jobs(&doc, source)?,
    };

    tracing::debug!(
        source,
        name = %plan.name,
        jobs = plan.jobs.len(),
        dependencies = plan.dependencies().len(),
        "parsed plan"
    );
    Ok(plan)
}
