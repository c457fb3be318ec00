use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::Project;
use crate::schedule::{reset, ResetScope};

/// Operator action: return jobs to PENDING
pub fn execute(root: &Path, module: Option<String>, job: Option<String>) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;

    let scope = match (module, job) {
        (Some(module), Some(job)) => ResetScope::Job { module, job },
        (Some(module), None) => ResetScope::Module(module),
        (None, None) => ResetScope::All,
        (None, Some(_)) => anyhow::bail!("--job requires --module"),
    };

    let count = project.store.update(|schedule| reset(schedule, &scope))?;
    println!("{} Reset {count} job(s) to PENDING", "↺".cyan().bold());
    Ok(())
}
