use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use super::Project;

/// Create the work and plan directories
pub fn execute(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    let created = project.work_dir.initialize()?;

    if created {
        println!(
            "{} Initialized {}",
            "✓".green().bold(),
            project.work_dir.root().display()
        );
    } else {
        println!("{} already exists", project.work_dir.root().display());
    }
    println!(
        "  Put one plan per module in {}",
        project.work_dir.plan_dir().display().to_string().cyan()
    );
    println!(
        "  Optional overrides go in {}",
        project.work_dir.config_file().display()
    );
    Ok(())
}
