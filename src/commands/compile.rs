use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use super::Project;
use crate::schedule::ScheduleCompiler;

/// Parse every plan and write a fresh schedule
pub fn execute(root: &Path, force: bool) -> Result<()> {
    let project = Project::open(root)?;
    project.work_dir.load()?;

    if project.store.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to recompile and discard progress.",
            project.store.path().display()
        );
    }

    let schedule = ScheduleCompiler::new(&project.config)
        .compile_dir()
        .context("Failed to compile plans")?;
    project
        .store
        .save(&schedule)
        .context("Failed to save schedule")?;

    println!(
        "{} Compiled {} modules, {} jobs",
        "✓".green().bold(),
        schedule.global.total_modules,
        schedule.global.total_jobs
    );
    for module in &schedule.modules {
        let jobs: Vec<&str> = module.jobs.iter().map(|j| j.name.as_str()).collect();
        println!("  {:>2}. {} ({})", module.index + 1, module.name.bold(), jobs.join(" → "));
    }
    Ok(())
}
