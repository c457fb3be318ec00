use anyhow::Result;
use colored::{ColoredString, Colorize};
use std::path::Path;

use super::Project;
use crate::models::schedule::{JobState, Schedule, Status};

/// Show schedule progress
pub fn execute(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let schedule = project.store.load()?;
    display(&schedule);
    Ok(())
}

fn display(schedule: &Schedule) {
    println!("{}", "morty Status".bold().blue());
    println!("{}", "=".repeat(50));
    println!(
        "Status: {}   Jobs: {}/{}   Modules: {}/{}",
        colorize(schedule.global.status),
        schedule.count_completed_jobs(),
        schedule.global.total_jobs,
        schedule.count_completed_modules(),
        schedule.global.total_modules
    );
    println!(
        "Last update: {}",
        schedule.global.last_update.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for module in &schedule.modules {
        println!(
            "\n{} {} {}",
            colorize(module.status),
            module.display_name.bold(),
            format!("({})", module.source_file).dimmed()
        );
        for job in &module.jobs {
            display_job(job);
        }
    }
    println!();
}

fn display_job(job: &JobState) {
    let mut line = format!(
        "  {:>3}. {:<10} {} [{}/{}]",
        job.global_index + 1,
        colorize(job.status).to_string(),
        job.name,
        job.tasks_completed,
        job.tasks_total
    );
    if job.retry_count > 0 {
        line.push_str(&format!(" retries={}", job.retry_count));
    }
    if job.interrupted {
        line.push_str(&format!(" {}", "interrupted".yellow()));
    }
    println!("{line}");
    if let Some(reason) = &job.failure_reason {
        println!("       {}", reason.dimmed());
    }
}

fn colorize(status: Status) -> ColoredString {
    let text = status.to_string();
    match status {
        Status::Pending => text.normal(),
        Status::Running => text.cyan().bold(),
        Status::Completed => text.green(),
        Status::Failed => text.red().bold(),
        Status::Blocked => text.magenta(),
    }
}
