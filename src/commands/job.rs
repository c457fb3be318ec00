//! Driver-facing job lifecycle commands.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;

use super::Project;
use crate::error::MortyError;
use crate::models::schedule::{Completion, FailureOutcome, JobPosition, Schedule};
use crate::plan::PlanParser;
use crate::schedule::{sync_from_plan, JobSelector, JobStateMachine};

fn label(schedule: &Schedule, pos: JobPosition) -> String {
    match schedule.job(pos) {
        Some(job) => format!(
            "{}/{}",
            schedule.modules[pos.module_index].name, job.name
        ),
        None => pos.to_string(),
    }
}

fn no_running_job() -> anyhow::Error {
    anyhow::anyhow!("no job is running. Use 'morty start' first.")
}

/// Print the job that `start` would pick
pub fn next(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let schedule = project.store.load()?;

    if let Some(pos) = JobSelector::in_flight(&schedule) {
        println!("{} {} is still running", "!".yellow().bold(), label(&schedule, pos));
        return Ok(());
    }
    match JobSelector::next(&schedule) {
        Ok(pos) => {
            let global_index = schedule.job(pos).map(|j| j.global_index).unwrap_or_default();
            println!("{} (#{})", label(&schedule, pos).bold(), global_index + 1);
            Ok(())
        }
        Err(MortyError::NoPendingJobs) => {
            println!("{}", "All jobs completed".green().bold());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Mark the next job RUNNING
pub fn start(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let started = project.store.update(|schedule| {
        if let Some(pos) = JobSelector::in_flight(schedule) {
            return Ok(Err(label(schedule, pos)));
        }
        let pos = JobSelector::next(schedule)?;
        machine.mark_running(schedule, pos)?;
        Ok(Ok(label(schedule, pos)))
    })?;

    match started {
        Ok(job) => println!("{} Started {}", "▶".cyan().bold(), job.bold()),
        Err(running) => anyhow::bail!(
            "{running} is already running. Complete, fail or interrupt it first."
        ),
    }
    Ok(())
}

/// Mark the running job COMPLETED after syncing task states from its plan
pub fn complete(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let current = project.store.load()?;
    let pos = JobSelector::in_flight(&current).ok_or_else(no_running_job)?;
    let module = &current.modules[pos.module_index];
    let plan = PlanParser::new(&project.config)
        .parse_file(Path::new(&module.source_file))
        .with_context(|| format!("Failed to re-read plan for {}", module.name))?;
    let module_name = module.name.clone();
    let job_name = current.job(pos).map(|j| j.name.clone()).unwrap_or_default();
    if let Some(plan_job) = plan.job_by_name(&job_name) {
        tracing::debug!(
            job = %job_name,
            checked = plan_job.completed_tasks(),
            marked = plan_job.completion_marked(),
            "plan state before completion"
        );
        if !plan_job.completion_marked() && plan_job.completion_status.is_some() {
            println!(
                "  {} plan completion status is not marked done",
                "note:".cyan().bold()
            );
        }
    }

    let (job, completion) = project.store.update(|schedule| {
        sync_from_plan(schedule, &module_name, &plan)?;
        let completion = machine.mark_completed(schedule, pos)?;
        Ok((label(schedule, pos), completion))
    })?;

    println!("{} Completed {}", "✓".green().bold(), job.bold());
    if let Completion::Inconsistent { completed, total } = completion {
        println!(
            "  {} only {completed}/{total} tasks are checked off",
            "warning:".yellow().bold()
        );
    }
    Ok(())
}

/// Report a failed attempt for the running job
pub fn fail(root: &Path, reason: Option<String>) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let result = project.store.update(|schedule| {
        let Some(pos) = JobSelector::in_flight(schedule) else {
            return Ok(None);
        };
        let outcome = machine.mark_failed(schedule, pos, reason)?;
        Ok(Some((label(schedule, pos), outcome)))
    })?;
    let (job, outcome) = result.ok_or_else(no_running_job)?;

    match outcome {
        FailureOutcome::Retry { retry_count } => println!(
            "{} {} failed, retry {retry_count}/{}",
            "↻".yellow().bold(),
            job.bold(),
            machine.max_retries()
        ),
        FailureOutcome::Exhausted { retry_count } => println!(
            "{} {} failed after {retry_count} retries. Use 'morty reset' to try again.",
            "✗".red().bold(),
            job.bold()
        ),
    }
    Ok(())
}

/// Flag the running job as interrupted
pub fn interrupt(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let result = project.store.update(|schedule| {
        let Some(pos) = JobSelector::in_flight(schedule) else {
            return Ok(None);
        };
        let changed = machine.mark_interrupted(schedule, pos)?;
        Ok(Some((label(schedule, pos), changed)))
    })?;
    let (job, changed) = result.ok_or_else(no_running_job)?;

    if changed {
        println!("{} {} marked interrupted", "⏸".yellow().bold(), job.bold());
    } else {
        println!("{job} was already interrupted");
    }
    Ok(())
}

/// Clear the interrupted flag so the running job continues in place
pub fn resume(root: &Path) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let result = project.store.update(|schedule| {
        let Some(pos) = JobSelector::in_flight(schedule) else {
            return Ok(None);
        };
        let changed = machine.clear_interrupted(schedule, pos)?;
        Ok(Some((label(schedule, pos), changed)))
    })?;
    let (job, changed) = result.ok_or_else(no_running_job)?;

    if changed {
        println!("{} Resuming {}", "▶".cyan().bold(), job.bold());
    } else {
        println!("{job} was not interrupted");
    }
    Ok(())
}

/// Operator action: park a job as BLOCKED
pub fn block(root: &Path, module: &str, job: &str, reason: Option<String>) -> Result<()> {
    let project = Project::open(root)?;
    project.require_schedule()?;
    let machine = JobStateMachine::from_config(&project.config);

    let blocked = project.store.update(|schedule| {
        let pos = schedule.position_of(module, job)?;
        machine.mark_blocked(schedule, pos, reason)?;
        Ok(label(schedule, pos))
    })?;

    println!("{} Blocked {}", "■".red().bold(), blocked.bold());
    Ok(())
}
