//! Schedule-level job lifecycle.
//!
//! `JobState` owns the per-job transition rules; this layer addresses jobs
//! by position and keeps module and global rollups in step with them.

use crate::config::Config;
use crate::error::{MortyError, Result};
use crate::models::constants::MAX_RETRIES;
use crate::models::schedule::{
    Completion, FailureOutcome, JobPosition, JobState, Schedule, Status,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobStateMachine {
    max_retries: u32,
}

impl Default for JobStateMachine {
    fn default() -> Self {
        Self::new(MAX_RETRIES)
    }
}

impl JobStateMachine {
    /// Budgets above [`MAX_RETRIES`] are clamped.
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries: max_retries.min(MAX_RETRIES),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.max_retries)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// `PENDING -> RUNNING`; records the job as current on the global block.
    pub fn mark_running(&self, schedule: &mut Schedule, pos: JobPosition) -> Result<()> {
        let job = job_mut(schedule, pos)?;
        job.mark_running()?;
        let global_index = job.global_index;
        tracing::info!(job = %job.name, loop_count = job.loop_count, "job started");

        schedule.global.status = Status::Running;
        schedule.global.current_module_index = pos.module_index;
        schedule.global.current_job_index = global_index;
        schedule.touch(pos.module_index);
        Ok(())
    }

    /// `RUNNING -> COMPLETED`. An unfinished task list is reported, not rejected.
    pub fn mark_completed(&self, schedule: &mut Schedule, pos: JobPosition) -> Result<Completion> {
        let job = job_mut(schedule, pos)?;
        let completion = job.mark_completed()?;
        match completion {
            Completion::Clean => tracing::info!(job = %job.name, "job completed"),
            Completion::Inconsistent { completed, total } => tracing::warn!(
                job = %job.name,
                completed,
                total,
                "job completed with unfinished tasks"
            ),
        }

        schedule.touch(pos.module_index);
        if schedule.is_complete() {
            schedule.global.status = Status::Completed;
        }
        Ok(completion)
    }

    /// Report a failed attempt. Retries go back to PENDING; once the budget
    /// is spent the job and the schedule become FAILED.
    pub fn mark_failed(
        &self,
        schedule: &mut Schedule,
        pos: JobPosition,
        reason: Option<String>,
    ) -> Result<FailureOutcome> {
        let max_retries = self.max_retries;
        let job = job_mut(schedule, pos)?;
        let outcome = job.mark_failed(max_retries, reason)?;
        match outcome {
            FailureOutcome::Retry { retry_count } => {
                tracing::info!(job = %job.name, retry_count, max_retries, "job will be retried")
            }
            FailureOutcome::Exhausted { retry_count } => {
                tracing::warn!(job = %job.name, retry_count, "retry budget exhausted")
            }
        }

        schedule.touch(pos.module_index);
        if matches!(outcome, FailureOutcome::Exhausted { .. }) {
            schedule.global.status = Status::Failed;
        }
        Ok(outcome)
    }

    /// Operator action: park a PENDING or RUNNING job.
    pub fn mark_blocked(
        &self,
        schedule: &mut Schedule,
        pos: JobPosition,
        reason: Option<String>,
    ) -> Result<()> {
        let job = job_mut(schedule, pos)?;
        job.mark_blocked(reason)?;
        tracing::info!(job = %job.name, "job blocked");
        schedule.touch(pos.module_index);
        Ok(())
    }

    /// Returns `false` when the flag was already set.
    pub fn mark_interrupted(&self, schedule: &mut Schedule, pos: JobPosition) -> Result<bool> {
        let job = job_mut(schedule, pos)?;
        let changed = job.mark_interrupted()?;
        if changed {
            tracing::warn!(job = %job.name, "job interrupted");
            schedule.touch(pos.module_index);
        }
        Ok(changed)
    }

    /// Returns `false` when there was nothing to clear.
    pub fn clear_interrupted(&self, schedule: &mut Schedule, pos: JobPosition) -> Result<bool> {
        let changed = job_mut(schedule, pos)?.clear_interrupted();
        if changed {
            schedule.touch(pos.module_index);
        }
        Ok(changed)
    }

    /// Store the observed state of one task (1-based index).
    pub fn record_task(
        &self,
        schedule: &mut Schedule,
        pos: JobPosition,
        task_index: usize,
        completed: bool,
    ) -> Result<bool> {
        let changed = job_mut(schedule, pos)?.record_task(task_index, completed)?;
        if changed {
            schedule.touch(pos.module_index);
        }
        Ok(changed)
    }
}

fn job_mut(schedule: &mut Schedule, pos: JobPosition) -> Result<&mut JobState> {
    let module = schedule
        .modules
        .get(pos.module_index)
        .map(|m| m.name.clone())
        .unwrap_or_else(|| pos.module_index.to_string());
    schedule.job_mut(pos).ok_or(MortyError::JobNotFound {
        module,
        job: pos.job_index.to_string(),
    })
}
