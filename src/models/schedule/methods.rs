use chrono::Utc;

use super::types::{
    Completion, FailureOutcome, JobPosition, JobState, ModuleState, Schedule, Status,
};
use crate::error::{MortyError, Result};

impl JobState {
    /// Attempt to transition the job to a new status with validation.
    ///
    /// On rejection the job is left untouched, timestamps included.
    fn try_transition(&mut self, new_status: Status) -> Result<()> {
        if !self.status.can_transition_to(&new_status) {
            return Err(MortyError::InvalidTransition {
                job: self.name.clone(),
                from: self.status,
                to: new_status,
            });
        }
        self.status = new_status;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// `Pending -> Running`. Each start counts as one execution loop.
    pub fn mark_running(&mut self) -> Result<()> {
        self.try_transition(Status::Running)?;
        self.loop_count += 1;
        Ok(())
    }

    /// `Running -> Completed`.
    ///
    /// Succeeds even when not every task was observed as done; that case is
    /// reported as [`Completion::Inconsistent`].
    pub fn mark_completed(&mut self) -> Result<Completion> {
        self.try_transition(Status::Completed)?;
        self.failure_reason = None;
        self.interrupted = false;
        if self.tasks_completed < self.tasks_total {
            Ok(Completion::Inconsistent {
                completed: self.tasks_completed,
                total: self.tasks_total,
            })
        } else {
            Ok(Completion::Clean)
        }
    }

    /// `Running -> Pending` while retries remain, `Running -> Failed` once
    /// `retry_count` has reached `max_retries`. Either way the attempt is
    /// over, so the interrupted flag is cleared.
    pub fn mark_failed(&mut self, max_retries: u32, reason: Option<String>) -> Result<FailureOutcome> {
        let outcome = if self.retry_count < max_retries {
            self.try_transition(Status::Pending)?;
            self.retry_count += 1;
            FailureOutcome::Retry {
                retry_count: self.retry_count,
            }
        } else {
            self.try_transition(Status::Failed)?;
            FailureOutcome::Exhausted {
                retry_count: self.retry_count,
            }
        };
        self.failure_reason = reason;
        self.interrupted = false;
        Ok(outcome)
    }

    /// Operator action: park the job in `Blocked`.
    pub fn mark_blocked(&mut self, reason: Option<String>) -> Result<()> {
        self.try_transition(Status::Blocked)?;
        self.failure_reason = reason;
        Ok(())
    }

    /// Flag that the external step ended abnormally. Only valid while running.
    ///
    /// Returns `false` when the flag was already set.
    pub fn mark_interrupted(&mut self) -> Result<bool> {
        if self.status != Status::Running {
            return Err(MortyError::InvalidTransition {
                job: self.name.clone(),
                from: self.status,
                to: Status::Running,
            });
        }
        if self.interrupted {
            return Ok(false);
        }
        self.interrupted = true;
        self.updated_at = Utc::now();
        Ok(true)
    }

    /// Returns `false` when there was nothing to clear.
    pub fn clear_interrupted(&mut self) -> bool {
        if !self.interrupted {
            return false;
        }
        self.interrupted = false;
        self.updated_at = Utc::now();
        true
    }

    /// Return the job to a fresh `Pending` state, dropping all progress.
    pub fn reset(&mut self) {
        let now = Utc::now();
        self.status = Status::Pending;
        self.loop_count = 0;
        self.retry_count = 0;
        self.tasks_completed = 0;
        self.interrupted = false;
        self.failure_reason = None;
        for task in &mut self.tasks {
            task.status = Status::Pending;
            task.updated_at = now;
        }
        self.updated_at = now;
    }

    /// Record the observed state of one task (1-based index).
    ///
    /// Returns `true` when the stored state changed.
    pub fn record_task(&mut self, task_index: usize, completed: bool) -> Result<bool> {
        let name = self.name.clone();
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.index == task_index)
            .ok_or(MortyError::TaskNotFound {
                job: name,
                task: task_index,
            })?;

        let status = if completed {
            Status::Completed
        } else {
            Status::Pending
        };
        if task.status == status {
            return Ok(false);
        }

        let now = Utc::now();
        task.status = status;
        task.updated_at = now;
        self.updated_at = now;
        self.recount_tasks();
        Ok(true)
    }

    /// Recompute `tasks_completed` from the task states.
    pub fn recount_tasks(&mut self) {
        let completed = self
            .tasks
            .iter()
            .filter(|t| t.status == Status::Completed)
            .count();
        self.tasks_completed = completed.min(self.tasks_total);
    }
}

impl ModuleState {
    /// Derive the module status from its jobs.
    pub fn rollup_status(&self) -> Status {
        if self.jobs.is_empty() {
            return Status::Pending;
        }
        if self.jobs.iter().all(|j| j.status == Status::Completed) {
            return Status::Completed;
        }
        for status in [Status::Running, Status::Failed, Status::Blocked] {
            if self.jobs.iter().any(|j| j.status == status) {
                return status;
            }
        }
        Status::Pending
    }
}

impl Schedule {
    pub fn job(&self, pos: JobPosition) -> Option<&JobState> {
        self.modules
            .get(pos.module_index)
            .and_then(|m| m.jobs.get(pos.job_index))
    }

    pub fn job_mut(&mut self, pos: JobPosition) -> Option<&mut JobState> {
        self.modules
            .get_mut(pos.module_index)
            .and_then(|m| m.jobs.get_mut(pos.job_index))
    }

    /// Every job with its position, in ascending `global_index` order.
    pub fn jobs_in_order(&self) -> Vec<(JobPosition, &JobState)> {
        let mut jobs: Vec<_> = self
            .modules
            .iter()
            .enumerate()
            .flat_map(|(mi, module)| {
                module
                    .jobs
                    .iter()
                    .enumerate()
                    .map(move |(ji, job)| (JobPosition::new(mi, ji), job))
            })
            .collect();
        jobs.sort_by_key(|(_, job)| job.global_index);
        jobs
    }

    /// Find a module by name or display name.
    pub fn find_module(&self, name: &str) -> Option<usize> {
        self.modules
            .iter()
            .position(|m| m.name == name)
            .or_else(|| self.modules.iter().position(|m| m.display_name == name))
    }

    /// Resolve `module`/`job` names to a position.
    pub fn position_of(&self, module: &str, job: &str) -> Result<JobPosition> {
        let mi = self
            .find_module(module)
            .ok_or_else(|| MortyError::ModuleNotFound(module.to_string()))?;
        let ji = self.modules[mi]
            .jobs
            .iter()
            .position(|j| j.name == job)
            .ok_or_else(|| MortyError::JobNotFound {
                module: module.to_string(),
                job: job.to_string(),
            })?;
        Ok(JobPosition::new(mi, ji))
    }

    pub fn count_completed_jobs(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| &m.jobs)
            .filter(|j| j.status == Status::Completed)
            .count()
    }

    /// Modules with at least one job, all of them completed.
    pub fn count_completed_modules(&self) -> usize {
        self.modules
            .iter()
            .filter(|m| !m.jobs.is_empty() && m.jobs.iter().all(|j| j.status == Status::Completed))
            .count()
    }

    pub fn is_complete(&self) -> bool {
        self.modules
            .iter()
            .flat_map(|m| &m.jobs)
            .all(|j| j.status == Status::Completed)
    }

    /// Refresh the module rollup and timestamps after a job-level change.
    pub(crate) fn touch(&mut self, module_index: usize) {
        let now = Utc::now();
        if let Some(module) = self.modules.get_mut(module_index) {
            module.status = module.rollup_status();
            module.updated_at = now;
        }
        self.global.last_update = now;
    }
}
