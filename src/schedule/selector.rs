//! Pick the next job to run from a compiled schedule.

use crate::error::{MortyError, Result};
use crate::models::schedule::{JobPosition, Schedule, Status};

/// Stateless selection over the stored execution order.
///
/// Jobs are only ever considered in ascending `global_index`, and the scan
/// stops at the first job that is neither COMPLETED nor BLOCKED. A later job
/// is never handed out while an earlier one is unfinished.
#[derive(Debug, Clone, Copy, Default)]
pub struct JobSelector;

impl JobSelector {
    /// The job the driver should work on now.
    ///
    /// A RUNNING job left behind by a crashed run is offered again so the
    /// driver can resume or fail it. A FAILED job halts the schedule with
    /// [`MortyError::RetryExhausted`]; when every job is finished the result
    /// is [`MortyError::NoPendingJobs`].
    pub fn next(schedule: &Schedule) -> Result<JobPosition> {
        for (pos, job) in schedule.jobs_in_order() {
            match job.status {
                Status::Pending | Status::Running => return Ok(pos),
                Status::Failed => {
                    return Err(MortyError::RetryExhausted {
                        job: job.name.clone(),
                        retries: job.retry_count,
                    })
                }
                Status::Completed | Status::Blocked => {}
            }
        }
        Err(MortyError::NoPendingJobs)
    }

    /// The RUNNING job, if a previous run left one behind.
    pub fn in_flight(schedule: &Schedule) -> Option<JobPosition> {
        schedule
            .jobs_in_order()
            .into_iter()
            .find(|(_, job)| job.status == Status::Running)
            .map(|(pos, _)| pos)
    }
}
