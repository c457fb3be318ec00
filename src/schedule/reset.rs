//! Operator reset of jobs back to PENDING.

use crate::error::{MortyError, Result};
use crate::models::schedule::{Schedule, Status};

/// Which jobs a reset applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetScope {
    All,
    /// Every job of one module, by name or display name.
    Module(String),
    Job { module: String, job: String },
}

/// Return the jobs in `scope` to a fresh PENDING state and recompute the
/// rollups. Returns the number of jobs reset.
pub fn reset(schedule: &mut Schedule, scope: &ResetScope) -> Result<usize> {
    let count = match scope {
        ResetScope::All => {
            let mut count = 0;
            for module in &mut schedule.modules {
                for job in &mut module.jobs {
                    job.reset();
                    count += 1;
                }
            }
            for index in 0..schedule.modules.len() {
                schedule.touch(index);
            }
            count
        }
        ResetScope::Module(name) => {
            let index = schedule
                .find_module(name)
                .ok_or_else(|| MortyError::ModuleNotFound(name.clone()))?;
            let module = &mut schedule.modules[index];
            module.jobs.iter_mut().for_each(|job| job.reset());
            let count = module.jobs.len();
            schedule.touch(index);
            count
        }
        ResetScope::Job { module, job } => {
            let pos = schedule.position_of(module, job)?;
            if let Some(job) = schedule.job_mut(pos) {
                job.reset();
            }
            schedule.touch(pos.module_index);
            1
        }
    };

    refresh_global(schedule);
    tracing::info!(?scope, jobs = count, "reset jobs");
    Ok(count)
}

fn refresh_global(schedule: &mut Schedule) {
    let jobs = schedule.modules.iter().flat_map(|m| &m.jobs);
    let mut running = false;
    let mut failed = false;
    for job in jobs {
        running |= job.status == Status::Running;
        failed |= job.status == Status::Failed;
    }

    schedule.global.status = if !schedule.modules.iter().all(|m| m.jobs.is_empty())
        && schedule.is_complete()
    {
        Status::Completed
    } else if running {
        Status::Running
    } else if failed {
        Status::Failed
    } else {
        Status::Pending
    };
}
