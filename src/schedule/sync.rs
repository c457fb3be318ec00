//! Copy observed plan progress back into the schedule.

use chrono::Utc;

use crate::error::{MortyError, Result};
use crate::models::schedule::{DebugLogEntry, Schedule};
use crate::plan::Plan;

/// Refresh one module's task states and debug logs from a re-parsed plan.
///
/// Jobs are matched by name. Tasks beyond what the schedule recorded at
/// compile time are ignored. Returns the number of task states that changed.
pub fn sync_from_plan(schedule: &mut Schedule, module: &str, plan: &Plan) -> Result<usize> {
    let module_index = schedule
        .find_module(module)
        .ok_or_else(|| MortyError::ModuleNotFound(module.to_string()))?;

    let mut changed = 0;
    for job in &mut schedule.modules[module_index].jobs {
        let Some(plan_job) = plan.job_by_name(&job.name) else {
            tracing::debug!(module, job = %job.name, "job not found in plan");
            continue;
        };

        for task in &plan_job.tasks {
            if task.index > job.tasks_total {
                continue;
            }
            if job.record_task(task.index, task.completed)? {
                changed += 1;
            }
        }

        let logs: Vec<DebugLogEntry> = plan_job.debug_logs.iter().map(DebugLogEntry::from).collect();
        if logs != job.debug_logs {
            job.debug_logs = logs;
            job.updated_at = Utc::now();
        }
    }

    schedule.touch(module_index);
    tracing::debug!(module, changed, "synced task states from plan");
    Ok(changed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::schedule::Status;
    use crate::plan::parser::parse_plan_content;
    use crate::plan::PlanSource;
    use crate::schedule::ScheduleCompiler;
    use std::path::Path;

    const PLAN: &str = "# Plan: Core\n## Job 1: Setup\n- [ ] one\n- [ ] two\n## Job 2: Build\n- [ ] three\n";

    fn compiled() -> Schedule {
        let plan = parse_plan_content(PLAN, "core.md").unwrap();
        ScheduleCompiler::new(&Config::rooted_at(Path::new("/p")))
            .compile(vec![PlanSource {
                module_name: "core".into(),
                source_file: "core.md".into(),
                plan,
            }])
            .unwrap()
    }

    #[test]
    fn test_sync_copies_checkbox_states() {
        let mut schedule = compiled();
        let updated = PLAN.replace("- [ ] two", "- [x] two").replace("- [ ] three", "- [X] three");
        let plan = parse_plan_content(&updated, "core.md").unwrap();

        assert_eq!(sync_from_plan(&mut schedule, "core", &plan).unwrap(), 2);
        let setup = &schedule.modules[0].jobs[0];
        assert_eq!(setup.tasks_completed, 1);
        assert_eq!(setup.tasks[1].status, Status::Completed);
        assert_eq!(schedule.modules[0].jobs[1].tasks_completed, 1);

        assert_eq!(sync_from_plan(&mut schedule, "core", &plan).unwrap(), 0);
    }

    #[test]
    fn test_sync_ignores_extra_tasks_and_updates_debug_logs() {
        let mut schedule = compiled();
        let updated = PLAN.replace(
            "- [ ] three\n",
            "- [ ] three\n- [x] four\n**Debug Logs**:\n- debug1: slow, run it, cache; io, time it, none yet, open\n",
        );
        let plan = parse_plan_content(&updated, "core.md").unwrap();

        assert_eq!(sync_from_plan(&mut schedule, "core", &plan).unwrap(), 0);
        let build = &schedule.modules[0].jobs[1];
        assert_eq!(build.tasks_total, 1);
        assert_eq!(build.tasks_completed, 0);
        assert_eq!(build.debug_logs.len(), 1);
        assert_eq!(build.debug_logs[0].hypotheses, vec!["cache", "io"]);
    }

    #[test]
    fn test_sync_unknown_module() {
        let mut schedule = compiled();
        let plan = parse_plan_content(PLAN, "core.md").unwrap();
        assert!(matches!(
            sync_from_plan(&mut schedule, "ghost", &plan),
            Err(MortyError::ModuleNotFound(_))
        ));
    }
}
