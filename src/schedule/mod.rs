//! Compiling plans into a schedule and driving it afterwards.

pub mod compiler;
pub mod machine;
pub mod reset;
pub mod selector;
pub mod sync;

pub use compiler::ScheduleCompiler;
pub use machine::JobStateMachine;
pub use reset::{reset, ResetScope};
pub use selector::JobSelector;
pub use sync::sync_from_plan;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;

    use crate::models::constants::SCHEDULE_VERSION;
    use crate::models::schedule::{GlobalState, JobState, ModuleState, Schedule, Status, TaskState};

    pub fn job_with_tasks(index: usize, global_index: usize, tasks: usize) -> JobState {
        let now = Utc::now();
        JobState {
            index,
            global_index,
            name: format!("job {}", global_index + 1),
            status: Status::Pending,
            prerequisites: Vec::new(),
            tasks_total: tasks,
            tasks_completed: 0,
            loop_count: 0,
            retry_count: 0,
            interrupted: false,
            failure_reason: None,
            tasks: (1..=tasks)
                .map(|i| TaskState {
                    index: i,
                    status: Status::Pending,
                    description: format!("task {i}"),
                    updated_at: now,
                })
                .collect(),
            debug_logs: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Modules in the given order, each with `n` task-less pending jobs.
    pub fn schedule_with(modules: &[(&str, usize)]) -> Schedule {
        let now = Utc::now();
        let mut global_index = 0;
        let modules: Vec<ModuleState> = modules
            .iter()
            .enumerate()
            .map(|(mi, (name, jobs))| {
                let jobs = (0..*jobs)
                    .map(|ji| {
                        let job = job_with_tasks(ji, global_index, 0);
                        global_index += 1;
                        job
                    })
                    .collect();
                ModuleState {
                    index: mi,
                    name: name.to_string(),
                    display_name: name.to_uppercase(),
                    source_file: format!("{name}.md"),
                    status: Status::Pending,
                    dependencies: Vec::new(),
                    jobs,
                    created_at: now,
                    updated_at: now,
                }
            })
            .collect();

        Schedule {
            version: SCHEDULE_VERSION.to_string(),
            global: GlobalState {
                status: Status::Pending,
                start_time: now,
                last_update: now,
                current_module_index: 0,
                current_job_index: 0,
                total_modules: modules.len(),
                total_jobs: global_index,
            },
            modules,
        }
    }
}
