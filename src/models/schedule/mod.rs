mod methods;
mod transitions;
mod types;


pub use types::{
    Completion, DebugLogEntry, FailureOutcome, GlobalState, JobPosition, JobState, ModuleState,
    Schedule, Status, TaskState,
};
