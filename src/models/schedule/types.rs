use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compiled, persisted execution document covering every module and job.
///
/// Modules and their jobs are stored in topological order; `global_index`
/// on each job is the authoritative execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Schedule {
    pub version: String,
    pub global: GlobalState,
    pub modules: Vec<ModuleState>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalState {
    pub status: Status,
    pub start_time: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
    pub current_module_index: usize,
    /// Global index of the job most recently marked RUNNING.
    pub current_job_index: usize,
    pub total_modules: usize,
    pub total_jobs: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleState {
    pub index: usize,
    /// Module identifier (plan file stem).
    pub name: String,
    pub display_name: String,
    pub source_file: String,
    pub status: Status,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub jobs: Vec<JobState>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobState {
    /// Position within the module.
    pub index: usize,
    /// Position in the flattened execution order. Assigned once at compile time.
    pub global_index: usize,
    pub name: String,
    pub status: Status,
    /// Original prerequisite references, display only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<String>,
    pub tasks_total: usize,
    pub tasks_completed: usize,
    pub loop_count: u32,
    pub retry_count: u32,
    #[serde(default)]
    pub interrupted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks: Vec<TaskState>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub debug_logs: Vec<DebugLogEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskState {
    /// 1-based position in the job's task list.
    pub index: usize,
    pub status: Status,
    pub description: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DebugLogEntry {
    pub id: String,
    pub phenomenon: String,
    pub reproduction: String,
    #[serde(default)]
    pub hypotheses: Vec<String>,
    #[serde(default)]
    pub verification_todo: Vec<String>,
    pub fix: String,
    pub progress: String,
}

/// Execution status shared by jobs, modules, tasks and the global block.
///
/// Job transitions:
/// - `Pending` -> `Running` (job picked up)
/// - `Running` -> `Completed` (external step reported success)
/// - `Running` -> `Pending` (failure with retry budget left)
/// - `Running` -> `Failed` (failure with retry budget exhausted)
/// - `Pending` | `Running` -> `Blocked` (operator action only)
///
/// `Completed`, `Failed` and `Blocked` are terminal for automatic transitions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pending,
    Running,
    Completed,
    Failed,
    Blocked,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Pending => write!(f, "PENDING"),
            Status::Running => write!(f, "RUNNING"),
            Status::Completed => write!(f, "COMPLETED"),
            Status::Failed => write!(f, "FAILED"),
            Status::Blocked => write!(f, "BLOCKED"),
        }
    }
}

/// Address of a job inside a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobPosition {
    pub module_index: usize,
    pub job_index: usize,
}

impl JobPosition {
    pub fn new(module_index: usize, job_index: usize) -> Self {
        Self {
            module_index,
            job_index,
        }
    }
}

impl std::fmt::Display for JobPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.module_index, self.job_index)
    }
}

/// Result of `MarkCompleted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Clean,
    /// The job completed while some of its tasks were not observed as done.
    Inconsistent { completed: usize, total: usize },
}

/// Result of `MarkFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureOutcome {
    /// The job went back to PENDING and will be offered again.
    Retry { retry_count: u32 },
    /// The retry budget is spent; the job is FAILED.
    Exhausted { retry_count: u32 },
}
