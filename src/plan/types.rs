use serde::{Deserialize, Serialize};

/// Parsed representation of one module's plan document.
///
/// List fields are `None` when the document does not declare them and
/// `Some(vec![])` when they are declared as "none".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub responsibility: String,
    pub research: Option<Vec<String>>,
    pub dependencies: Option<Vec<String>>,
    pub dependents: Option<Vec<String>>,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    /// Ordinal declared in the heading; not necessarily contiguous.
    pub index: u32,
    pub name: String,
    pub goal: String,
    pub prerequisites: Option<Vec<String>>,
    pub tasks: Vec<TaskItem>,
    pub validators: Vec<String>,
    pub debug_logs: Vec<DebugLog>,
    /// Free-text completion status, when the job declares one.
    pub completion_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskItem {
    /// 1-based position within the job's task list.
    pub index: usize,
    pub description: String,
    pub completed: bool,
}

/// One comma-separated debug-log line, mapped positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugLog {
    pub id: String,
    pub phenomenon: String,
    pub reproduction: String,
    pub hypotheses: Vec<String>,
    pub verification_todo: Vec<String>,
    pub fix: String,
    pub progress: String,
}

const COMPLETION_MARKERS: &[&str] = &["✅", "completed", "done", "finished", "已完成", "完成"];

impl Plan {
    /// Declared dependencies, empty when absent or "none".
    pub fn dependencies(&self) -> &[String] {
        self.dependencies.as_deref().unwrap_or_default()
    }

    pub fn job_by_index(&self, index: u32) -> Option<&Job> {
        self.jobs.iter().find(|j| j.index == index)
    }

    /// Case-insensitive lookup by job name.
    pub fn job_by_name(&self, name: &str) -> Option<&Job> {
        let wanted = name.trim().to_lowercase();
        self.jobs.iter().find(|j| j.name.to_lowercase() == wanted)
    }
}

impl Job {
    pub fn prerequisites(&self) -> &[String] {
        self.prerequisites.as_deref().unwrap_or_default()
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Whether the completion status text carries a completion marker.
    pub fn completion_marked(&self) -> bool {
        let Some(status) = &self.completion_status else {
            return false;
        };
        let lower = status.to_lowercase();
        COMPLETION_MARKERS.iter().any(|m| lower.contains(m))
    }
}
