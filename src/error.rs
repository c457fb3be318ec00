//! Error taxonomy shared by the parser, compiler, state machine and store.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::schedule::Status;

pub type Result<T> = std::result::Result<T, MortyError>;

#[derive(Debug, Error)]
pub enum MortyError {
    /// A plan section could not be interpreted.
    #[error("parse error in {source_file}: {message}")]
    Parse {
        source_file: String,
        message: String,
    },

    /// A prerequisite points at a job that does not exist.
    #[error("module {module:?}: unresolved prerequisite {reference:?}")]
    UnknownReference { module: String, reference: String },

    #[error("module {module:?}: job index {index} is declared more than once")]
    DuplicateJobIndex { module: String, index: u32 },

    #[error("module {0:?} is declared by more than one plan")]
    DuplicateModule(String),

    #[error("module {module:?} depends on unknown module {dependency:?}")]
    UnknownModule { module: String, dependency: String },

    /// The dependency graph is not acyclic. `nodes` never reached zero in-degree.
    #[error("dependency cycle detected in {scope}: {}", nodes.join(", "))]
    CycleDetected { scope: String, nodes: Vec<String> },

    #[error("invalid transition for job {job:?}: {from} -> {to}")]
    InvalidTransition { job: String, from: Status, to: Status },

    #[error("job {job:?} failed after {retries} retries")]
    RetryExhausted { job: String, retries: u32 },

    #[error("module not found: {0}")]
    ModuleNotFound(String),

    #[error("job not found: {module}/{job}")]
    JobNotFound { module: String, job: String },

    #[error("job {job:?} has no task {task}")]
    TaskNotFound { job: String, task: usize },

    #[error("no pending jobs remain")]
    NoPendingJobs,

    #[error("unsupported schedule version: {found:?}")]
    UnsupportedVersion { found: String },

    #[error("I/O failure on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed schedule document: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MortyError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MortyError::Persistence {
            path: path.into(),
            source,
        }
    }
}
