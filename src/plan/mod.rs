//! Plan documents: types, parsing, discovery, dependency graphs and write-back.

pub mod discovery;
pub mod graph;
pub mod labels;
pub mod parser;
pub mod references;
pub mod types;
pub mod writeback;

pub use discovery::PlanSource;
pub use graph::{Dependency, DependencyGraph};
pub use parser::PlanParser;
pub use references::JobRef;
pub use types::{DebugLog, Job, Plan, TaskItem};
