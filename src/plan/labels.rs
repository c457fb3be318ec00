//! Field labels recognised in plan documents, English first.

pub const RESPONSIBILITY: &[&str] = &["Responsibility", "模块职责"];
pub const RESEARCH: &[&str] = &["Research References", "Research", "对应 Research"];
pub const DEPENDENCIES: &[&str] = &["Dependencies", "依赖模块"];
pub const DEPENDENTS: &[&str] = &["Dependents", "被依赖模块"];

pub const OVERVIEW: &[&str] = &["module overview", "overview", "模块概述"];
pub const GOAL: &[&str] = &["Goal", "目标"];
pub const PREREQUISITES: &[&str] = &["Prerequisites", "前置条件"];
pub const TASKS: &[&str] = &["Tasks", "Todo 列表", "任务列表"];
pub const VALIDATORS: &[&str] = &["Validators", "Validator", "验证器"];
pub const DEBUG_LOGS: &[&str] = &["Debug Logs", "Debug", "调试日志"];
pub const COMPLETION: &[&str] = &["Completion Status", "完成状态"];

/// Bold blocks that never hold the job's own task checkboxes.
pub const NON_TASK_BLOCKS: &[&str] = &["Validators", "Validator", "验证器", "Debug Logs", "调试日志"];
