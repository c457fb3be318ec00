/// Format version written into every compiled schedule document.
pub const SCHEDULE_VERSION: &str = "2.0";

/// Maximum number of automatic re-attempts before a job becomes FAILED.
pub const MAX_RETRIES: u32 = 3;

/// Dependency value meaning "depends on every other node".
pub const ALL_DEPENDENCIES: &str = "__ALL__";

/// List values that declare an explicitly empty list.
pub const NONE_TOKENS: &[&str] = &["none", "无"];

/// Default locations, relative to the project root.
pub mod paths {
    pub const WORK_DIR: &str = ".morty";
    pub const PLAN_DIR: &str = "plan";
    pub const STATUS_FILE: &str = "status.json";
    pub const CONFIG_FILE: &str = "config.toml";
}
