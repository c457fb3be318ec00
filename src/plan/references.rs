//! Prerequisite references between jobs.

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static SAME_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^job_(\d+)(?:\s*[-–]\s*.*)?$").expect("same-module reference pattern")
});

static CROSS_MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([^\s:：]+)\s*[:：]\s*job_(\d+)(?:\s*[-–]\s*.*)?$")
        .expect("cross-module reference pattern")
});

/// A parsed prerequisite entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobRef {
    /// `job_N`, optionally followed by ` - description`.
    SameModule(u32),
    /// `module:job_N`.
    CrossModule { module: String, index: u32 },
    /// Anything else; kept for display, ignored for ordering.
    FreeText(String),
}

impl JobRef {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_matches('`');
        if let Some(caps) = SAME_MODULE.captures(raw) {
            if let Ok(index) = caps[1].parse() {
                return JobRef::SameModule(index);
            }
        }
        if let Some(caps) = CROSS_MODULE.captures(raw) {
            if let Ok(index) = caps[2].parse() {
                return JobRef::CrossModule {
                    module: caps[1].to_string(),
                    index,
                };
            }
        }
        JobRef::FreeText(raw.to_string())
    }
}

impl fmt::Display for JobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobRef::SameModule(index) => write!(f, "job_{index}"),
            JobRef::CrossModule { module, index } => write!(f, "{module}:job_{index}"),
            JobRef::FreeText(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_module_forms() {
        assert_eq!(JobRef::parse("job_1"), JobRef::SameModule(1));
        assert_eq!(JobRef::parse("Job_12 - set up schema"), JobRef::SameModule(12));
        assert_eq!(JobRef::parse("`job_3`"), JobRef::SameModule(3));
    }

    #[test]
    fn test_cross_module_forms() {
        assert_eq!(
            JobRef::parse("config:job_2"),
            JobRef::CrossModule {
                module: "config".to_string(),
                index: 2
            }
        );
        assert_eq!(
            JobRef::parse("parser：job_1 - tokens").to_string(),
            "parser:job_1"
        );
    }

    #[test]
    fn test_free_text() {
        assert_eq!(
            JobRef::parse("database is reachable"),
            JobRef::FreeText("database is reachable".to_string())
        );
        assert!(matches!(JobRef::parse("job_x"), JobRef::FreeText(_)));
    }
}
