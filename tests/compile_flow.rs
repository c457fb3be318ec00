//! Integration tests for compiling a plan directory into a persisted schedule

use morty::fs::{StateStore, WorkDir};
use morty::models::schedule::Status;
use morty::schedule::ScheduleCompiler;
use morty::{Config, MortyError};
use std::fs;
use tempfile::TempDir;

const CONFIG_PLAN: &str = r#"# Plan: Configuration

## Overview

**Responsibility**: load settings from disk and the environment
**Dependencies**: none
**Dependents**: Storage, CLI

## Job 1: Defaults

**Goal**: sensible defaults

**Tasks**:
- [ ] define the config struct
- [ ] implement Default

**Validators**:
- [ ] defaults round-trip through TOML

## Job 2: Environment overrides

**Prerequisites**: job_1

**Tasks**:
- [ ] read MORTY_* variables
"#;

const STORAGE_PLAN: &str = r#"# Plan: Storage

**Dependencies**: Configuration

## Job 1: Atomic save

**Prerequisites**: configuration:job_1

- [ ] write to a temp file
- [ ] rename into place

## Job 2: Locked update

**Prerequisites**: job_1
"#;

const CLI_PLAN: &str = r#"# Plan: CLI

**Dependencies**: __ALL__

## Job 1: Subcommands
"#;

fn project(plans: &[(&str, &str)]) -> (TempDir, Config) {
    let temp = TempDir::new().unwrap();
    let config = Config::rooted_at(temp.path());
    WorkDir::new(&config).initialize().unwrap();
    for (file, content) in plans {
        fs::write(config.plan_dir.join(file), content).unwrap();
    }
    (temp, config)
}

#[test]
fn test_compile_and_persist() {
    let (_temp, config) = project(&[
        ("cli.md", CLI_PLAN),
        ("storage.md", STORAGE_PLAN),
        ("configuration.md", CONFIG_PLAN),
        ("README.md", "# Plans\n"),
    ]);

    let schedule = ScheduleCompiler::new(&config).compile_dir().unwrap();
    let store = StateStore::new(&config);
    store.save(&schedule).unwrap();
    let loaded = store.load().unwrap();
    assert_eq!(loaded, schedule);

    let modules: Vec<&str> = loaded.modules.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(modules, vec!["configuration", "storage", "cli"]);

    let jobs: Vec<(usize, &str)> = loaded
        .modules
        .iter()
        .flat_map(|m| &m.jobs)
        .map(|j| (j.global_index, j.name.as_str()))
        .collect();
    assert_eq!(
        jobs,
        vec![
            (0, "Defaults"),
            (1, "Environment overrides"),
            (2, "Atomic save"),
            (3, "Locked update"),
            (4, "Subcommands"),
        ]
    );

    let defaults = &loaded.modules[0].jobs[0];
    assert_eq!(defaults.tasks_total, 2);
    assert_eq!(defaults.status, Status::Pending);
    assert_eq!(loaded.modules[0].display_name, "Configuration");
    assert_eq!(loaded.modules[1].dependencies, vec!["configuration"]);
}

#[test]
fn test_cycle_aborts_without_schedule() {
    let (_temp, config) = project(&[
        ("a.md", "# Plan: A\n**Dependencies**: b\n## Job 1: x\n"),
        ("b.md", "# Plan: B\n**Dependencies**: a\n## Job 1: y\n"),
    ]);

    let err = ScheduleCompiler::new(&config).compile_dir().unwrap_err();
    assert!(matches!(err, MortyError::CycleDetected { ref nodes, .. } if nodes == &["a", "b"]));
    assert!(!StateStore::new(&config).exists());
}

#[test]
fn test_unknown_cross_module_reference_aborts() {
    let broken = STORAGE_PLAN.replace("configuration:job_1", "configuration:job_9");
    let (_temp, config) = project(&[("configuration.md", CONFIG_PLAN), ("storage.md", broken.as_str())]);

    assert!(matches!(
        ScheduleCompiler::new(&config).compile_dir(),
        Err(MortyError::UnknownReference { .. })
    ));
}

#[test]
fn test_missing_plan_dir() {
    let temp = TempDir::new().unwrap();
    let config = Config::rooted_at(temp.path());
    assert!(matches!(
        ScheduleCompiler::new(&config).compile_dir(),
        Err(MortyError::Persistence { .. })
    ));
}

#[test]
fn test_order_is_stable_across_projects() {
    let plans = [("storage.md", STORAGE_PLAN), ("configuration.md", CONFIG_PLAN)];
    let (_a, first) = project(&plans);
    let (_b, second) = project(&plans);

    let order = |config: &Config| -> Vec<String> {
        ScheduleCompiler::new(config)
            .compile_dir()
            .unwrap()
            .jobs_in_order()
            .iter()
            .map(|(_, job)| job.name.clone())
            .collect()
    };
    assert_eq!(order(&first), order(&second));
}
