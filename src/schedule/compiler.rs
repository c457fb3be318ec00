//! Compile parsed plans into a persisted [`Schedule`].
//!
//! This is the one place where execution order is decided. Modules are
//! sorted by their declared dependencies, the jobs of each module by their
//! same-module prerequisites, and every job gets its `global_index` here.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::config::Config;
use crate::error::{MortyError, Result};
use crate::models::constants::{ALL_DEPENDENCIES, SCHEDULE_VERSION};
use crate::models::schedule::{
    DebugLogEntry, GlobalState, JobState, ModuleState, Schedule, Status, TaskState,
};
use crate::plan::{DebugLog, Dependency, DependencyGraph, Job, JobRef, PlanParser, PlanSource};

/// Graph key for a job: its declared index. Sorting ties break numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct JobKey(u32);

impl fmt::Display for JobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job_{}", self.0)
    }
}

impl From<&DebugLog> for DebugLogEntry {
    fn from(log: &DebugLog) -> Self {
        DebugLogEntry {
            id: log.id.clone(),
            phenomenon: log.phenomenon.clone(),
            reproduction: log.reproduction.clone(),
            hypotheses: log.hypotheses.clone(),
            verification_todo: log.verification_todo.clone(),
            fix: log.fix.clone(),
            progress: log.progress.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduleCompiler {
    parser: PlanParser,
}

impl ScheduleCompiler {
    pub fn new(config: &Config) -> Self {
        Self {
            parser: PlanParser::new(config),
        }
    }

    /// Discover, parse and compile every plan in the plan directory.
    pub fn compile_dir(&self) -> Result<Schedule> {
        let sources = self.parser.discover()?;
        self.compile(sources)
    }

    /// Compile already-parsed plans.
    ///
    /// Nothing is returned unless both graph levels are acyclic and every
    /// reference resolves.
    pub fn compile(&self, sources: Vec<PlanSource>) -> Result<Schedule> {
        let names = module_names(&sources)?;

        let module_graph = DependencyGraph::build(
            "modules",
            sources
                .iter()
                .map(|source| {
                    resolve_module_dependencies(source, &names)
                        .map(|deps| (source.module_name.clone(), deps))
                })
                .collect::<Result<Vec<_>>>()?,
        )?;
        let module_order = module_graph.topological_sort()?;
        let rank: HashMap<&str, usize> = module_order
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let by_name: HashMap<&str, &PlanSource> = sources
            .iter()
            .map(|s| (s.module_name.as_str(), s))
            .collect();

        let now = Utc::now();
        let mut modules = Vec::with_capacity(module_order.len());
        let mut global_index = 0;

        for (module_index, name) in module_order.iter().enumerate() {
            let source = by_name[name.as_str()];
            let job_order = order_jobs(source, &names, &by_name, &rank)?;

            let mut jobs = Vec::with_capacity(job_order.len());
            for (job_index, job) in job_order.into_iter().enumerate() {
                jobs.push(job_state(job, job_index, global_index));
                global_index += 1;
            }

            modules.push(ModuleState {
                index: module_index,
                name: source.module_name.clone(),
                display_name: source.display_name().to_string(),
                source_file: source.source_file.clone(),
                status: Status::Pending,
                dependencies: normalized_dependencies(source, &names),
                jobs,
                created_at: now,
                updated_at: now,
            });
        }

        tracing::info!(
            modules = modules.len(),
            jobs = global_index,
            "compiled schedule"
        );

        Ok(Schedule {
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
        })
    }
}

/// Lookup from module name or display name to module name.
fn module_names(sources: &[PlanSource]) -> Result<HashMap<String, String>> {
    let mut seen = BTreeSet::new();
    for source in sources {
        if !seen.insert(source.module_name.as_str()) {
            return Err(MortyError::DuplicateModule(source.module_name.clone()));
        }
    }

    let mut names = HashMap::new();
    for source in sources {
        names
            .entry(source.display_name().to_string())
            .or_insert_with(|| source.module_name.clone());
    }
    // Module names win over a display name that happens to collide.
    for source in sources {
        names.insert(source.module_name.clone(), source.module_name.clone());
    }
    Ok(names)
}

fn resolve_module_dependencies(
    source: &PlanSource,
    names: &HashMap<String, String>,
) -> Result<Vec<Dependency<String>>> {
    source
        .plan
        .dependencies()
        .iter()
        .map(|dep| {
            if dep == ALL_DEPENDENCIES {
                return Ok(Dependency::All);
            }
            names
                .get(dep.as_str())
                .map(|name| Dependency::Node(name.clone()))
                .ok_or_else(|| MortyError::UnknownModule {
                    module: source.module_name.clone(),
                    dependency: dep.clone(),
                })
        })
        .collect()
}

fn normalized_dependencies(source: &PlanSource, names: &HashMap<String, String>) -> Vec<String> {
    source
        .plan
        .dependencies()
        .iter()
        .map(|dep| names.get(dep.as_str()).unwrap_or(dep).clone())
        .collect()
}

/// Validate one module's jobs and return them in execution order.
fn order_jobs<'a>(
    source: &'a PlanSource,
    names: &HashMap<String, String>,
    by_name: &HashMap<&str, &PlanSource>,
    rank: &HashMap<&str, usize>,
) -> Result<Vec<&'a Job>> {
    let module = source.module_name.as_str();
    let mut jobs: BTreeMap<JobKey, &Job> = BTreeMap::new();
    for job in &source.plan.jobs {
        if jobs.insert(JobKey(job.index), job).is_some() {
            return Err(MortyError::DuplicateJobIndex {
                module: module.to_string(),
                index: job.index,
            });
        }
    }

    let mut nodes = Vec::with_capacity(jobs.len());
    for (key, job) in &jobs {
        let mut deps = Vec::new();
        for raw in job.prerequisites() {
            if raw.trim() == ALL_DEPENDENCIES {
                deps.push(Dependency::All);
                continue;
            }
            let unknown = || MortyError::UnknownReference {
                module: module.to_string(),
                reference: raw.clone(),
            };
            match JobRef::parse(raw) {
                JobRef::SameModule(index) => {
                    if !jobs.contains_key(&JobKey(index)) {
                        return Err(unknown());
                    }
                    deps.push(Dependency::Node(JobKey(index)));
                }
                JobRef::CrossModule {
                    module: target,
                    index,
                } => {
                    let target = names.get(&target).ok_or_else(unknown)?;
                    let plan = &by_name[target.as_str()].plan;
                    if plan.job_by_index(index).is_none() {
                        return Err(unknown());
                    }
                    if target == module {
                        deps.push(Dependency::Node(JobKey(index)));
                    } else if rank[target.as_str()] > rank[module] {
                        tracing::warn!(
                            module,
                            job = %key,
                            reference = %raw,
                            "prerequisite points at a module scheduled later"
                        );
                    }
                }
                JobRef::FreeText(text) => {
                    tracing::debug!(module, job = %key, prerequisite = %text, "free-text prerequisite");
                }
            }
        }
        nodes.push((*key, deps));
    }

    let graph = DependencyGraph::build(format!("module {module}"), nodes)?;
    Ok(graph
        .topological_sort()?
        .into_iter()
        .filter_map(|key| jobs.get(&key).copied())
        .collect())
}

fn job_state(job: &Job, index: usize, global_index: usize) -> JobState {
    let now = Utc::now();
    JobState {
        index,
        global_index,
        name: job.name.clone(),
        status: Status::Pending,
        prerequisites: job.prerequisites().to_vec(),
        tasks_total: job.tasks.len(),
        tasks_completed: 0,
        loop_count: 0,
        retry_count: 0,
        interrupted: false,
        failure_reason: None,
        tasks: job
            .tasks
            .iter()
            .map(|task| TaskState {
                index: task.index,
                status: Status::Pending,
                description: task.description.clone(),
                updated_at: now,
            })
            .collect(),
        debug_logs: job.debug_logs.iter().map(DebugLogEntry::from).collect(),
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::parser::parse_plan_content;
    use std::path::Path;

    fn source(module: &str, content: &str) -> PlanSource {
        PlanSource {
            module_name: module.to_string(),
            source_file: format!("{module}.md"),
            plan: parse_plan_content(content, module).unwrap(),
        }
    }

    fn compiler() -> ScheduleCompiler {
        ScheduleCompiler::new(&Config::rooted_at(Path::new("/project")))
    }

    fn order(schedule: &Schedule) -> Vec<String> {
        schedule
            .jobs_in_order()
            .iter()
            .map(|(pos, job)| format!("{}/{}", schedule.modules[pos.module_index].name, job.name))
            .collect()
    }

    const CONFIG_PLAN: &str = "# Plan: Configuration\n**Dependencies**: none\n## Job 1: Defaults\n- [ ] a\n- [ ] b\n## Job 2: Env\n**Prerequisites**: job_1\n";
    const STORE_PLAN: &str = "# Plan: Store\n**Dependencies**: Configuration\n## Job 2: Save\n**Prerequisites**: job_1\n## Job 1: Load\n**Prerequisites**: config:job_2\n- [ ] read\n";

    #[test]
    fn test_compile_orders_modules_and_jobs() {
        let schedule = compiler()
            .compile(vec![source("store", STORE_PLAN), source("config", CONFIG_PLAN)])
            .unwrap();

        assert_eq!(schedule.version, "2.0");
        assert_eq!(
            order(&schedule),
            vec!["config/Defaults", "config/Env", "store/Load", "store/Save"]
        );
        assert_eq!(schedule.global.total_modules, 2);
        assert_eq!(schedule.global.total_jobs, 4);
        assert_eq!(schedule.global.status, Status::Pending);

        let store = &schedule.modules[1];
        assert_eq!(store.index, 1);
        assert_eq!(store.display_name, "Store");
        assert_eq!(store.source_file, "store.md");
        assert_eq!(store.dependencies, vec!["config"]);
    }

    #[test]
    fn test_global_indices_strictly_increase() {
        let schedule = compiler()
            .compile(vec![source("config", CONFIG_PLAN), source("store", STORE_PLAN)])
            .unwrap();
        let mut expected = 0;
        for module in &schedule.modules {
            for (i, job) in module.jobs.iter().enumerate() {
                assert_eq!(job.index, i);
                assert_eq!(job.global_index, expected);
                expected += 1;
            }
        }
    }

    #[test]
    fn test_jobs_initialised_pending() {
        let schedule = compiler().compile(vec![source("config", CONFIG_PLAN)]).unwrap();
        let job = &schedule.modules[0].jobs[0];
        assert_eq!(job.status, Status::Pending);
        assert_eq!(job.tasks_total, 2);
        assert_eq!(job.tasks_completed, 0);
        assert_eq!(job.loop_count, 0);
        assert_eq!(job.retry_count, 0);
        assert!(!job.interrupted);
        assert!(job.tasks.iter().all(|t| t.status == Status::Pending));
        assert_eq!(schedule.modules[0].jobs[1].prerequisites, vec!["job_1"]);
    }

    #[test]
    fn test_compile_is_deterministic() {
        let a = compiler()
            .compile(vec![source("store", STORE_PLAN), source("config", CONFIG_PLAN)])
            .unwrap();
        let b = compiler()
            .compile(vec![source("config", CONFIG_PLAN), source("store", STORE_PLAN)])
            .unwrap();
        assert_eq!(order(&a), order(&b));
    }

    #[test]
    fn test_module_cycle_fails_whole_compile() {
        let a = source("a", "# Plan: A\n**Dependencies**: b\n## Job 1: x\n");
        let b = source("b", "# Plan: B\n**Dependencies**: a\n## Job 1: y\n");
        match compiler().compile(vec![a, b]) {
            Err(MortyError::CycleDetected { nodes, .. }) => assert_eq!(nodes, vec!["a", "b"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_job_cycle_names_jobs() {
        let plan = "# Plan: A\n## Job 1: x\n**Prerequisites**: job_2\n## Job 2: y\n**Prerequisites**: job_1\n";
        match compiler().compile(vec![source("a", plan)]) {
            Err(MortyError::CycleDetected { scope, nodes }) => {
                assert_eq!(scope, "module a");
                assert_eq!(nodes, vec!["job_1", "job_2"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_references_rejected() {
        let missing_job = "# Plan: A\n## Job 1: x\n**Prerequisites**: job_9\n";
        assert!(matches!(
            compiler().compile(vec![source("a", missing_job)]),
            Err(MortyError::UnknownReference { reference, .. }) if reference == "job_9"
        ));

        let missing_cross = "# Plan: A\n## Job 1: x\n**Prerequisites**: config:job_7\n";
        assert!(matches!(
            compiler().compile(vec![source("a", missing_cross), source("config", CONFIG_PLAN)]),
            Err(MortyError::UnknownReference { .. })
        ));

        let missing_module = "# Plan: A\n## Job 1: x\n**Prerequisites**: nowhere:job_1\n";
        assert!(matches!(
            compiler().compile(vec![source("a", missing_module)]),
            Err(MortyError::UnknownReference { .. })
        ));
    }

    #[test]
    fn test_unknown_module_dependency_rejected() {
        let plan = "# Plan: A\n**Dependencies**: ghost\n## Job 1: x\n";
        assert!(matches!(
            compiler().compile(vec![source("a", plan)]),
            Err(MortyError::UnknownModule { dependency, .. }) if dependency == "ghost"
        ));
    }

    #[test]
    fn test_duplicates_rejected() {
        let plan = "# Plan: A\n## Job 1: x\n## Job 1: again\n";
        assert!(matches!(
            compiler().compile(vec![source("a", plan)]),
            Err(MortyError::DuplicateJobIndex { index: 1, .. })
        ));

        assert!(matches!(
            compiler().compile(vec![source("a", CONFIG_PLAN), source("a", CONFIG_PLAN)]),
            Err(MortyError::DuplicateModule(name)) if name == "a"
        ));
    }

    #[test]
    fn test_all_sentinel_runs_module_last() {
        let e2e = source("e2e", "# Plan: E2E\n**Dependencies**: __ALL__\n## Job 1: run\n");
        let schedule = compiler()
            .compile(vec![e2e, source("store", STORE_PLAN), source("config", CONFIG_PLAN)])
            .unwrap();
        let names: Vec<_> = schedule.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["config", "store", "e2e"]);
    }

    #[test]
    fn test_free_text_prerequisites_do_not_order() {
        let plan = "# Plan: A\n## Job 2: b\n**Prerequisites**: a working database\n## Job 1: a\n";
        let schedule = compiler().compile(vec![source("a", plan)]).unwrap();
        assert_eq!(order(&schedule), vec!["a/a", "a/b"]);
    }

    #[test]
    fn test_debug_logs_copied() {
        let plan = "# Plan: A\n## Job 1: a\n**Debug Logs**:\n- debug1: p, r, h, v, f, open\n";
        let schedule = compiler().compile(vec![source("a", plan)]).unwrap();
        let logs = &schedule.modules[0].jobs[0].debug_logs;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].progress, "open");
    }
}
