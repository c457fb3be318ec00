//! Map tokenized sections onto plan fields.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{MortyError, Result};
use crate::parser::fields;
use crate::parser::{MarkdownDocument, Section};
use crate::plan::labels::{
    COMPLETION, DEBUG_LOGS, GOAL, NON_TASK_BLOCKS, OVERVIEW, PREREQUISITES, TASKS, VALIDATORS,
};
use crate::plan::{Job, TaskItem};

static JOB_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^job\s*(\d+)\s*[:：]\s*(.+)$").expect("job heading pattern"));

/// Plan name from the first H1, without a leading `Plan:` label.
pub fn extract_plan_name(doc: &MarkdownDocument) -> Option<String> {
    let title = doc.sections.iter().find(|s| s.level == 1)?.title.trim();
    let name = ["plan:", "plan：", "计划:", "计划："]
        .iter()
        .find_map(|prefix| {
            title
                .get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &title[prefix.len()..])
        })
        .unwrap_or(title);
    Some(name.trim().to_string())
}

/// Text holding the module-level bold fields.
///
/// Falls back to the whole document when there is no overview section.
pub fn overview_text(doc: &MarkdownDocument, raw: &str) -> String {
    match doc
        .sections
        .iter()
        .position(|s| {
            s.level >= 2
                && fields::title_matches(&s.title, OVERVIEW)
                && !JOB_HEADING.is_match(s.title.trim())
        })
    {
        Some(index) => doc.subtree_text(index),
        None => raw.to_string(),
    }
}

/// `(index, name)` when `title` is a job heading.
pub fn parse_job_heading(title: &str, source: &str) -> Result<Option<(u32, String)>> {
    let Some(caps) = JOB_HEADING.captures(title.trim()) else {
        return Ok(None);
    };
    let index = caps[1].parse::<u32>().map_err(|e| MortyError::Parse {
        source_file: source.to_string(),
        message: format!("job heading {title:?} has an unusable index: {e}"),
    })?;
    Ok(Some((index, caps[2].trim().to_string())))
}

/// Every job section of the document, in document order.
pub fn extract_jobs(doc: &MarkdownDocument, source: &str) -> Result<Vec<Job>> {
    let mut jobs = Vec::new();
    for (i, section) in doc.sections.iter().enumerate() {
        if section.level < 2 {
            continue;
        }
        if let Some((index, name)) = parse_job_heading(&section.title, source)? {
            jobs.push(extract_job(doc, i, index, name));
        }
    }
    Ok(jobs)
}

fn extract_job(doc: &MarkdownDocument, section_index: usize, index: u32, name: String) -> Job {
    let section = &doc.sections[section_index];
    let subsections = doc.descendants(section_index);
    let text = doc.subtree_text(section_index);

    let goal = match find_subsection(subsections, GOAL) {
        Some(sub) => sub.trimmed_content(),
        None => fields::bold_field(&text, GOAL).unwrap_or_default(),
    };

    let prerequisites = match find_subsection(subsections, PREREQUISITES) {
        Some(sub) => Some(fields::list_items(&sub.content)),
        None => fields::list_field(&text, PREREQUISITES),
    };

    let task_lines = match find_subsection(subsections, TASKS) {
        Some(sub) => fields::checkbox_items(&sub.content),
        None => match fields::field_block(&text, TASKS) {
            Some(block) => fields::checkbox_items(&block),
            None => fields::checkbox_items(&fields::strip_fields(&section.content, NON_TASK_BLOCKS)),
        },
    };
    let tasks = task_lines
        .into_iter()
        .enumerate()
        .map(|(i, (completed, description))| TaskItem {
            index: i + 1,
            description,
            completed,
        })
        .collect();

    let validators = match find_subsection(subsections, VALIDATORS) {
        Some(sub) => fields::validator_items(&sub.content),
        None => fields::field_block(&text, VALIDATORS)
            .map(|block| fields::validator_items(&block))
            .unwrap_or_default(),
    };

    let debug_logs = match find_subsection(subsections, DEBUG_LOGS) {
        Some(sub) => fields::debug_logs(&sub.content),
        None => fields::field_block(&text, DEBUG_LOGS)
            .map(|block| fields::debug_logs(&block))
            .unwrap_or_default(),
    };

    let completion_status = match find_subsection(subsections, COMPLETION) {
        Some(sub) => Some(sub.trimmed_content()),
        None => fields::bold_field(&text, COMPLETION),
    }
    .filter(|s| !s.is_empty());

    Job {
        index,
        name,
        goal,
        prerequisites,
        tasks,
        validators,
        debug_logs,
        completion_status,
    }
}

fn find_subsection<'a>(subsections: &'a [Section], labels: &[&str]) -> Option<&'a Section> {
    subsections
        .iter()
        .find(|s| fields::title_matches(&s.title, labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_plan_name() {
        let doc = MarkdownDocument::parse("intro\n# Plan: Storage Layer\n## x");
        assert_eq!(extract_plan_name(&doc).as_deref(), Some("Storage Layer"));

        let doc = MarkdownDocument::parse("# PLAN：存储\n");
        assert_eq!(extract_plan_name(&doc).as_deref(), Some("存储"));

        let doc = MarkdownDocument::parse("# Just A Title\n");
        assert_eq!(extract_plan_name(&doc).as_deref(), Some("Just A Title"));

        assert_eq!(extract_plan_name(&MarkdownDocument::parse("## no h1")), None);
    }

    #[test]
    fn test_job_heading_pattern() {
        assert_eq!(
            parse_job_heading("Job 1: Setup", "a.md").unwrap(),
            Some((1, "Setup".to_string()))
        );
        assert_eq!(
            parse_job_heading("job3：初始化", "a.md").unwrap(),
            Some((3, "初始化".to_string()))
        );
        assert_eq!(parse_job_heading("Jobs overview", "a.md").unwrap(), None);
        assert_eq!(parse_job_heading("Job 2 Setup", "a.md").unwrap(), None);
        assert!(parse_job_heading("Job 99999999999: big", "a.md").is_err());
    }

    #[test]
    fn test_overview_fallback_to_whole_text() {
        let raw = "# Plan\n**Dependencies**: a\n";
        let doc = MarkdownDocument::parse(raw);
        assert_eq!(overview_text(&doc, raw), raw);

        let raw = "# Plan\n## 模块概述\n**依赖模块**: a\n## Job 1: x\n";
        let doc = MarkdownDocument::parse(raw);
        assert_eq!(overview_text(&doc, raw), "**依赖模块**: a");
    }
}
