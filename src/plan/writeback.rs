//! Write observed progress back into plan text.
//!
//! Both operations edit only the lines they own; every other byte of the
//! document, line endings included, is preserved.

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;

use super::labels::DEBUG_LOGS;
use super::parser::{parse_job_heading, parse_plan_content};
use super::DebugLog;
use crate::error::{MortyError, Result};
use crate::parser::{fields, MarkdownDocument};

static CHECKBOX_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*[-*+]\s*\[)([ xX])(\]\s*)(.*)$").expect("checkbox mark pattern"));

/// Set the checkbox marks of job `job_index`'s task list to `states`.
///
/// `states[i]` applies to the task with 1-based index `i + 1`. Tasks beyond
/// the end of `states` keep their current mark.
pub fn apply_task_states(text: &str, job_index: u32, states: &[bool]) -> Result<String> {
    let plan = parse_plan_content(text, "<writeback>")?;
    let job = plan
        .job_by_index(job_index)
        .ok_or_else(|| missing_job(job_index))?;
    if states.len() > job.tasks.len() {
        return Err(MortyError::TaskNotFound {
            job: job.name.clone(),
            task: states.len(),
        });
    }

    let doc = MarkdownDocument::parse(text);
    let mut lines = split_lines(text);
    let range = job_line_range(&doc, job_index, lines.len())?;

    // Task lines are matched in order by description, which is exactly how
    // the parser produced them.
    let mut pending = job.tasks.iter().zip(states).peekable();
    for line in &mut lines[range] {
        let Some(&(task, &done)) = pending.peek() else {
            break;
        };
        let (body, ending) = split_ending(line);
        let Some(caps) = CHECKBOX_MARK.captures(body) else {
            continue;
        };
        if caps[4].trim() != task.description {
            continue;
        }
        let current = caps[2].eq_ignore_ascii_case("x");
        if current != done {
            let mark = if done { "x" } else { " " };
            *line = format!("{}{}{}{}{}", &caps[1], mark, &caps[3], &caps[4], ending);
        }
        pending.next();
    }

    Ok(lines.concat())
}

/// Append `log` to job `job_index`'s debug-log list.
///
/// The list is found as a debug-log subsection or bold block; a lone
/// "none" entry is replaced. Without either, a new list is added at the end
/// of the job.
pub fn append_debug_log(text: &str, job_index: u32, log: &DebugLog) -> Result<String> {
    let doc = MarkdownDocument::parse(text);
    let mut lines = split_lines(text);
    let job_range = job_line_range(&doc, job_index, lines.len())?;
    let entry = fields::format_debug_log(log);

    let block = debug_subsection_range(&doc, job_index, lines.len())
        .or_else(|| debug_block_range(&mut lines, job_range.clone()));

    match block {
        Some(block) => {
            // Drop a "none" placeholder, then insert after the last entry.
            let mut end = block.end;
            let mut i = block.start;
            while i < end {
                if fields::is_none_token(lines[i].trim().trim_start_matches(['-', '*']).trim())
                    && !lines[i].trim().is_empty()
                {
                    lines.remove(i);
                    end -= 1;
                } else {
                    i += 1;
                }
            }
            let insert_at = (block.start..end)
                .rev()
                .find(|&i| !lines[i].trim().is_empty())
                .map(|i| i + 1)
                .unwrap_or(block.start);
            insert_line(&mut lines, insert_at, &entry);
        }
        None => {
            let insert_at = (job_range.start..job_range.end)
                .rev()
                .find(|&i| !lines[i].trim().is_empty())
                .map(|i| i + 1)
                .unwrap_or(job_range.end);
            // Jobs written with subsections get a subsection, others a bold block.
            let header = match job_section(&doc, job_index)
                .and_then(|i| doc.descendants(i).first())
            {
                Some(sub) => format!("{} Debug Logs", "#".repeat(sub.level as usize)),
                None => "**Debug Logs**:".to_string(),
            };
            insert_line(&mut lines, insert_at, "");
            insert_line(&mut lines, insert_at + 1, &header);
            insert_line(&mut lines, insert_at + 2, &entry);
        }
    }

    Ok(lines.concat())
}

fn missing_job(job_index: u32) -> MortyError {
    MortyError::Parse {
        source_file: "<writeback>".to_string(),
        message: format!("no job with index {job_index}"),
    }
}

fn job_section(doc: &MarkdownDocument, job_index: u32) -> Option<usize> {
    doc.sections.iter().position(|s| {
        s.level >= 2
            && matches!(parse_job_heading(&s.title, "<writeback>"), Ok(Some((i, _))) if i == job_index)
    })
}

/// Lines after the job heading up to the next heading of the same or higher level.
fn job_line_range(doc: &MarkdownDocument, job_index: u32, total: usize) -> Result<Range<usize>> {
    let index = job_section(doc, job_index).ok_or_else(|| missing_job(job_index))?;
    Ok(section_line_range(doc, index, doc.subtree_end(index), total))
}

fn section_line_range(
    doc: &MarkdownDocument,
    index: usize,
    end_section: usize,
    total: usize,
) -> Range<usize> {
    let end = doc
        .sections
        .get(end_section)
        .map_or(total, |s| s.line)
        .min(total);
    let start = (doc.sections[index].line + 1).min(end);
    start..end
}

fn debug_subsection_range(
    doc: &MarkdownDocument,
    job_index: u32,
    total: usize,
) -> Option<Range<usize>> {
    let job = job_section(doc, job_index)?;
    let offset = doc
        .descendants(job)
        .iter()
        .position(|s| fields::title_matches(&s.title, DEBUG_LOGS))?;
    let index = job + 1 + offset;
    Some(section_line_range(doc, index, index + 1, total))
}

/// Body lines of a bold debug-log label inside `range`. An inline "none"
/// after the label is cut from the label line.
fn debug_block_range(lines: &mut [String], range: Range<usize>) -> Option<Range<usize>> {
    let end = range.end;
    let label_line = (range.start..end).find(|&i| {
        fields::bold_label(&lines[i])
            .is_some_and(|(label, _)| fields::label_matches(label, DEBUG_LOGS))
    })?;

    if let Some((_, inline)) = fields::bold_label(&lines[label_line]) {
        if fields::is_none_token(inline) {
            let (body, ending) = split_ending(&lines[label_line]);
            let replacement = body
                .rfind(inline)
                .map(|cut| format!("{}{ending}", body[..cut].trim_end()));
            if let Some(replacement) = replacement {
                lines[label_line] = replacement;
            }
        }
    }

    let start = label_line + 1;
    let mut stop = start;
    let mut gap = false;
    for (i, line) in lines.iter().enumerate().take(end).skip(start) {
        if fields::is_block_boundary(line) {
            break;
        }
        if line.trim().is_empty() {
            gap |= stop > start;
            continue;
        }
        if gap && !fields::is_list_item(line) {
            break;
        }
        stop = i + 1;
    }
    Some(start..stop)
}

fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(String::from).collect()
}

fn split_ending(line: &str) -> (&str, &str) {
    let body = line.trim_end_matches(['\n', '\r']);
    (body, &line[body.len()..])
}

/// Insert `content` as a new line at `at`, terminating the previous line
/// when it was the unterminated last line.
fn insert_line(lines: &mut Vec<String>, at: usize, content: &str) {
    let at = at.min(lines.len());
    let ending = lines
        .iter()
        .find_map(|l| l.ends_with("\r\n").then_some("\r\n"))
        .unwrap_or("\n");
    if at > 0 && !lines[at - 1].ends_with('\n') {
        lines[at - 1].push_str(ending);
    }
    lines.insert(at, format!("{content}{ending}"));
}
