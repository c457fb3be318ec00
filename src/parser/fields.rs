//! Typed field extractors over a section body.
//!
//! Plan documents encode structure as bold labels (`**Goal**: ...`), bullet
//! lists and checkbox lists. Each function here reads one of those shapes and
//! knows nothing about plans or jobs.

use regex::Regex;
use std::sync::LazyLock;

use crate::models::constants::NONE_TOKENS;
use crate::plan::DebugLog;

static CHECKBOX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s*\[([ xX])\]\s*(.*)$").expect("checkbox pattern"));

static DEBUG_LOG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[-*+]\s*((?:debug|explore)\d+)\s*[:：]\s*(.*)$").expect("debug log pattern")
});

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+[.)])\s+(.*)$").expect("bullet pattern"));

/// Number of positional fields in a debug-log line.
const DEBUG_LOG_FIELDS: usize = 6;

/// A bold-labelled field: the text after the label on its own line, plus
/// the lines that follow it up to the next label, rule or heading.
struct BoldField<'a> {
    inline: String,
    body: Vec<&'a str>,
}

/// How far a field body extends below its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extent {
    /// One paragraph: a blank line after text ends it.
    Paragraph,
    /// A list: blank lines are skipped, and after one only list items continue it.
    List,
}

/// Whether `value` is the sentinel for an explicitly empty list.
pub fn is_none_token(value: &str) -> bool {
    let value = value.trim().trim_end_matches(['.', '。']).trim();
    NONE_TOKENS.iter().any(|t| value.eq_ignore_ascii_case(t))
}

/// Whether `title` names one of `labels` (case-insensitive, substring).
pub fn title_matches(title: &str, labels: &[&str]) -> bool {
    let title = title.trim().to_lowercase();
    labels.iter().any(|l| title.contains(&l.to_lowercase()))
}

/// Text of a bold field, either inline after the label or the paragraph
/// below it. `None` when no such label exists.
pub fn bold_field(content: &str, labels: &[&str]) -> Option<String> {
    let field = find_bold_field(content, labels, Extent::Paragraph)?;
    if !field.inline.is_empty() {
        return Some(field.inline);
    }
    Some(field.body.join("\n").trim().to_string())
}

/// A list-valued bold field.
///
/// Inline values split on commas (ASCII or full-width) and `、`; otherwise the
/// bullet items below the label are used. The "none" sentinel yields an
/// empty list, a missing label yields `None`.
pub fn list_field(content: &str, labels: &[&str]) -> Option<Vec<String>> {
    let field = find_bold_field(content, labels, Extent::Paragraph)?;
    if !field.inline.is_empty() {
        return Some(split_inline_list(&field.inline));
    }
    Some(list_items(&field.body.join("\n")))
}

/// Raw lines under a bold label, for callers with their own line grammar.
///
/// The block runs to the next label, rule or heading; list items separated
/// by blank lines stay in one block.
pub fn field_block(content: &str, labels: &[&str]) -> Option<String> {
    let field = find_bold_field(content, labels, Extent::List)?;
    let mut lines = Vec::with_capacity(field.body.len() + 1);
    if !field.inline.is_empty() {
        lines.push(field.inline.as_str());
    }
    lines.extend(field.body);
    Some(lines.join("\n"))
}

/// `content` with every block labelled by one of `labels` removed.
pub fn strip_fields(content: &str, labels: &[&str]) -> String {
    let mut kept = Vec::new();
    let mut skipping = false;
    let mut seen_body = false;
    for line in content.lines() {
        if let Some((label, rest)) = bold_label(line) {
            skipping = label_matches(label, labels);
            seen_body = !rest.is_empty();
            if skipping {
                continue;
            }
        } else if skipping {
            if is_block_boundary(line) || (line.trim().is_empty() && seen_body) {
                skipping = false;
            } else {
                seen_body |= !line.trim().is_empty();
                continue;
            }
        }
        kept.push(line);
    }
    kept.join("\n")
}

/// Bullet or numbered list items of `content`, in order.
///
/// Plain non-empty lines count as items too, so a subsection holding
/// `job_1, job_2` on one line reads the same as two bullets.
pub fn list_items(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_none_token(trimmed) {
            continue;
        }
        match BULLET.captures(line) {
            Some(caps) => {
                let item = caps[1].trim();
                if !item.is_empty() && !is_none_token(item) {
                    items.push(item.to_string());
                }
            }
            None => items.extend(split_inline_list(trimmed)),
        }
    }
    items
}

/// Checkbox items as `(checked, text)`, in document order.
pub fn checkbox_items(content: &str) -> Vec<(bool, String)> {
    content
        .lines()
        .filter_map(|line| CHECKBOX.captures(line))
        .map(|caps| (caps[1].eq_ignore_ascii_case("x"), caps[2].trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .collect()
}

/// Validator entries: list items with an optional checkbox stripped.
/// Debug-log lines that share the block are skipped.
pub fn validator_items(content: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || is_none_token(trimmed) || DEBUG_LOG.is_match(line) {
            continue;
        }
        let text = match CHECKBOX.captures(line) {
            Some(caps) => caps[2].trim().to_string(),
            None => match BULLET.captures(line) {
                Some(caps) => caps[1].trim().to_string(),
                None => trimmed.to_string(),
            },
        };
        if !text.is_empty() && !is_none_token(&text) {
            items.push(text);
        }
    }
    items
}

/// Parse one `- debugN: f1, f2, f3, f4, f5, f6` line.
///
/// Fields map positionally; missing trailing fields are empty. Commas are
/// not escaped in the source format, so a field containing one shifts
/// every later field and anything past the sixth segment is dropped.
pub fn debug_log_line(line: &str) -> Option<DebugLog> {
    let caps = DEBUG_LOG.captures(line)?;
    let id = caps[1].to_lowercase();
    let mut fields: Vec<String> = caps[2].split(',').map(|f| f.trim().to_string()).collect();

    if fields.len() > DEBUG_LOG_FIELDS {
        tracing::debug!(
            id = %id,
            extra = fields.len() - DEBUG_LOG_FIELDS,
            "discarding surplus debug log fields"
        );
        fields.truncate(DEBUG_LOG_FIELDS);
    }
    fields.resize(DEBUG_LOG_FIELDS, String::new());

    let mut fields = fields.into_iter();
    let mut next = || fields.next().unwrap_or_default();
    Some(DebugLog {
        id,
        phenomenon: next(),
        reproduction: next(),
        hypotheses: split_sequence(&next()),
        verification_todo: split_sequence(&next()),
        fix: next(),
        progress: next(),
    })
}

/// Every debug-log line in `content`.
pub fn debug_logs(content: &str) -> Vec<DebugLog> {
    content.lines().filter_map(debug_log_line).collect()
}

/// Render a debug log back into its single-line form.
pub fn format_debug_log(log: &DebugLog) -> String {
    format!(
        "- {}: {}, {}, {}, {}, {}, {}",
        log.id,
        log.phenomenon,
        log.reproduction,
        log.hypotheses.join("; "),
        log.verification_todo.join("; "),
        log.fix,
        log.progress
    )
}

fn split_sequence(field: &str) -> Vec<String> {
    field
        .split([';', '；'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn split_inline_list(value: &str) -> Vec<String> {
    if is_none_token(value) {
        return Vec::new();
    }
    value
        .split([',', '，', '、'])
        .map(|item| item.trim().trim_matches('`').trim())
        .filter(|item| !item.is_empty() && !is_none_token(item))
        .map(String::from)
        .collect()
}

/// Split a `**Label**: rest` line. The colon may sit inside or outside the
/// bold markers and may be full-width.
pub fn bold_label(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim_start();
    let trimmed = trimmed
        .strip_prefix(['-', '*', '+'])
        .filter(|rest| rest.starts_with(' '))
        .map(str::trim_start)
        .unwrap_or(trimmed);
    let inner = trimmed.strip_prefix("**")?;
    let close = inner.find("**")?;
    let label = inner[..close].trim().trim_end_matches([':', '：']).trim();
    if label.is_empty() {
        return None;
    }
    let rest = inner[close + 2..].trim_start();
    let rest = rest.strip_prefix([':', '：']).unwrap_or(rest);
    Some((label, rest.trim()))
}

/// Bullet or numbered list line, checkbox or not.
pub fn is_list_item(line: &str) -> bool {
    BULLET.is_match(line)
}

/// Whether a bold `label` names one of `labels`.
///
/// Case-insensitive prefix match ending at a word break, so `Tasks (Todo 列表)`
/// answers to `Tasks` while `Goals` does not answer to `Goal`.
pub fn label_matches(label: &str, labels: &[&str]) -> bool {
    labels.iter().any(|candidate| {
        let Some(head) = label.get(..candidate.len()) else {
            return false;
        };
        head.eq_ignore_ascii_case(candidate)
            && label[candidate.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric())
    })
}

pub fn is_block_boundary(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('#')
        || trimmed == "---"
        || trimmed == "***"
        || bold_label(line).is_some()
}

fn find_bold_field<'a>(content: &'a str, labels: &[&str], extent: Extent) -> Option<BoldField<'a>> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines
        .iter()
        .position(|line| bold_label(line).is_some_and(|(label, _)| label_matches(label, labels)))?;
    let (_, inline) = bold_label(lines[start])?;

    let mut body = Vec::new();
    let mut gap = false;
    for line in &lines[start + 1..] {
        if is_block_boundary(line) {
            break;
        }
        if line.trim().is_empty() {
            if body.is_empty() {
                continue;
            }
            if extent == Extent::Paragraph {
                break;
            }
            gap = true;
            continue;
        }
        if gap && !is_list_item(line) {
            break;
        }
        body.push(*line);
    }

    Some(BoldField {
        inline: inline.to_string(),
        body,
    })
}
