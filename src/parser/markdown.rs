/// A markdown document split into heading sections.
///
/// Sections are flat and in document order; nesting is recovered from
/// heading levels (see [`MarkdownDocument::descendants`]).
#[derive(Debug, Clone, Default)]
pub struct MarkdownDocument {
    /// Text before the first heading.
    pub preamble: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub level: u8,
    pub title: String,
    /// Body text up to the next heading of any level.
    pub content: String,
    /// 0-based line number of the heading.
    pub line: usize,
}

impl MarkdownDocument {
    pub fn parse(content: &str) -> Self {
        let mut doc = MarkdownDocument::default();
        let mut current_section: Option<Section> = None;
        let mut fence: Option<String> = None;

        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();

            if let Some(marker) = fence_marker(trimmed) {
                match &fence {
                    Some(open) if marker.starts_with(open.as_str()) => fence = None,
                    None => fence = Some(marker),
                    _ => {}
                }
            } else if fence.is_none() {
                if let Some((level, title)) = parse_heading(line) {
                    if let Some(section) = current_section.take() {
                        doc.sections.push(section);
                    }
                    current_section = Some(Section {
                        level,
                        title,
                        content: String::new(),
                        line: line_no,
                    });
                    continue;
                }
            }

            let target = match current_section {
                Some(ref mut section) => &mut section.content,
                None => &mut doc.preamble,
            };
            if !target.is_empty() {
                target.push('\n');
            }
            target.push_str(line);
        }

        if let Some(section) = current_section {
            doc.sections.push(section);
        }

        doc
    }

    /// Index one past the last section nested under `index`.
    pub fn subtree_end(&self, index: usize) -> usize {
        let level = self.sections[index].level;
        self.sections[index + 1..]
            .iter()
            .position(|s| s.level <= level)
            .map(|offset| index + 1 + offset)
            .unwrap_or(self.sections.len())
    }

    /// Sections nested under `index`, at any depth, in document order.
    pub fn descendants(&self, index: usize) -> &[Section] {
        &self.sections[index + 1..self.subtree_end(index)]
    }

    /// Body of `index` plus the headings and bodies nested under it.
    pub fn subtree_text(&self, index: usize) -> String {
        let mut text = self.sections[index].content.clone();
        for child in self.descendants(index) {
            text.push('\n');
            text.push_str(&"#".repeat(child.level as usize));
            text.push(' ');
            text.push_str(&child.title);
            if !child.content.is_empty() {
                text.push('\n');
                text.push_str(&child.content);
            }
        }
        text
    }
}

impl Section {
    pub fn trimmed_content(&self) -> String {
        self.content.trim().to_string()
    }
}

/// `#`..`######` followed by whitespace, or a bare run of hashes.
fn parse_heading(line: &str) -> Option<(u8, String)> {
    if !line.starts_with('#') {
        return None;
    }
    let level = line.chars().take_while(|&c| c == '#').count();
    if level > 6 {
        return None;
    }
    let rest = &line[level..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let title = rest.trim().trim_end_matches('#').trim().to_string();
    Some((level as u8, title))
}

/// Opening/closing code fence marker (``` or ~~~, three or more).
fn fence_marker(trimmed: &str) -> Option<String> {
    let first = trimmed.chars().next()?;
    if first != '`' && first != '~' {
        return None;
    }
    let run = trimmed.chars().take_while(|&c| c == first).count();
    (run >= 3).then(|| first.to_string().repeat(run))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sections() {
        let content = "# First\nContent 1\n## Second\nContent 2";
        let doc = MarkdownDocument::parse(content);

        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].level, 1);
        assert_eq!(doc.sections[0].content, "Content 1");
        assert_eq!(doc.sections[1].level, 2);
        assert_eq!(doc.sections[1].line, 2);
    }

    #[test]
    fn test_preamble_and_hashtags() {
        let content = "intro line\n#not-a-heading\n# Real\nbody";
        let doc = MarkdownDocument::parse(content);

        assert_eq!(doc.preamble, "intro line\n#not-a-heading");
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Real");
    }

    #[test]
    fn test_headings_inside_fences_are_body() {
        let content = "# Top\n```bash\n# comment\n```\n## Next\n~~~~\n### still code\n~~~~\n";
        let doc = MarkdownDocument::parse(content);

        let titles: Vec<_> = doc.sections.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Top", "Next"]);
        assert!(doc.sections[0].content.contains("# comment"));
        assert!(doc.sections[1].content.contains("### still code"));
    }

    #[test]
    fn test_descendants_and_subtree_text() {
        let content = "# Plan\n## A\na\n### A1\na1\n#### A1x\nx\n## B\nb";
        let doc = MarkdownDocument::parse(content);

        let a = doc.sections.iter().position(|s| s.title == "A").unwrap();
        let titles: Vec<_> = doc.descendants(a).iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["A1", "A1x"]);
        assert_eq!(doc.subtree_text(a), "a\n### A1\na1\n#### A1x\nx");

        let b = doc.sections.iter().position(|s| s.title == "B").unwrap();
        assert!(doc.descendants(b).is_empty());
        assert_eq!(doc.subtree_end(0), doc.sections.len());
    }

    #[test]
    fn test_closing_hashes_trimmed() {
        let doc = MarkdownDocument::parse("## Title ##\n");
        assert_eq!(doc.sections[0].title, "Title");
        assert_eq!(doc.sections[0].level, 2);
    }
}
