//! Migration prompt documents.
//!
//! A prompt is a markdown document split into sections by level-one headers:
//!
//! ```text
//! # Introduction      shown when no step is requested
//! # Before            printed before every started step
//! # After             printed after every started step
//! # Step 1            a step with id "1"
//! # Step Find Tests   a step with id "Find Tests"
//! ```
//!
//! Sub-headers (`## ...`) and any other single-`#` header are ordinary content
//! of whichever section is open. Text before the first section is dropped.

use crate::{Error, Result};
use std::collections::HashMap;
use std::path::Path;

/// The migration workflow that ships with ferry.
pub const MIGRATION_PROMPT: &str = include_str!("migration_prompt.md");

/// Parsed steps and reserved sections of a prompt document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    steps: HashMap<String, String>,
    order: Vec<String>,
    introduction: String,
    before: String,
    after: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Section {
    Introduction,
    Before,
    After,
    Step(String),
}

impl Prompt {
    /// Parse a prompt document. Fails with `NoStepsFound` if it has no step headers.
    pub fn parse(content: &str) -> Result<Self> {
        let mut prompt = Prompt::default();
        let mut current: Option<Section> = None;
        let mut lines: Vec<&str> = Vec::new();

        for line in content.lines() {
            match parse_header(line) {
                Some(section) => {
                    if let Some(open) = current.take() {
                        prompt.commit(open, &lines);
                    }
                    if let Section::Step(ref id) = section {
                        if prompt.order.contains(id) {
                            tracing::warn!(step = %id, "duplicate step header, later content wins");
                        } else {
                            prompt.order.push(id.clone());
                        }
                    }
                    current = Some(section);
                    lines.clear();
                }
                None if current.is_some() => lines.push(line),
                None => {}
            }
        }

        if let Some(open) = current {
            prompt.commit(open, &lines);
        }

        if prompt.order.is_empty() {
            return Err(Error::NoStepsFound);
        }

        Ok(prompt)
    }

    /// Read and parse a prompt document from disk.
    pub fn parse_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// The embedded migration workflow.
    pub fn migration() -> Result<Self> {
        Self::parse(MIGRATION_PROMPT)
    }

    fn commit(&mut self, section: Section, lines: &[&str]) {
        let content = trim_blank_lines(lines);
        match section {
            Section::Introduction => self.introduction = content,
            Section::Before => self.before = content,
            Section::After => self.after = content,
            Section::Step(id) => {
                self.steps.insert(id, content);
            }
        }
    }

    /// Content of a step, if the prompt has it.
    pub fn step(&self, id: &str) -> Option<&str> {
        self.steps.get(id).map(String::as_str)
    }

    /// Step ids in document order.
    pub fn steps(&self) -> Vec<String> {
        self.order.clone()
    }

    /// Id of the first step, or an empty string.
    pub fn first_step(&self) -> &str {
        self.order.first().map(String::as_str).unwrap_or("")
    }

    pub fn introduction(&self) -> &str {
        &self.introduction
    }

    pub fn before(&self) -> &str {
        &self.before
    }

    pub fn after(&self) -> &str {
        &self.after
    }

    /// One-line instruction that gets an agent onto the first step.
    pub fn bootstrap(&self, command: &str) -> String {
        let first = self.first_step();
        if first.is_empty() {
            return String::new();
        }
        format!(
            "Execute '{} {}'. This will return instructions. Execute those instructions.",
            command, first
        )
    }
}

/// Recognize a section header line.
///
/// The line must start (after indentation) with exactly one `#`, then a
/// space, then a non-empty label.
fn parse_header(line: &str) -> Option<Section> {
    let rest = line.trim().strip_prefix('#')?;
    if !rest.starts_with(' ') {
        return None;
    }

    let label = rest.trim();
    if label.is_empty() {
        return None;
    }

    if label.eq_ignore_ascii_case("introduction") {
        return Some(Section::Introduction);
    }
    if label.eq_ignore_ascii_case("before") {
        return Some(Section::Before);
    }
    if label.eq_ignore_ascii_case("after") {
        return Some(Section::After);
    }

    parse_step_label(label).map(Section::Step)
}

/// Extract the id from a `step <id>` label. The word "step" is case-insensitive,
/// the id keeps its case.
fn parse_step_label(label: &str) -> Option<String> {
    let keyword = label.get(..4)?;
    if !keyword.eq_ignore_ascii_case("step") {
        return None;
    }

    let rest = &label[4..];
    if !rest.starts_with(' ') {
        return None;
    }

    let id = rest.trim();
    if id.is_empty() {
        return None;
    }
    Some(id.to_string())
}

fn trim_blank_lines(lines: &[&str]) -> String {
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());

    match (start, end) {
        (Some(start), Some(end)) => lines[start..=end].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numeric_steps() {
        let content = "# Step 1\nFirst step content.\n\n# Step 2\nSecond step content.\n";
        let prompt = Prompt::parse(content).unwrap();

        assert_eq!(prompt.steps(), vec!["1", "2"]);
        assert_eq!(prompt.step("1"), Some("First step content."));
        assert_eq!(prompt.step("2"), Some("Second step content."));
        assert_eq!(prompt.first_step(), "1");
    }

    #[test]
    fn test_parse_named_steps_keep_case() {
        let content = "# Step Find Tests\nLook for tests.\n# step Write Code\nWrite it.\n";
        let prompt = Prompt::parse(content).unwrap();

        assert_eq!(prompt.steps(), vec!["Find Tests", "Write Code"]);
        assert_eq!(prompt.step("Find Tests"), Some("Look for tests."));
        assert_eq!(prompt.step("find tests"), None);
    }

    #[test]
    fn test_parse_keeps_document_order() {
        let content = "# Step 10\nten\n# Step 2\ntwo\n# Step b\nbee\n# Step a\nay\n";
        let prompt = Prompt::parse(content).unwrap();
        assert_eq!(prompt.steps(), vec!["10", "2", "b", "a"]);
    }

    #[test]
    fn test_steps_returns_copy() {
        let prompt = Prompt::parse("# Step 1\na\n# Step 2\nb\n").unwrap();

        let mut steps = prompt.steps();
        steps.push("3".to_string());
        steps[0] = "changed".to_string();

        assert_eq!(prompt.steps(), vec!["1", "2"]);
    }

    #[test]
    fn test_reserved_sections() {
        let content = "\
preamble is dropped
# Introduction
Welcome.

# Before
Read carefully.
# Step 1
Do it.
# After
Report back.
";
        let prompt = Prompt::parse(content).unwrap();

        assert_eq!(prompt.introduction(), "Welcome.");
        assert_eq!(prompt.before(), "Read carefully.");
        assert_eq!(prompt.after(), "Report back.");
        assert_eq!(prompt.steps(), vec!["1"]);
        assert_eq!(prompt.step("1"), Some("Do it."));
    }

    #[test]
    fn test_reserved_sections_case_insensitive() {
        let prompt = Prompt::parse("# BEFORE\nb\n# after\na\n# Step 1\ns\n").unwrap();
        assert_eq!(prompt.before(), "b");
        assert_eq!(prompt.after(), "a");
    }

    #[test]
    fn test_missing_reserved_sections_are_empty() {
        let prompt = Prompt::parse("# Step 1\ns\n").unwrap();
        assert_eq!(prompt.introduction(), "");
        assert_eq!(prompt.before(), "");
        assert_eq!(prompt.after(), "");
    }

    #[test]
    fn test_sub_headers_are_content() {
        let content = "# Step 1\nIntro.\n## Details\nMore.\n### Deeper\nEven more.\n";
        let prompt = Prompt::parse(content).unwrap();

        assert_eq!(prompt.steps(), vec!["1"]);
        assert_eq!(
            prompt.step("1"),
            Some("Intro.\n## Details\nMore.\n### Deeper\nEven more.")
        );
    }

    #[test]
    fn test_invalid_step_headers() {
        let content = "# Step 1\nbody\n##Step 2\n# Steps 3\n# Step\n# Stepping 4\n#Step 5\n";
        let prompt = Prompt::parse(content).unwrap();

        assert_eq!(prompt.steps(), vec!["1"]);
        assert_eq!(
            prompt.step("1"),
            Some("body\n##Step 2\n# Steps 3\n# Step\n# Stepping 4\n#Step 5")
        );
    }

    #[test]
    fn test_step_label_needs_a_space() {
        let prompt = Prompt::parse("# Step 1\none\n# Step\t2\ntwo\n").unwrap();
        assert_eq!(prompt.steps(), vec!["1"]);
        assert_eq!(prompt.step("1"), Some("one\n# Step\t2\ntwo"));
    }

    #[test]
    fn test_leading_whitespace_before_marker() {
        let prompt = Prompt::parse("   # Step 1\none\n\t# Step 2\ntwo\n").unwrap();
        assert_eq!(prompt.steps(), vec!["1", "2"]);
    }

    #[test]
    fn test_trims_blank_lines_only() {
        let content = "# Step 1\n\n\n    indented code\n  more\n\n\n# Step 2\nx\n";
        let prompt = Prompt::parse(content).unwrap();
        assert_eq!(prompt.step("1"), Some("    indented code\n  more"));
    }

    #[test]
    fn test_empty_step_content() {
        let prompt = Prompt::parse("# Step 1\n# Step 2\n\n").unwrap();
        assert_eq!(prompt.step("1"), Some(""));
        assert_eq!(prompt.step("2"), Some(""));
    }

    #[test]
    fn test_windows_line_endings() {
        let prompt = Prompt::parse("# Step 1\r\nfirst\r\n# Step 2\r\nsecond\r\n").unwrap();
        assert_eq!(prompt.steps(), vec!["1", "2"]);
        assert_eq!(prompt.step("1"), Some("first"));
    }

    #[test]
    fn test_duplicate_step_header() {
        let prompt = Prompt::parse("# Step 1\nold\n# Step 2\ntwo\n# Step 1\nnew\n").unwrap();
        assert_eq!(prompt.steps(), vec!["1", "2"]);
        assert_eq!(prompt.step("1"), Some("new"));
    }

    #[test]
    fn test_no_steps_found() {
        assert!(matches!(Prompt::parse(""), Err(Error::NoStepsFound)));
        assert!(matches!(
            Prompt::parse("just text\n## Step 1\n"),
            Err(Error::NoStepsFound)
        ));
        assert!(matches!(
            Prompt::parse("# Introduction\nhi\n# Before\nb\n# After\na\n"),
            Err(Error::NoStepsFound)
        ));
    }

    #[test]
    fn test_bootstrap() {
        let prompt = Prompt::parse("# Step Setup\nx\n").unwrap();
        assert_eq!(
            prompt.bootstrap("ferry migrate"),
            "Execute 'ferry migrate Setup'. This will return instructions. Execute those instructions."
        );
    }

    #[test]
    fn test_parse_file_missing() {
        let err = Prompt::parse_file(Path::new("/nonexistent/prompt.md")).unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn test_embedded_migration_prompt() {
        let prompt = Prompt::migration().unwrap();

        assert!(!prompt.introduction().is_empty());
        assert!(!prompt.before().is_empty());
        assert!(!prompt.after().is_empty());
        assert_eq!(prompt.first_step(), "1");
        for id in prompt.steps() {
            assert!(!prompt.step(&id).unwrap().is_empty(), "step {} is empty", id);
        }
    }
}
