//! Markdown parser for test case documents.
//!
//! Recognizes a narrow structural subset:
//!   ## Category
//!   ### Sub-category
//!   #### TC-XX-001: Test case title
//!   - **优先级**: P0
//!   - **前置条件**: inline value
//!   - **测试步骤**:
//!   1. step
//!   - **预期结果**:
//!   - result
//!
//! Everything else (prose, tables, fenced code) is ignored. Parsing never fails;
//! unrecognized lines are skipped.

pub mod classify;
pub mod fields;

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::ParserConfig;
use crate::types::{ParseResult, PATH_SEPARATOR};
use classify::{LineClassifier, LineKind};
use fields::FieldAssembler;

/// Title suffixes stripped from the document heading when deriving a page name.
const DISPLAY_NAME_SUFFIXES: &[&str] = &["测试用例文档", "测试用例文", "Test Case Document"];

static H1_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[ \t]+(.+)$").unwrap());

static PAGE_DIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([A-Za-z]+Page)/").unwrap());

static PAGE_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([A-Za-z]+Page)").unwrap());

/// Mutable state threaded through the line loop.
struct ParseState<'c> {
    classifier: LineClassifier<'c>,
    assembler: FieldAssembler,
    /// Zero, one or two heading segments.
    current_path: Vec<String>,
    result: ParseResult,
}

impl<'c> ParseState<'c> {
    fn new(config: &'c ParserConfig) -> Self {
        Self {
            classifier: LineClassifier::new(config),
            assembler: FieldAssembler::new(),
            current_path: Vec::new(),
            result: ParseResult::default(),
        }
    }

    fn process_line(&mut self, line: &str) {
        match self.classifier.classify(line) {
            LineKind::FenceToggle
            | LineKind::Fenced
            | LineKind::SkippedHeading
            | LineKind::Other => {}
            LineKind::Category(name) => {
                self.current_path = vec![name];
            }
            LineKind::TestCase { code, title } => {
                let path = self.current_path.clone();
                if let Some(done) = self.assembler.open(code, title, path) {
                    self.result.test_cases.push(done);
                }
            }
            LineKind::SubCategory(name) => self.enter_subcategory(name),
            LineKind::Field { label, text } => self.assembler.apply_label(label, text),
            LineKind::OtherLabel => self.assembler.clear_field(),
            LineKind::ListItem(value) => self.assembler.push_list_item(value),
        }
    }

    fn enter_subcategory(&mut self, name: String) {
        let Some(top) = self.current_path.first().cloned() else {
            return;
        };
        self.current_path = vec![top, name];
        let joined = self.current_path.join(PATH_SEPARATOR);
        let seen = self
            .result
            .categories
            .iter()
            .any(|c| c.join(PATH_SEPARATOR) == joined);
        if !seen {
            self.result.categories.push(self.current_path.clone());
        }
    }

    fn finish(mut self) -> ParseResult {
        if let Some(done) = self.assembler.finish() {
            self.result.test_cases.push(done);
        }
        self.result
    }
}

/// Parse a test case document with the default heading blocklists.
pub fn parse_markdown_test_cases(content: &str) -> ParseResult {
    parse_markdown_test_cases_with(content, &ParserConfig::default())
}

/// Parse a test case document with custom heading blocklists.
pub fn parse_markdown_test_cases_with(content: &str, config: &ParserConfig) -> ParseResult {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    let mut state = ParseState::new(config);
    for line in content.split('\n') {
        state.process_line(line);
    }
    let result = state.finish();
    log::debug!(
        "[casebook.parser] Parsed {} test cases, {} categories",
        result.test_cases.len(),
        result.categories.len()
    );
    result
}

/// Page display name from the first `# ` heading, minus a trailing
/// "测试用例文档" suffix. None when there is no such heading or nothing remains.
pub fn extract_page_display_name(content: &str) -> Option<String> {
    let content = content.replace("\r\n", "\n");
    let heading = content
        .lines()
        .find_map(|line| H1_RE.captures(line).map(|caps| caps[1].trim().to_string()))?;

    let mut name = heading.as_str();
    for suffix in DISPLAY_NAME_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped;
            break;
        }
    }
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Page identifier from a document path: a `<Name>Page/` directory, or a file
/// name starting with `<Name>Page`. E.g. `docs/ScriptPage/测试用例文档.md` -> `ScriptPage`.
pub fn extract_page_name_from_path(path: &Path) -> Option<String> {
    let normalized = path.to_string_lossy().replace('\\', "/");
    if let Some(caps) = PAGE_DIR_RE.captures(&normalized) {
        return Some(caps[1].to_string());
    }
    let file_name = path.file_name()?.to_string_lossy();
    PAGE_FILE_RE
        .captures(&file_name)
        .map(|caps| caps[1].to_string())
}
