/// Line classification for test case documents.
///
/// Each line is tagged independently; the only state carried between lines is
/// whether we are inside a fenced code block. Digits are ASCII only.
use regex::Regex;
use std::sync::LazyLock;

use crate::config::ParserConfig;

static TEST_CASE_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#{3,4}\s+(TC-(?:[A-Z]+-)?[0-9]+[A-Z]?)[:：]\s*(.+)$").unwrap()
});

static CATEGORY_ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());

static SUBCATEGORY_ORDINAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+\.[0-9]+\s*").unwrap());

static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]+[.)]|-|\*)\s*(.+)$").unwrap());

static CHECKBOX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\s?[xX]?\]\s*").unwrap());

/// Test case fields that can be introduced by a bold label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLabel {
    Priority,
    Preconditions,
    Steps,
    ExpectedResults,
    TestData,
}

/// Bold labels in match order. The first entry contained in a line wins.
const FIELD_LABELS: &[(&str, FieldLabel)] = &[
    ("**优先级**", FieldLabel::Priority),
    ("**前置条件**", FieldLabel::Preconditions),
    ("**测试步骤**", FieldLabel::Steps),
    ("**步骤**", FieldLabel::Steps),
    ("**预期结果**", FieldLabel::ExpectedResults),
    ("**测试数据**", FieldLabel::TestData),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Opening or closing code fence.
    FenceToggle,
    /// Any line between fences.
    Fenced,
    Category(String),
    SubCategory(String),
    /// A `##`/`###` heading that is empty or blocklisted.
    SkippedHeading,
    TestCase { code: String, title: String },
    /// A recognized bold label; `text` is the trimmed line.
    Field { label: FieldLabel, text: &'a str },
    /// Some other bold-labelled line.
    OtherLabel,
    /// List item value with any checkbox marker removed. May be empty.
    ListItem(String),
    Other,
}

pub struct LineClassifier<'c> {
    config: &'c ParserConfig,
    in_fence: bool,
}

impl<'c> LineClassifier<'c> {
    pub fn new(config: &'c ParserConfig) -> Self {
        Self {
            config,
            in_fence: false,
        }
    }

    pub fn in_fence(&self) -> bool {
        self.in_fence
    }

    pub fn classify<'a>(&mut self, line: &'a str) -> LineKind<'a> {
        let trimmed = line.trim();

        if trimmed.starts_with("```") {
            self.in_fence = !self.in_fence;
            return LineKind::FenceToggle;
        }
        if self.in_fence {
            return LineKind::Fenced;
        }

        if let Some(rest) = line.strip_prefix("## ") {
            let name = CATEGORY_ORDINAL_RE.replace(rest, "").trim().to_string();
            if name.is_empty() || self.config.is_blocked_category(&name) {
                return LineKind::SkippedHeading;
            }
            return LineKind::Category(name);
        }

        // Test case headings take precedence over `###` sub-category headings.
        if let Some(caps) = TEST_CASE_HEADING_RE.captures(line) {
            return LineKind::TestCase {
                code: caps[1].to_string(),
                title: caps[2].trim().to_string(),
            };
        }

        if let Some(rest) = line.strip_prefix("### ") {
            let name = SUBCATEGORY_ORDINAL_RE.replace(rest, "").trim().to_string();
            if name.is_empty() || self.config.is_blocked_subcategory(&name) {
                return LineKind::SkippedHeading;
            }
            return LineKind::SubCategory(name);
        }

        if let Some(label) = field_label(trimmed) {
            return LineKind::Field {
                label,
                text: trimmed,
            };
        }

        if trimmed.starts_with("- **") || trimmed.starts_with("**") {
            return LineKind::OtherLabel;
        }

        if let Some(caps) = LIST_ITEM_RE.captures(trimmed) {
            let value = caps[2].trim();
            return LineKind::ListItem(CHECKBOX_RE.replace(value, "").trim().to_string());
        }

        LineKind::Other
    }
}

fn field_label(trimmed: &str) -> Option<FieldLabel> {
    FIELD_LABELS
        .iter()
        .find(|(marker, _)| trimmed.contains(marker))
        .map(|(_, label)| *label)
}
