/// Accumulates the fields of the test case currently being read.
use regex::Regex;
use std::sync::LazyLock;

use super::classify::FieldLabel;
use crate::types::{ParsedTestCase, Priority};

static PRIORITY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"P[012]").unwrap());

/// The multi-line field that list items are currently routed to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActiveField {
    #[default]
    None,
    Preconditions,
    Steps,
    ExpectedResults,
    TestData,
}

/// A test case under construction. Only `code` and `title` are guaranteed.
#[derive(Debug, Clone, Default)]
pub struct DraftTestCase {
    pub code: String,
    pub title: String,
    pub category_path: Vec<String>,
    pub priority: Option<Priority>,
    pub preconditions: Option<String>,
    pub steps: Vec<String>,
    pub expected_results: Vec<String>,
    pub test_data: Option<String>,
}

impl DraftTestCase {
    /// Apply defaults. Returns None for a draft without a code.
    fn finalize(self) -> Option<ParsedTestCase> {
        if self.code.is_empty() {
            return None;
        }
        Some(ParsedTestCase {
            code: self.code,
            title: self.title,
            category_path: self.category_path,
            priority: self.priority.unwrap_or_default(),
            preconditions: self.preconditions,
            steps: self.steps,
            expected_results: self.expected_results,
            test_data: self.test_data,
        })
    }
}

#[derive(Debug, Default)]
pub struct FieldAssembler {
    field: ActiveField,
    draft: Option<DraftTestCase>,
}

impl FieldAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_open_case(&self) -> bool {
        self.draft.is_some()
    }

    pub fn active_field(&self) -> ActiveField {
        self.field
    }

    /// Start a new test case, returning the finalized previous one if any.
    pub fn open(
        &mut self,
        code: String,
        title: String,
        category_path: Vec<String>,
    ) -> Option<ParsedTestCase> {
        let previous = self.finish();
        self.draft = Some(DraftTestCase {
            code,
            title,
            category_path,
            priority: Some(Priority::P1),
            ..DraftTestCase::default()
        });
        previous
    }

    /// Close the open test case, if any.
    pub fn finish(&mut self) -> Option<ParsedTestCase> {
        self.field = ActiveField::None;
        self.draft.take().and_then(DraftTestCase::finalize)
    }

    /// Handle a recognized label line. `text` is the whole trimmed line.
    pub fn apply_label(&mut self, label: FieldLabel, text: &str) {
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        self.field = match label {
            FieldLabel::Priority => {
                if let Some(m) = PRIORITY_RE.find(text) {
                    if let Ok(priority) = m.as_str().parse() {
                        draft.priority = Some(priority);
                    }
                }
                ActiveField::None
            }
            FieldLabel::Preconditions => {
                if let Some(value) = inline_value(text) {
                    draft.preconditions = Some(value);
                }
                ActiveField::Preconditions
            }
            FieldLabel::TestData => {
                if let Some(value) = inline_value(text) {
                    draft.test_data = Some(value);
                }
                ActiveField::TestData
            }
            FieldLabel::Steps => ActiveField::Steps,
            FieldLabel::ExpectedResults => ActiveField::ExpectedResults,
        };
    }

    /// An unrecognized bold label ends whatever field was being collected.
    pub fn clear_field(&mut self) {
        self.field = ActiveField::None;
    }

    pub fn push_list_item(&mut self, value: String) {
        if value.is_empty() {
            return;
        }
        let Some(draft) = self.draft.as_mut() else {
            return;
        };
        match self.field {
            ActiveField::Steps => draft.steps.push(value),
            ActiveField::ExpectedResults => draft.expected_results.push(value),
            // Preconditions and test data are captured inline only.
            ActiveField::None | ActiveField::Preconditions | ActiveField::TestData => {}
        }
    }
}

/// Text after the first ASCII or full-width colon, if non-empty.
fn inline_value(text: &str) -> Option<String> {
    let idx = text.find([':', '：'])?;
    let colon_len = text[idx..].chars().next().map_or(1, char::len_utf8);
    let value = text[idx + colon_len..].trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
