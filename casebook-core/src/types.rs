use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category name used when a test case has no heading above it.
pub const UNCATEGORIZED: &str = "未分类";

/// Separator between category path segments in `fullPath`.
pub const PATH_SEPARATOR: &str = " > ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    P0,
    #[default]
    P1,
    P2,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P0" => Ok(Priority::P0),
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            other => Err(format!("unknown priority: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    #[default]
    Pending,
    Failed,
    Passed,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pending => "pending",
            TestStatus::Failed => "failed",
            TestStatus::Passed => "passed",
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(TestStatus::Pending),
            "failed" => Ok(TestStatus::Failed),
            "passed" => Ok(TestStatus::Passed),
            other => Err(format!("unknown status: {}", other)),
        }
    }
}

/// A test case as read from a document, before it is attached to a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedTestCase {
    pub code: String,
    pub title: String,
    pub category_path: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_results: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
}

impl ParsedTestCase {
    /// Joined category path, or the uncategorized label for an empty path.
    pub fn full_path(&self) -> String {
        if self.category_path.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            self.category_path.join(PATH_SEPARATOR)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Deduplicated sub-category paths in first-seen order.
    pub categories: Vec<Vec<String>>,
    pub test_cases: Vec<ParsedTestCase>,
}

impl ParseResult {
    pub fn is_empty(&self) -> bool {
        self.test_cases.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: String,
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub page_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_name: Option<String>,
    pub full_path: String,
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub id: String,
    pub code: String,
    pub title: String,
    pub page_id: String,
    pub category_id: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preconditions: Option<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_results: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_data: Option<String>,
    #[serde(default)]
    pub status: TestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tested_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// All pages, categories and test cases known to the application.
/// Owned by the caller and passed through the import engine by value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    #[serde(default)]
    pub pages: Vec<Page>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

impl Collection {
    pub fn page(&self, page_id: &str) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == page_id)
    }

    pub fn categories_for_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> impl Iterator<Item = &'a Category> {
        self.categories.iter().filter(move |c| c.page_id == page_id)
    }

    pub fn test_cases_for_page<'a>(
        &'a self,
        page_id: &'a str,
    ) -> impl Iterator<Item = &'a TestCase> {
        self.test_cases.iter().filter(move |tc| tc.page_id == page_id)
    }

    /// Count test cases by status, for one page or for everything.
    pub fn statistics(&self, page_id: Option<&str>) -> Statistics {
        let mut stats = Statistics::default();
        for tc in self
            .test_cases
            .iter()
            .filter(|tc| page_id.map_or(true, |id| tc.page_id == id))
        {
            stats.total += 1;
            match tc.status {
                TestStatus::Pending => stats.pending += 1,
                TestStatus::Failed => stats.failed += 1,
                TestStatus::Passed => stats.passed += 1,
            }
        }
        stats
    }

    /// Remove a page together with its categories and test cases.
    /// Returns false when nothing referenced the page.
    pub fn remove_page(&mut self, page_id: &str) -> bool {
        let before = (self.pages.len(), self.categories.len(), self.test_cases.len());
        self.pages.retain(|p| p.id != page_id);
        self.categories.retain(|c| c.page_id != page_id);
        self.test_cases.retain(|tc| tc.page_id != page_id);
        before != (self.pages.len(), self.categories.len(), self.test_cases.len())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub pending: usize,
    pub failed: usize,
    pub passed: usize,
}

/// Summary info for a page in list responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub category_count: usize,
    pub statistics: Statistics,
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
