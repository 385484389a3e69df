pub mod local;

use crate::config::ParserConfig;
use crate::import::ImportRequest;
use crate::parser::parse_markdown_test_cases_with;
use crate::snapshot::SnapshotError;
use crate::types::{Collection, PageSummary, ParsedTestCase, Statistics, TestCase, TestStatus};

/// Result of importing a document into storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportReport {
    /// The document contained no test case headings. Nothing was written.
    NothingFound,
    Imported {
        created: usize,
        updated: usize,
        page_id: String,
        page_created: bool,
    },
}

/// Abstract storage trait for the test case collection.
/// Implementations: LocalStorage (JSON snapshot file).
pub trait CaseStorage: Send + Sync {
    /// List pages with per-page statistics.
    fn list_pages(&self) -> Vec<PageSummary>;

    /// A copy of the whole collection.
    fn collection(&self) -> Collection;

    /// Test cases in collection order, optionally limited to one page and
    /// one status.
    fn test_cases(&self, page_id: Option<&str>, status: Option<TestStatus>) -> Vec<TestCase>;

    /// Reconcile parsed test cases into the collection and persist the result.
    fn import_parsed(
        &self,
        request: &ImportRequest,
        parsed: &[ParsedTestCase],
    ) -> Result<ImportReport, StorageError>;

    /// Record a test run. Notes are replaced only when given.
    fn update_test_case_status(
        &self,
        test_case_id: &str,
        status: TestStatus,
        notes: Option<String>,
    ) -> Result<TestCase, StorageError>;

    /// Delete a page with its categories and test cases.
    fn delete_page(&self, page_id: &str) -> Result<(), StorageError>;

    fn statistics(&self, page_id: Option<&str>) -> Statistics;

    /// Serialize the collection as a backup snapshot.
    fn export_snapshot(&self) -> Result<String, StorageError>;

    /// Replace the collection with a validated backup snapshot.
    fn restore_snapshot(&self, json: &str) -> Result<(), StorageError>;

    /// Parse a document and import its test cases in one step.
    fn import_markdown(
        &self,
        content: &str,
        request: &ImportRequest,
        config: &ParserConfig,
    ) -> Result<ImportReport, StorageError> {
        let parsed = parse_markdown_test_cases_with(content, config);
        self.import_parsed(request, &parsed.test_cases)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Test case not found: {0}")]
    TestCaseNotFound(String),

    #[error("Invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
