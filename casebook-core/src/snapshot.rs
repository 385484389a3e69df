/// Backup and restore format.
///
/// A snapshot is the whole collection as one JSON object:
///   { "version", "pages", "categories", "testCases", "lastUpdated" }
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Category, Collection, Page, TestCase};

pub const SNAPSHOT_VERSION: &str = "1.0.0";

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Invalid(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: String,
    pub pages: Vec<Page>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub last_updated: i64,
}

impl Snapshot {
    pub fn new(collection: Collection, last_updated: i64) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            pages: collection.pages,
            categories: collection.categories,
            test_cases: collection.test_cases,
            last_updated,
        }
    }

    pub fn into_collection(self) -> Collection {
        Collection {
            pages: self.pages,
            categories: self.categories,
            test_cases: self.test_cases,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a snapshot. `version` must be a non-empty string and
    /// `pages` / `testCases` must be arrays; `categories` may be absent.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let value: Value = serde_json::from_str(json)?;
        let obj = value
            .as_object()
            .ok_or(SnapshotError::Invalid("not a JSON object"))?;

        match obj.get("version").and_then(Value::as_str) {
            Some(v) if !v.is_empty() => {}
            _ => return Err(SnapshotError::Invalid("missing version")),
        }
        if !obj.get("pages").is_some_and(Value::is_array) {
            return Err(SnapshotError::Invalid("pages must be an array"));
        }
        if !obj.get("testCases").is_some_and(Value::is_array) {
            return Err(SnapshotError::Invalid("testCases must be an array"));
        }

        Ok(serde_json::from_value(value)?)
    }
}

/// Default file name for a backup taken on the given date.
pub fn backup_file_name(date: chrono::NaiveDate) -> String {
    format!("test-cases-backup-{}.json", date.format("%Y-%m-%d"))
}
