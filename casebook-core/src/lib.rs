//! Casebook core: parse Markdown test case documents and reconcile them into a
//! persistent collection without losing recorded test results.

pub mod config;
pub mod import;
pub mod parser;
pub mod snapshot;
pub mod storage;
pub mod types;

pub use import::{import_test_cases, ImportOutcome, ImportRequest};
pub use parser::{extract_page_display_name, parse_markdown_test_cases};
