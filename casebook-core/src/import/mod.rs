pub mod identity;
pub mod reconcile;
pub mod source;

pub use reconcile::{import_test_cases, import_test_cases_at, ImportOutcome, ImportRequest};
