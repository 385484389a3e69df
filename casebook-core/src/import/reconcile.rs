/// Reconcile parsed test cases into an existing collection.
///
/// Matching is by test case code within the resolved page:
/// - Code already present -> update structural fields, keep status, notes,
///   tested_at, created_at and id
/// - Code not present -> create a pending test case
/// - Code present before but absent from the batch -> left untouched
///
/// Categories are matched by full path within the page and created on first
/// use. New categories get an order one past the highest order on the page.
use super::identity::{generate_id, CATEGORY_PREFIX, PAGE_PREFIX, TEST_CASE_PREFIX};
use crate::types::{
    now_millis, Category, Collection, Page, ParsedTestCase, TestCase, TestStatus, UNCATEGORIZED,
};

/// Which page an import targets.
#[derive(Debug, Clone, Default)]
pub struct ImportRequest {
    /// Explicit page id. Used as-is even when no such page exists.
    pub target_page_id: Option<String>,
    /// Page identifier such as `ScriptPage`, matched against existing pages.
    pub page_name: String,
    /// Display name for a page created by this import.
    pub page_display_name: String,
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub created: usize,
    pub updated: usize,
    pub resolved_page_id: String,
    pub page_created: bool,
    pub collection: Collection,
}

/// Import parsed cases using the current time.
pub fn import_test_cases(
    collection: Collection,
    request: &ImportRequest,
    parsed: &[ParsedTestCase],
) -> ImportOutcome {
    import_test_cases_at(collection, request, parsed, now_millis())
}

/// Import parsed cases with an explicit timestamp (milliseconds).
pub fn import_test_cases_at(
    mut collection: Collection,
    request: &ImportRequest,
    parsed: &[ParsedTestCase],
    now: i64,
) -> ImportOutcome {
    let (page_id, page_created) = resolve_page(&mut collection, request, now);

    let mut next_order = collection
        .categories_for_page(&page_id)
        .map(|c| c.order + 1)
        .max()
        .unwrap_or(0);

    let mut created = 0;
    let mut updated = 0;

    for case in parsed {
        let category_id = ensure_category(&mut collection, &page_id, case, &mut next_order);

        let existing = collection
            .test_cases
            .iter_mut()
            .find(|tc| tc.page_id == page_id && tc.code == case.code);

        match existing {
            Some(tc) => {
                tc.title = case.title.clone();
                tc.category_id = category_id;
                tc.priority = case.priority;
                tc.preconditions = case.preconditions.clone();
                tc.steps = case.steps.clone();
                tc.expected_results = case.expected_results.clone();
                tc.test_data = case.test_data.clone();
                tc.updated_at = now;
                updated += 1;
            }
            None => {
                collection.test_cases.push(TestCase {
                    id: generate_id(TEST_CASE_PREFIX),
                    code: case.code.clone(),
                    title: case.title.clone(),
                    page_id: page_id.clone(),
                    category_id,
                    priority: case.priority,
                    preconditions: case.preconditions.clone(),
                    steps: case.steps.clone(),
                    expected_results: case.expected_results.clone(),
                    test_data: case.test_data.clone(),
                    status: TestStatus::Pending,
                    notes: None,
                    tested_at: None,
                    created_at: now,
                    updated_at: now,
                });
                created += 1;
            }
        }
    }

    log::info!(
        "[casebook.import] Page {}: {} created, {} updated",
        page_id,
        created,
        updated
    );

    ImportOutcome {
        created,
        updated,
        resolved_page_id: page_id,
        page_created,
        collection,
    }
}

/// Find the target page by id or name, creating it when no id was given.
fn resolve_page(collection: &mut Collection, request: &ImportRequest, now: i64) -> (String, bool) {
    let target = request.target_page_id.as_deref().filter(|id| !id.is_empty());

    let existing = collection
        .pages
        .iter()
        .find(|p| Some(p.id.as_str()) == target || p.name == request.page_name);
    if let Some(page) = existing {
        return (page.id.clone(), false);
    }

    if let Some(id) = target {
        log::warn!(
            "[casebook.import] Target page {} does not exist, importing into it anyway",
            id
        );
        return (id.to_string(), false);
    }

    let page = Page {
        id: generate_id(PAGE_PREFIX),
        name: request.page_name.clone(),
        display_name: request.page_display_name.clone(),
        description: None,
        created_at: now,
        updated_at: now,
    };
    let id = page.id.clone();
    log::info!("[casebook.import] Created page {} ({})", page.name, id);
    collection.pages.push(page);
    (id, true)
}

/// Return the id of the page category for the case's path, creating it if needed.
fn ensure_category(
    collection: &mut Collection,
    page_id: &str,
    case: &ParsedTestCase,
    next_order: &mut u32,
) -> String {
    let full_path = case.full_path();
    if let Some(category) = collection
        .categories
        .iter()
        .find(|c| c.page_id == page_id && c.full_path == full_path)
    {
        return category.id.clone();
    }

    let path = &case.category_path;
    let category = Category {
        id: generate_id(CATEGORY_PREFIX),
        page_id: page_id.to_string(),
        name: path
            .last()
            .cloned()
            .unwrap_or_else(|| UNCATEGORIZED.to_string()),
        parent_name: if path.len() > 1 {
            path.first().cloned()
        } else {
            None
        },
        full_path,
        order: *next_order,
    };
    *next_order += 1;
    let id = category.id.clone();
    collection.categories.push(category);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_markdown_test_cases;
    use crate::types::Priority;

    const DOC: &str = "\
## 登录
### 表单
#### TC-LG-001: 正常登录
- **优先级**: P0
- **测试步骤**:
1. 输入账号
- **预期结果**:
- 进入首页
#### TC-LG-002: 密码错误
## 设置
#### TC-ST-001: 修改昵称
";

    fn request(name: &str) -> ImportRequest {
        ImportRequest {
            target_page_id: None,
            page_name: name.to_string(),
            page_display_name: format!("{} display", name),
        }
    }

    fn parsed(doc: &str) -> Vec<ParsedTestCase> {
        parse_markdown_test_cases(doc).test_cases
    }

    fn import_doc(collection: Collection, page: &str, doc: &str, now: i64) -> ImportOutcome {
        import_test_cases_at(collection, &request(page), &parsed(doc), now)
    }

    #[test]
    fn test_first_import_creates_page_categories_and_cases() {
        let outcome = import_doc(Collection::default(), "LoginPage", DOC, 100);
        assert!(outcome.page_created);
        assert_eq!(outcome.created, 3);
        assert_eq!(outcome.updated, 0);

        let collection = &outcome.collection;
        assert_eq!(collection.pages.len(), 1);
        assert_eq!(collection.pages[0].name, "LoginPage");
        assert_eq!(collection.pages[0].display_name, "LoginPage display");

        let paths: Vec<&str> = collection.categories.iter().map(|c| c.full_path.as_str()).collect();
        assert_eq!(paths, vec!["登录 > 表单", "设置"]);
        assert_eq!(collection.categories[0].name, "表单");
        assert_eq!(collection.categories[0].parent_name.as_deref(), Some("登录"));
        assert_eq!(collection.categories[1].parent_name, None);

        let first = &collection.test_cases[0];
        assert_eq!(first.status, TestStatus::Pending);
        assert_eq!(first.priority, Priority::P0);
        assert_eq!(first.created_at, 100);
        assert_eq!(first.category_id, collection.categories[0].id);
        // Both cases under the same path share one category.
        assert_eq!(collection.test_cases[1].category_id, first.category_id);
    }

    #[test]
    fn test_reimport_updates_and_preserves_user_state() {
        let cases = parsed(DOC);
        let first = import_test_cases_at(Collection::default(), &request("LoginPage"), &cases, 100);
        let mut collection = first.collection;
        collection.test_cases[0].status = TestStatus::Passed;
        collection.test_cases[0].notes = Some("ok".to_string());
        collection.test_cases[0].tested_at = Some(150);
        let before = collection.test_cases.clone();

        let second = import_test_cases_at(collection, &request("LoginPage"), &cases, 200);
        assert!(!second.page_created);
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 3);
        assert_eq!(second.collection.categories.len(), 2);

        for (old, new) in before.iter().zip(second.collection.test_cases.iter()) {
            assert_eq!(old.id, new.id);
            assert_eq!(old.status, new.status);
            assert_eq!(old.notes, new.notes);
            assert_eq!(old.tested_at, new.tested_at);
            assert_eq!(old.created_at, new.created_at);
            assert_eq!(new.updated_at, 200);
        }
    }

    #[test]
    fn test_changed_title_keeps_status_and_notes() {
        let first = import_test_cases_at(
            Collection::default(),
            &request("LoginPage"),
            &parsed("#### TC-LG-001: Old title\n"),
            1,
        );
        let mut collection = first.collection;
        collection.test_cases[0].status = TestStatus::Passed;
        collection.test_cases[0].notes = Some("ok".to_string());

        let second = import_test_cases_at(
            collection,
            &request("LoginPage"),
            &parsed("## Moved\n#### TC-LG-001: New title\n"),
            2,
        );
        let tc = &second.collection.test_cases[0];
        assert_eq!(tc.title, "New title");
        assert_eq!(tc.status, TestStatus::Passed);
        assert_eq!(tc.notes.as_deref(), Some("ok"));
        let category = second
            .collection
            .categories
            .iter()
            .find(|c| c.id == tc.category_id)
            .unwrap();
        assert_eq!(category.full_path, "Moved");
    }

    #[test]
    fn test_cases_missing_from_batch_are_kept() {
        let first = import_doc(Collection::default(), "LoginPage", DOC, 1);
        let second = import_test_cases_at(
            first.collection,
            &request("LoginPage"),
            &parsed("#### TC-NEW-001: Added\n"),
            2,
        );
        assert_eq!(second.created, 1);
        let codes: Vec<&str> = second
            .collection
            .test_cases
            .iter()
            .map(|tc| tc.code.as_str())
            .collect();
        assert_eq!(codes, vec!["TC-LG-001", "TC-LG-002", "TC-ST-001", "TC-NEW-001"]);
    }

    #[test]
    fn test_uncategorized_cases() {
        let outcome = import_test_cases_at(
            Collection::default(),
            &request("LoginPage"),
            &parsed("#### TC-001: Loose\n#### TC-002: Also loose\n"),
            1,
        );
        assert_eq!(outcome.collection.categories.len(), 1);
        let category = &outcome.collection.categories[0];
        assert_eq!(category.name, UNCATEGORIZED);
        assert_eq!(category.full_path, UNCATEGORIZED);
    }

    #[test]
    fn test_category_order_increases_across_runs() {
        let first = import_doc(Collection::default(), "LoginPage", DOC, 1);
        let second = import_test_cases_at(
            first.collection,
            &request("LoginPage"),
            &parsed("## 新分类\n#### TC-NEW-001: x\n## 另一个\n#### TC-NEW-002: y\n"),
            2,
        );
        let orders: Vec<u32> = second.collection.categories.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_category_order_is_per_page() {
        let first = import_doc(Collection::default(), "LoginPage", DOC, 1);
        let second = import_doc(first.collection, "SettingsPage", DOC, 2);
        let page_id = second.resolved_page_id.clone();
        let orders: Vec<u32> = second
            .collection
            .categories_for_page(&page_id)
            .map(|c| c.order)
            .collect();
        assert_eq!(orders, vec![0, 1]);
    }

    #[test]
    fn test_same_code_on_other_page_is_not_matched() {
        let first = import_doc(Collection::default(), "LoginPage", DOC, 1);
        let second = import_doc(first.collection, "OtherPage", DOC, 2);
        assert!(second.page_created);
        assert_eq!(second.created, 3);
        assert_eq!(second.collection.test_cases.len(), 6);
    }

    #[test]
    fn test_page_resolved_by_name_or_id() {
        let first = import_doc(Collection::default(), "LoginPage", DOC, 1);
        let page_id = first.resolved_page_id.clone();

        let by_id = ImportRequest {
            target_page_id: Some(page_id.clone()),
            page_name: "Renamed".to_string(),
            page_display_name: String::new(),
        };
        let second = import_test_cases_at(first.collection, &by_id, &parsed(DOC), 2);
        assert_eq!(second.resolved_page_id, page_id);
        assert_eq!(second.updated, 3);
        assert_eq!(second.collection.pages.len(), 1);
    }

    #[test]
    fn test_unknown_target_page_id_is_used_as_is() {
        let req = ImportRequest {
            target_page_id: Some("page-external".to_string()),
            page_name: "LoginPage".to_string(),
            page_display_name: String::new(),
        };
        let outcome = import_test_cases_at(Collection::default(), &req, &parsed(DOC), 1);
        assert!(!outcome.page_created);
        assert_eq!(outcome.resolved_page_id, "page-external");
        assert!(outcome.collection.pages.is_empty());
        assert!(outcome
            .collection
            .test_cases
            .iter()
            .all(|tc| tc.page_id == "page-external"));
    }

    #[test]
    fn test_duplicate_code_in_batch_keeps_one_record() {
        let outcome = import_test_cases_at(
            Collection::default(),
            &request("LoginPage"),
            &parsed("#### TC-001: First\n#### TC-001: Second\n"),
            1,
        );
        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.collection.test_cases.len(), 1);
        assert_eq!(outcome.collection.test_cases[0].title, "Second");
    }
}
