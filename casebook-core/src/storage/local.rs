/// Local filesystem storage backend.
///
/// Keeps the whole collection in one JSON snapshot file with:
/// - Load on open (missing file = empty collection)
/// - Atomic writes (write to .tmp, fsync, rename)
/// - Mutex-guarded mutations so concurrent callers cannot interleave
/// - In-memory state replaced only after the file write succeeded

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use super::{CaseStorage, ImportReport, StorageError};
use crate::import::{import_test_cases_at, ImportRequest};
use crate::snapshot::Snapshot;
use crate::types::*;

#[derive(Debug, Clone, Default)]
struct StoreState {
    collection: Collection,
    last_updated: i64,
}

/// JSON file backed collection storage.
pub struct LocalStorage {
    path: PathBuf,
    state: RwLock<StoreState>,
    /// Serializes read-modify-write cycles
    write_lock: Mutex<()>,
}

impl LocalStorage {
    /// Open the store at `path`, loading it if the file exists.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let state = if path.exists() {
            let content = fs::read_to_string(path)?;
            let snapshot = Snapshot::from_json(&content)?;
            let last_updated = snapshot.last_updated;
            let collection = snapshot.into_collection();
            log::info!(
                "[casebook.storage] Loaded {} pages, {} test cases from {}",
                collection.pages.len(),
                collection.test_cases.len(),
                path.display()
            );
            StoreState {
                collection,
                last_updated,
            }
        } else {
            log::info!(
                "[casebook.storage] No store at {}, starting empty",
                path.display()
            );
            StoreState::default()
        };

        Ok(Self {
            path: path.to_path_buf(),
            state: RwLock::new(state),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` to a copy of the collection, persist it, then publish it.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Collection, i64) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let now = now_millis();
        let mut collection = self.read_state().collection.clone();
        let value = f(&mut collection, now)?;

        let content = Snapshot::new(collection.clone(), now).to_json_pretty()?;
        Self::atomic_write(&self.path, &content)?;

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.collection = collection;
        state.last_updated = now;
        Ok(value)
    }

    /// Atomic write with fsync: write to .tmp, fsync, rename, fsync directory.
    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let tmp_path = path.with_extension("casebook.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;

        // fsync directory for rename durability
        if let Some(dir) = path.parent() {
            if let Ok(d) = fs::File::open(dir) {
                let _ = d.sync_all();
            }
        }
        Ok(())
    }
}

impl CaseStorage for LocalStorage {
    fn list_pages(&self) -> Vec<PageSummary> {
        let state = self.read_state();
        let collection = &state.collection;
        collection
            .pages
            .iter()
            .map(|page| PageSummary {
                id: page.id.clone(),
                name: page.name.clone(),
                display_name: page.display_name.clone(),
                category_count: collection.categories_for_page(&page.id).count(),
                statistics: collection.statistics(Some(&page.id)),
            })
            .collect()
    }

    fn collection(&self) -> Collection {
        self.read_state().collection.clone()
    }

    fn test_cases(&self, page_id: Option<&str>, status: Option<TestStatus>) -> Vec<TestCase> {
        let state = self.read_state();
        let collection = &state.collection;
        let wanted = |tc: &&TestCase| status.map_or(true, |s| tc.status == s);
        match page_id {
            Some(id) => collection
                .test_cases_for_page(id)
                .filter(wanted)
                .cloned()
                .collect(),
            None => collection.test_cases.iter().filter(wanted).cloned().collect(),
        }
    }

    fn import_parsed(
        &self,
        request: &ImportRequest,
        parsed: &[ParsedTestCase],
    ) -> Result<ImportReport, StorageError> {
        if parsed.is_empty() {
            log::info!("[casebook.storage] Import skipped, no test cases found");
            return Ok(ImportReport::NothingFound);
        }

        self.mutate(|collection, now| {
            let outcome = import_test_cases_at(std::mem::take(collection), request, parsed, now);
            *collection = outcome.collection;
            Ok(ImportReport::Imported {
                created: outcome.created,
                updated: outcome.updated,
                page_id: outcome.resolved_page_id,
                page_created: outcome.page_created,
            })
        })
    }

    fn update_test_case_status(
        &self,
        test_case_id: &str,
        status: TestStatus,
        notes: Option<String>,
    ) -> Result<TestCase, StorageError> {
        self.mutate(|collection, now| {
            let tc = collection
                .test_cases
                .iter_mut()
                .find(|tc| tc.id == test_case_id)
                .ok_or_else(|| StorageError::TestCaseNotFound(test_case_id.to_string()))?;

            tc.status = status;
            if notes.is_some() {
                tc.notes = notes;
            }
            if status != TestStatus::Pending {
                tc.tested_at = Some(now);
            }
            tc.updated_at = now;
            log::debug!(
                "[casebook.storage] {} ({}) marked {}",
                tc.code,
                tc.id,
                status
            );
            Ok(tc.clone())
        })
    }

    fn delete_page(&self, page_id: &str) -> Result<(), StorageError> {
        self.mutate(|collection, _| {
            if !collection.remove_page(page_id) {
                return Err(StorageError::PageNotFound(page_id.to_string()));
            }
            log::info!("[casebook.storage] Deleted page {}", page_id);
            Ok(())
        })
    }

    fn statistics(&self, page_id: Option<&str>) -> Statistics {
        self.read_state().collection.statistics(page_id)
    }

    fn export_snapshot(&self) -> Result<String, StorageError> {
        let state = self.read_state();
        let snapshot = Snapshot::new(state.collection.clone(), state.last_updated);
        Ok(snapshot.to_json_pretty()?)
    }

    fn restore_snapshot(&self, json: &str) -> Result<(), StorageError> {
        let restored = Snapshot::from_json(json)?.into_collection();
        self.mutate(|collection, _| {
            log::info!(
                "[casebook.storage] Restoring snapshot: {} pages, {} test cases",
                restored.pages.len(),
                restored.test_cases.len()
            );
            *collection = restored;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParserConfig;

    const DOC: &str = "\
# 登录页测试用例文档
## 登录
### 表单
#### TC-LG-001: 正常登录
- **优先级**: P0
#### TC-LG-002: 密码错误
";

    fn request() -> ImportRequest {
        ImportRequest {
            target_page_id: None,
            page_name: "LoginPage".to_string(),
            page_display_name: "登录页".to_string(),
        }
    }

    fn open_temp() -> (tempfile::TempDir, LocalStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::open(&dir.path().join("store.json")).unwrap();
        (dir, storage)
    }

    fn import_doc(storage: &LocalStorage) -> ImportReport {
        storage
            .import_markdown(DOC, &request(), &ParserConfig::default())
            .unwrap()
    }

    #[test]
    fn test_open_missing_file_is_empty() {
        let (_dir, storage) = open_temp();
        assert!(storage.list_pages().is_empty());
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_import_persists_and_reloads() {
        let (dir, storage) = open_temp();
        let report = import_doc(&storage);
        let ImportReport::Imported { created, updated, page_created, .. } = report else {
            panic!("expected an import");
        };
        assert_eq!((created, updated, page_created), (2, 0, true));

        let reopened = LocalStorage::open(&dir.path().join("store.json")).unwrap();
        assert_eq!(reopened.collection(), storage.collection());
        assert_eq!(reopened.list_pages()[0].statistics.total, 2);
        assert_eq!(reopened.list_pages()[0].category_count, 1);
    }

    #[test]
    fn test_empty_document_reports_nothing_found() {
        let (_dir, storage) = open_temp();
        let report = storage
            .import_markdown("## Only headings\nprose\n", &request(), &ParserConfig::default())
            .unwrap();
        assert_eq!(report, ImportReport::NothingFound);
        assert!(!storage.path().exists());
    }

    #[test]
    fn test_status_survives_reimport() {
        let (_dir, storage) = open_temp();
        import_doc(&storage);
        let id = storage.collection().test_cases[0].id.clone();

        let updated = storage
            .update_test_case_status(&id, TestStatus::Passed, Some("ok".to_string()))
            .unwrap();
        assert_eq!(updated.status, TestStatus::Passed);
        assert!(updated.tested_at.is_some());

        let report = import_doc(&storage);
        assert!(matches!(report, ImportReport::Imported { created: 0, updated: 2, .. }));

        let tc = storage
            .collection()
            .test_cases
            .into_iter()
            .find(|tc| tc.id == id)
            .unwrap();
        assert_eq!(tc.status, TestStatus::Passed);
        assert_eq!(tc.notes.as_deref(), Some("ok"));
        assert_eq!(tc.tested_at, updated.tested_at);
    }

    #[test]
    fn test_status_back_to_pending_keeps_notes_and_tested_at() {
        let (_dir, storage) = open_temp();
        import_doc(&storage);
        let id = storage.collection().test_cases[0].id.clone();
        let failed = storage
            .update_test_case_status(&id, TestStatus::Failed, Some("crash".to_string()))
            .unwrap();
        let pending = storage
            .update_test_case_status(&id, TestStatus::Pending, None)
            .unwrap();
        assert_eq!(pending.notes.as_deref(), Some("crash"));
        assert_eq!(pending.tested_at, failed.tested_at);
    }

    #[test]
    fn test_list_test_cases_by_page_and_status() {
        let (_dir, storage) = open_temp();
        let ImportReport::Imported { page_id, .. } = import_doc(&storage) else {
            panic!("expected an import");
        };
        let other = ImportRequest {
            page_name: "SettingsPage".to_string(),
            ..request()
        };
        storage
            .import_markdown("#### TC-ST-001: 修改昵称\n", &other, &ParserConfig::default())
            .unwrap();

        let all = storage.test_cases(None, None);
        assert_eq!(all.len(), 3);

        let login = storage.test_cases(Some(&page_id), None);
        let codes: Vec<&str> = login.iter().map(|tc| tc.code.as_str()).collect();
        assert_eq!(codes, vec!["TC-LG-001", "TC-LG-002"]);

        storage
            .update_test_case_status(&login[1].id, TestStatus::Failed, None)
            .unwrap();
        let failed = storage.test_cases(Some(&page_id), Some(TestStatus::Failed));
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].code, "TC-LG-002");
        assert_eq!(storage.test_cases(None, Some(TestStatus::Pending)).len(), 2);
        assert!(storage.test_cases(Some("page-missing"), None).is_empty());
    }

    #[test]
    fn test_update_unknown_test_case() {
        let (_dir, storage) = open_temp();
        let err = storage
            .update_test_case_status("tc-missing", TestStatus::Passed, None)
            .unwrap_err();
        assert!(matches!(err, StorageError::TestCaseNotFound(_)));
    }

    #[test]
    fn test_delete_page_cascades() {
        let (_dir, storage) = open_temp();
        let ImportReport::Imported { page_id, .. } = import_doc(&storage) else {
            panic!("expected an import");
        };
        storage.delete_page(&page_id).unwrap();
        let collection = storage.collection();
        assert!(collection.pages.is_empty());
        assert!(collection.categories.is_empty());
        assert!(collection.test_cases.is_empty());

        assert!(matches!(
            storage.delete_page(&page_id),
            Err(StorageError::PageNotFound(_))
        ));
    }

    #[test]
    fn test_export_and_restore() {
        let (_dir, storage) = open_temp();
        import_doc(&storage);
        let exported = storage.export_snapshot().unwrap();

        let (_other_dir, other) = open_temp();
        other.restore_snapshot(&exported).unwrap();
        assert_eq!(other.collection(), storage.collection());
        assert_eq!(other.statistics(None).total, 2);
    }

    #[test]
    fn test_invalid_restore_leaves_state_untouched() {
        let (_dir, storage) = open_temp();
        import_doc(&storage);
        let before = storage.collection();
        let err = storage.restore_snapshot(r#"{"pages": []}"#).unwrap_err();
        assert!(matches!(err, StorageError::Snapshot(_)));
        assert_eq!(storage.collection(), before);
    }

    #[test]
    fn test_open_corrupt_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            LocalStorage::open(&path),
            Err(StorageError::Snapshot(_))
        ));
    }
}
