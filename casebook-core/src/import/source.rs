/// Reading test case documents from disk.
///
/// The read is the only asynchronous step of an import. Parsing starts after
/// the whole file has been read and decoded.
use std::path::{Path, PathBuf};

use super::reconcile::ImportRequest;
use crate::config::ParserConfig;
use crate::parser::{
    extract_page_display_name, extract_page_name_from_path, parse_markdown_test_cases_with,
};
use crate::types::ParseResult;

/// Page name used when neither the caller nor the file path provides one.
pub const FALLBACK_PAGE_NAME: &str = "UnknownPage";

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Not a Markdown (.md) file: {0}")]
    NotMarkdown(PathBuf),

    #[error("File is not UTF-8 text: {0}")]
    NotText(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A document that has been read and parsed.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
    pub parsed: ParseResult,
    pub display_name: Option<String>,
    pub page_name: Option<String>,
}

impl Document {
    /// Build an import request, preferring explicit values over ones derived
    /// from the document.
    pub fn import_request(
        &self,
        target_page_id: Option<String>,
        page_name: Option<String>,
        display_name: Option<String>,
    ) -> ImportRequest {
        let page_name = page_name
            .or_else(|| self.page_name.clone())
            .unwrap_or_else(|| FALLBACK_PAGE_NAME.to_string());
        let page_display_name = display_name
            .or_else(|| self.display_name.clone())
            .unwrap_or_else(|| page_name.clone());
        ImportRequest {
            target_page_id,
            page_name,
            page_display_name,
        }
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("md"))
}

/// Read a `.md` file as text. The extension is checked before any I/O.
pub async fn read_markdown_file(path: &Path) -> Result<String, SourceError> {
    if !is_markdown(path) {
        return Err(SourceError::NotMarkdown(path.to_path_buf()));
    }
    let bytes = tokio::fs::read(path).await.map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| SourceError::NotText(path.to_path_buf()))
}

/// Read and parse a document, deriving page names from its heading and path.
pub async fn load_document(path: &Path, config: &ParserConfig) -> Result<Document, SourceError> {
    let text = read_markdown_file(path).await?;
    let parsed = parse_markdown_test_cases_with(&text, config);
    if parsed.is_empty() {
        log::warn!(
            "[casebook.source] No test cases found in {}",
            path.display()
        );
    }
    Ok(Document {
        path: path.to_path_buf(),
        display_name: extract_page_display_name(&text),
        page_name: extract_page_name_from_path(path),
        parsed,
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_wrong_extension_without_reading() {
        let err = read_markdown_file(Path::new("/definitely/missing/cases.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::NotMarkdown(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_markdown_file(&dir.path().join("missing.md"))
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }

    #[tokio::test]
    async fn test_non_utf8_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("binary.md");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).unwrap();
        let err = read_markdown_file(&path).await.unwrap_err();
        assert!(matches!(err, SourceError::NotText(_)));
    }

    #[tokio::test]
    async fn test_load_document_derives_names() {
        let dir = tempfile::tempdir().unwrap();
        let page_dir = dir.path().join("ScriptPage");
        std::fs::create_dir_all(&page_dir).unwrap();
        let path = page_dir.join("cases.MD");
        std::fs::write(&path, "# 台词页面测试用例文档\n## A\n#### TC-001: x\n").unwrap();

        let doc = load_document(&path, &ParserConfig::default()).await.unwrap();
        assert_eq!(doc.parsed.test_cases.len(), 1);
        assert_eq!(doc.display_name.as_deref(), Some("台词页面"));
        assert_eq!(doc.page_name.as_deref(), Some("ScriptPage"));

        let request = doc.import_request(None, None, None);
        assert_eq!(request.page_name, "ScriptPage");
        assert_eq!(request.page_display_name, "台词页面");
    }

    #[test]
    fn test_import_request_fallbacks() {
        let doc = Document {
            path: PathBuf::from("cases.md"),
            text: String::new(),
            parsed: ParseResult::default(),
            display_name: None,
            page_name: None,
        };
        let request = doc.import_request(Some("page-1".to_string()), None, None);
        assert_eq!(request.target_page_id.as_deref(), Some("page-1"));
        assert_eq!(request.page_name, FALLBACK_PAGE_NAME);
        assert_eq!(request.page_display_name, FALLBACK_PAGE_NAME);
    }
}
