use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use casebook_core::import::source::load_document;
use casebook_core::snapshot::backup_file_name;
use casebook_core::storage::local::LocalStorage;
use casebook_core::storage::{CaseStorage, ImportReport};
use casebook_core::types::Statistics;

use crate::config::{default_config_path, load_config, CliConfig};
use crate::{Cli, Commands};

/// Exit code for a document without any test case headings.
const EXIT_NOTHING_FOUND: u8 = 2;

pub async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let config = load_config(&config_path);
    let store_path = cli.store.clone().unwrap_or_else(|| config.store_path());

    match cli.command {
        Commands::Parse { file, compact } => parse(&file, compact, &config).await,
        Commands::Import {
            file,
            page_id,
            page_name,
            display_name,
        } => {
            let storage = open_store(&store_path)?;
            import(&storage, &config, &file, page_id, page_name, display_name).await
        }
        Commands::Cases { page_id, status } => {
            let storage = open_store(&store_path)?;
            if let Some(id) = &page_id {
                ensure_page(&storage, id)?;
            }
            for tc in storage.test_cases(page_id.as_deref(), status) {
                println!("{}  {}  {:<7}  {}", tc.id, tc.code, tc.status.as_str(), tc.title);
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status { id, status, notes } => {
            let storage = open_store(&store_path)?;
            let tc = storage.update_test_case_status(&id, status, notes)?;
            println!("{} {} -> {}", tc.code, tc.title, tc.status);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stats { page_id } => {
            let storage = open_store(&store_path)?;
            if let Some(id) = &page_id {
                ensure_page(&storage, id)?;
            }
            print_statistics(&storage.statistics(page_id.as_deref()));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Pages => {
            let storage = open_store(&store_path)?;
            for page in storage.list_pages() {
                println!(
                    "{}  {} ({})  categories: {}  cases: {}  passed: {}  failed: {}",
                    page.id,
                    page.display_name,
                    page.name,
                    page.category_count,
                    page.statistics.total,
                    page.statistics.passed,
                    page.statistics.failed
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::DeletePage { page_id } => {
            let storage = open_store(&store_path)?;
            storage.delete_page(&page_id)?;
            println!("Deleted page {}", page_id);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Export { path } => {
            let storage = open_store(&store_path)?;
            let path = path.unwrap_or_else(|| {
                PathBuf::from(backup_file_name(chrono::Local::now().date_naive()))
            });
            let json = storage.export_snapshot()?;
            tokio::fs::write(&path, json)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported to {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Restore { path } => {
            let storage = open_store(&store_path)?;
            let json = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            storage
                .restore_snapshot(&json)
                .with_context(|| format!("failed to restore {}", path.display()))?;
            println!("Restored from {}", path.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_store(path: &Path) -> Result<LocalStorage> {
    LocalStorage::open(path).with_context(|| format!("failed to open store {}", path.display()))
}

/// Page-scoped listings of an unknown page id would print nothing.
fn ensure_page(storage: &LocalStorage, page_id: &str) -> Result<()> {
    if storage.collection().page(page_id).is_none() {
        anyhow::bail!("page not found: {}", page_id);
    }
    Ok(())
}

async fn parse(file: &Path, compact: bool, config: &CliConfig) -> Result<ExitCode> {
    let doc = load_document(file, &config.parser).await?;
    let output = serde_json::json!({
        "displayName": doc.display_name,
        "pageName": doc.page_name,
        "categories": doc.parsed.categories,
        "testCases": doc.parsed.test_cases,
    });
    let text = if compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{}", text);
    Ok(ExitCode::SUCCESS)
}

async fn import(
    storage: &LocalStorage,
    config: &CliConfig,
    file: &Path,
    page_id: Option<String>,
    page_name: Option<String>,
    display_name: Option<String>,
) -> Result<ExitCode> {
    let doc = load_document(file, &config.parser).await?;
    let request = doc.import_request(page_id, page_name, display_name);

    match storage.import_parsed(&request, &doc.parsed.test_cases)? {
        ImportReport::NothingFound => {
            eprintln!(
                "No test cases found in {}. Test cases need headings like `#### TC-XX-001: Title`.",
                file.display()
            );
            Ok(ExitCode::from(EXIT_NOTHING_FOUND))
        }
        ImportReport::Imported {
            created,
            updated,
            page_id,
            page_created,
        } => {
            if page_created {
                println!("Created page {} ({})", request.page_name, page_id);
            }
            println!(
                "Imported into {}: {} created, {} updated",
                page_id, created, updated
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_statistics(stats: &Statistics) {
    println!("total:   {}", stats.total);
    println!("pending: {}", stats.pending);
    println!("failed:  {}", stats.failed);
    println!("passed:  {}", stats.passed);
}
