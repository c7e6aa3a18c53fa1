//! SAM.gov import: loads every `*.json` export in the data directory

use super::{now, JobContext};
use athena_common::errors::{AppError, Result};
use athena_common::metrics::record_import;
use athena_core::db::models::SyncStatus;
use chrono::{DateTime, FixedOffset};
use athena_core::loader::{LoadSummary, SamGovLoader};
use athena_core::services::sync_log::{CreateSyncLog, SYNC_TYPE_SAM_GOV_IMPORT};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub async fn run(ctx: &JobContext) -> Result<LoadSummary> {
    let started_at = now();
    let data_dir = Path::new(&ctx.config.tasks.import.data_dir);

    let outcome = import_directory(&ctx.loader, data_dir).await;

    let log = match &outcome {
        Ok(import) => {
            record_import(import.summary.loaded);
            import.sync_log(started_at)
        }
        Err(e) => {
            let mut log = CreateSyncLog::completed(SYNC_TYPE_SAM_GOV_IMPORT, SyncStatus::Failed, started_at);
            log.error_count = Some(1);
            log.error_log = Some(e.to_string());
            log
        }
    };
    ctx.record_sync(log).await;

    outcome.map(|import| import.summary)
}

/// Record counts across all files, plus the files that could not be read at all
#[derive(Debug, Default)]
pub struct DirectoryImport {
    pub summary: LoadSummary,
    pub failed_files: Vec<String>,
}

impl DirectoryImport {
    /// A run with any unreadable file is FAILED even when other files loaded
    pub fn sync_log(&self, started_at: DateTime<FixedOffset>) -> CreateSyncLog {
        let status = if self.failed_files.is_empty() {
            SyncStatus::Success
        } else {
            SyncStatus::Failed
        };

        let mut log = CreateSyncLog::completed(SYNC_TYPE_SAM_GOV_IMPORT, status, started_at);
        log.records_processed = Some(clamp_count(self.summary.loaded));
        log.error_count = Some(clamp_count(self.summary.failed + self.failed_files.len()));
        if !self.failed_files.is_empty() {
            log.error_log = Some(self.failed_files.join("\n"));
        }
        log
    }
}

fn clamp_count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

async fn import_directory(loader: &SamGovLoader, data_dir: &Path) -> Result<DirectoryImport> {
    let files = list_json_files(data_dir).await?;
    info!(dir = %data_dir.display(), files = files.len(), "Found SAM.gov export files");

    let mut import = DirectoryImport::default();
    for file in files {
        match loader.load_file(&file).await {
            Ok(summary) => {
                info!(
                    file = %file.display(),
                    loaded = summary.loaded,
                    skipped = summary.skipped,
                    failed = summary.failed,
                    "Imported file"
                );
                import.summary.merge(summary);
            }
            // One unreadable file does not stop the rest
            Err(e) => {
                error!(file = %file.display(), error = %e, "Failed to import file");
                import.failed_files.push(e.to_string());
            }
        }
    }

    Ok(import)
}

/// `*.json` files directly under `dir`, sorted by name.
/// A missing directory yields an empty list.
pub async fn list_json_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "Data directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(AppError::Internal {
                message: format!("Failed to read {}: {}", dir.display(), e),
            })
        }
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| AppError::Internal {
        message: format!("Failed to scan {}: {}", dir.display(), e),
    })? {
        let path = entry.path();
        let is_json = path.extension().is_some_and(|ext| ext == "json");
        if is_json && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use athena_core::DbPool;
    use sea_orm::DatabaseConnection;
    use uuid::Uuid;

    fn offline_loader() -> SamGovLoader {
        SamGovLoader::new(DbPool::from_connection(DatabaseConnection::Disconnected))
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let dir = std::env::temp_dir().join(format!("athena-missing-{}", Uuid::new_v4()));
        assert!(list_json_files(&dir).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lists_json_files_sorted() {
        let dir = std::env::temp_dir().join(format!("athena-import-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(dir.join("nested.json")).await.unwrap();
        for name in ["b-2026-10-02.json", "a-2026-10-01.json", "notes.txt"] {
            tokio::fs::write(dir.join(name), "[]").await.unwrap();
        }

        let files = list_json_files(&dir).await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a-2026-10-01.json", "b-2026-10-02.json"]);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_file_fails_the_run() {
        let dir = std::env::temp_dir().join(format!("athena-import-{}", Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        tokio::fs::write(dir.join("a-empty.json"), "[]").await.unwrap();
        tokio::fs::write(dir.join("b-truncated.json"), "[{\"noticeId\": ").await.unwrap();

        let import = import_directory(&offline_loader(), &dir).await.unwrap();
        assert_eq!(import.summary, LoadSummary::default());
        assert_eq!(import.failed_files.len(), 1);
        assert!(import.failed_files[0].contains("b-truncated.json"));

        let log = import.sync_log(now());
        assert_eq!(log.status, String::from(SyncStatus::Failed));
        assert_eq!(log.error_count, Some(1));
        assert_eq!(log.records_processed, Some(0));
        assert!(log.error_log.unwrap().contains("b-truncated.json"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[test]
    fn test_clean_run_is_success() {
        let import = DirectoryImport {
            summary: LoadSummary { loaded: 3, skipped: 2, failed: 1 },
            failed_files: Vec::new(),
        };

        let log = import.sync_log(now());
        assert_eq!(log.status, String::from(SyncStatus::Success));
        assert_eq!(log.records_processed, Some(3));
        assert_eq!(log.error_count, Some(1));
        assert!(log.error_log.is_none());
    }
}
