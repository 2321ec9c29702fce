// Local filesystem adapter - File and scratch directory operations

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::debug;
use walkdir::WalkDir;

use crate::domain::errors::*;
use crate::ports::*;

/// Filesystem adapter backed by `std::fs`, run on the blocking pool
#[derive(Debug, Clone, Default)]
pub struct FsLocalAdapter;

impl FsLocalAdapter {
    pub fn new() -> Self {
        Self
    }

    fn clear_directory_blocking(dir_path: &Path) -> Result<ClearReport, DomainError> {
        let mut report = ClearReport::default();
        if !dir_path.exists() {
            return Ok(report);
        }

        for entry in WalkDir::new(dir_path).min_depth(1).into_iter().flatten() {
            if entry.file_type().is_file() {
                report.files_removed += 1;
                report.bytes_freed += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }

        for entry in fs::read_dir(dir_path)
            .map_err(|e| DomainError::FsFail(format!("Failed to read directory: {}", e)))?
        {
            let path = entry
                .map_err(|e| DomainError::FsFail(format!("Failed to read entry: {}", e)))?
                .path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            result.map_err(|e| {
                DomainError::FsFail(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }

        debug!(
            "cleared {} ({} files, {} bytes)",
            dir_path.display(),
            report.files_removed,
            report.bytes_freed
        );
        Ok(report)
    }
}

async fn blocking<T, F>(f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::FsFail(format!("Filesystem task failed: {}", e)))?
}

#[async_trait]
impl FsPort for FsLocalAdapter {
    async fn file_exists(&self, file_path: &Path) -> Result<bool, DomainError> {
        Ok(tokio::fs::metadata(file_path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false))
    }

    async fn file_size(&self, file_path: &Path) -> Result<u64, DomainError> {
        let metadata = tokio::fs::metadata(file_path)
            .await
            .map_err(|e| DomainError::FsFail(format!("Failed to get file size: {}", e)))?;
        Ok(metadata.len())
    }

    async fn delete_file(&self, file_path: &Path) -> Result<(), DomainError> {
        tokio::fs::remove_file(file_path).await.map_err(|e| {
            DomainError::FsFail(format!("Failed to delete {}: {}", file_path.display(), e))
        })
    }

    async fn ensure_writable_dir(&self, dir_path: &Path) -> Result<(), DomainError> {
        let dir = dir_path.to_path_buf();
        blocking(move || {
            fs::create_dir_all(&dir).map_err(|e| {
                DomainError::FsFail(format!("Failed to create {}: {}", dir.display(), e))
            })?;
            // a real write catches read-only mounts that permission bits miss
            tempfile::NamedTempFile::new_in(&dir).map_err(|e| {
                DomainError::FsFail(format!("{} is not writable: {}", dir.display(), e))
            })?;
            Ok(())
        })
        .await
    }

    async fn clear_directory(&self, dir_path: &Path) -> Result<ClearReport, DomainError> {
        let dir = dir_path.to_path_buf();
        blocking(move || Self::clear_directory_blocking(&dir)).await
    }
}
