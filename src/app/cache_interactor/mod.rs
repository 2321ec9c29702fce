// Cache interactor - Scratch directory maintenance

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::app::compress_interactor::JobRegistry;
use crate::domain::errors::*;
use crate::ports::*;

/// Interactor for clearing produced outputs
pub struct CacheInteractor {
    fs_port: Arc<dyn FsPort>,
    registry: Arc<JobRegistry>,
    scratch_dir: PathBuf,
}

impl CacheInteractor {
    pub fn new(fs_port: Arc<dyn FsPort>, registry: Arc<JobRegistry>, scratch_dir: PathBuf) -> Self {
        Self {
            fs_port,
            registry,
            scratch_dir,
        }
    }

    /// Remove everything in the scratch directory.
    ///
    /// Refused while a job is active since its output lives there.
    pub async fn delete_all_cache(&self) -> Result<ClearReport, DomainError> {
        if let Some(id) = self.registry.active_id() {
            return Err(DomainError::JobActive(id.to_string()));
        }

        let report = self.fs_port.clear_directory(&self.scratch_dir).await?;
        info!(
            "cleared {}: {} files, {} bytes",
            self.scratch_dir.display(),
            report.files_removed,
            report.bytes_freed
        );
        Ok(report)
    }
}
