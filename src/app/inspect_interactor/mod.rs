// Inspect interactor - Media metadata and thumbnail use cases

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Interactor for media inspection use cases
pub struct InspectInteractor {
    probe_port: Arc<dyn ProbePort>,
    thumbnail_port: Arc<dyn ThumbnailPort>,
    fs_port: Arc<dyn FsPort>,
    scratch_dir: PathBuf,
}

impl InspectInteractor {
    /// Create new inspect interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        thumbnail_port: Arc<dyn ThumbnailPort>,
        fs_port: Arc<dyn FsPort>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            probe_port,
            thumbnail_port,
            fs_port,
            scratch_dir,
        }
    }

    /// Describe an existing media file
    pub async fn get_media_info(&self, path: &Path) -> Result<MediaInfo, DomainError> {
        self.require_file(path).await?;

        let filesize = self.fs_port.file_size(path).await?;
        let probe = self.probe_port.probe(path).await?;
        debug!(
            "probed {}: {:?}x{:?}, {:?}",
            path.display(),
            probe.width,
            probe.height,
            probe.duration
        );

        Ok(MediaInfo::from_probe(path, filesize, probe))
    }

    /// Extract a JPEG still at `position_ms` into the scratch directory.
    ///
    /// `quality` is the JPEG quality in 1..=100.
    pub async fn get_file_thumbnail(
        &self,
        path: &Path,
        quality: u8,
        position_ms: u64,
    ) -> Result<PathBuf, DomainError> {
        if !(1..=100).contains(&quality) {
            return Err(DomainError::InvalidRequest(format!(
                "thumbnail quality must be within 1..=100, got {}",
                quality
            )));
        }
        self.require_file(path).await?;

        self.fs_port.ensure_writable_dir(&self.scratch_dir).await?;
        let destination = self
            .scratch_dir
            .join(format!("THUMB_{}.jpg", Uuid::new_v4().simple()));

        self.thumbnail_port
            .extract_frame(
                path,
                &destination,
                Duration::from_millis(position_ms),
                quality,
            )
            .await?;

        info!(
            "thumbnail of {} at {}ms written to {}",
            path.display(),
            position_ms,
            destination.display()
        );
        Ok(destination)
    }

    async fn require_file(&self, path: &Path) -> Result<(), DomainError> {
        if self.fs_port.file_exists(path).await? {
            Ok(())
        } else {
            Err(DomainError::SourceNotFound(path.display().to_string()))
        }
    }
}
