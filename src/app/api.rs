// Public facade - The caller-facing compression API

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::cache_interactor::CacheInteractor;
use crate::app::compress_interactor::{CompressInteractor, JobHandle, JobRegistry};
use crate::app::inspect_interactor::InspectInteractor;
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// The set of ports a [`VideoCompressor`] is wired from
#[derive(Clone)]
pub struct Ports {
    pub engine: Arc<dyn TranscodeEngine>,
    pub probe: Arc<dyn ProbePort>,
    pub thumbnails: Arc<dyn ThumbnailPort>,
    pub fs: Arc<dyn FsPort>,
    pub log: Arc<dyn LogPort>,
}

/// Compression service: one active job at a time, plus inspection and
/// cache maintenance over the same scratch directory.
pub struct VideoCompressor {
    compress: CompressInteractor,
    inspect: InspectInteractor,
    cache: CacheInteractor,
    log_port: Arc<dyn LogPort>,
    scratch_dir: PathBuf,
}

impl VideoCompressor {
    pub fn new(ports: Ports, scratch_dir: impl Into<PathBuf>) -> Self {
        let scratch_dir = scratch_dir.into();
        let registry = Arc::new(JobRegistry::new());

        let compress = CompressInteractor::new(
            Arc::clone(&ports.engine),
            Arc::clone(&ports.probe),
            Arc::clone(&ports.fs),
            Arc::clone(&registry),
            scratch_dir.clone(),
        );
        let inspect = InspectInteractor::new(
            Arc::clone(&ports.probe),
            Arc::clone(&ports.thumbnails),
            Arc::clone(&ports.fs),
            scratch_dir.clone(),
        );
        let cache = CacheInteractor::new(Arc::clone(&ports.fs), registry, scratch_dir.clone());

        Self {
            compress,
            inspect,
            cache,
            log_port: ports.log,
            scratch_dir,
        }
    }

    /// Start compressing `path` with the tier at ordinal `quality`.
    ///
    /// `include_audio` defaults to true. `frame_rate` is only read by the
    /// custom tier.
    pub async fn compress_video(
        &self,
        path: impl Into<PathBuf>,
        quality: i64,
        delete_origin: bool,
        include_audio: Option<bool>,
        frame_rate: Option<u32>,
    ) -> Result<JobHandle, DomainError> {
        let request = CompressionRequest::new(path, VideoQuality::from_ordinal(quality)?)
            .with_delete_origin(delete_origin)
            .with_audio(include_audio.unwrap_or(true))
            .with_frame_rate(frame_rate);
        self.submit(request).await
    }

    pub async fn submit(&self, request: CompressionRequest) -> Result<JobHandle, DomainError> {
        self.compress.submit(request).await
    }

    /// Cancel the active job. Returns false when nothing was running.
    pub fn cancel_compression(&self) -> bool {
        self.compress.cancel_active()
    }

    /// Cancel the job behind `handle` only
    pub fn cancel(&self, handle: &JobHandle) -> bool {
        self.compress.cancel(handle)
    }

    pub async fn get_media_info(&self, path: impl AsRef<Path>) -> Result<MediaInfo, DomainError> {
        self.inspect.get_media_info(path.as_ref()).await
    }

    pub async fn get_file_thumbnail(
        &self,
        path: impl AsRef<Path>,
        quality: u8,
        position_ms: u64,
    ) -> Result<PathBuf, DomainError> {
        self.inspect
            .get_file_thumbnail(path.as_ref(), quality, position_ms)
            .await
    }

    /// Change verbosity with the engine logger's codes: 0 trace, 1 info,
    /// 2 warning, 3 error
    pub fn set_log_level(&self, level: i32) -> Result<(), DomainError> {
        self.log_port.set_log_level(LogLevel::from_code(level)?)
    }

    pub async fn delete_all_cache(&self) -> Result<ClearReport, DomainError> {
        self.cache.delete_all_cache().await
    }

    pub fn current_job(&self) -> Option<JobSnapshot> {
        self.compress.current_job()
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }
}
