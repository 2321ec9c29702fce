// Compress interactor - Orchestrates the single-flight compression job

mod registry;
mod relay;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::rules::*;
use crate::ports::*;

pub use registry::JobRegistry;
pub use relay::{EngineEvent, RelayState, RelayStep, Terminal};

use relay::{run_relay, ChannelListener, RelayContext};

/// Interactor owning the compression job lifecycle
pub struct CompressInteractor {
    engine: Arc<dyn TranscodeEngine>,
    probe_port: Arc<dyn ProbePort>,
    fs_port: Arc<dyn FsPort>,
    registry: Arc<JobRegistry>,
    scratch_dir: PathBuf,
}

impl CompressInteractor {
    /// Create new compress interactor with injected ports
    pub fn new(
        engine: Arc<dyn TranscodeEngine>,
        probe_port: Arc<dyn ProbePort>,
        fs_port: Arc<dyn FsPort>,
        registry: Arc<JobRegistry>,
        scratch_dir: PathBuf,
    ) -> Self {
        Self {
            engine,
            probe_port,
            fs_port,
            registry,
            scratch_dir,
        }
    }

    /// Check the source exists, validate the request, claim the job slot
    /// and start the engine.
    ///
    /// Errors here mean no job exists. Once a handle is returned the job
    /// produces exactly one outcome.
    pub async fn submit(&self, request: CompressionRequest) -> Result<JobHandle, DomainError> {
        let missing = request.source.as_os_str().is_empty()
            || !self.fs_port.file_exists(&request.source).await?;
        if missing {
            return Err(DomainError::SourceNotFound(
                request.source.display().to_string(),
            ));
        }

        request.validate()?;

        let strategy =
            StrategyResolver::resolve(request.quality, request.frame_rate, request.include_audio)?;

        self.fs_port
            .ensure_writable_dir(&self.scratch_dir)
            .await
            .map_err(|e| DomainError::InitializationFailed(e.to_string()))?;

        let id = JobId::new();
        let destination = destination_for(&self.scratch_dir, &request.source);
        self.registry.try_claim(id, destination.clone())?;

        // the previous job may have removed this file as its origin before
        // giving up the slot
        if !self.fs_port.file_exists(&request.source).await.unwrap_or(false) {
            self.registry.release(id);
            return Err(DomainError::SourceNotFound(
                request.source.display().to_string(),
            ));
        }

        info!(
            "job {}: compressing {} at {} into {}",
            id,
            request.source.display(),
            request.quality,
            destination.display()
        );

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let listener = Arc::new(ChannelListener::new(event_tx));
        let spec = TranscodeSpec {
            source: request.source.clone(),
            destination: destination.clone(),
            strategy,
        };

        if let Err(e) = self.engine.start(spec, listener).await {
            self.registry.release(id);
            return Err(match e {
                DomainError::InitializationFailed(_) => e,
                other => DomainError::InitializationFailed(other.to_string()),
            });
        }

        // a cancel that landed while the engine was starting
        if self.registry.cancel_requested(id) {
            debug!("job {}: forwarding early cancellation", id);
            self.engine.cancel();
        }

        let (progress_tx, progress_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let ctx = RelayContext {
            id,
            request,
            destination: destination.clone(),
            registry: Arc::clone(&self.registry),
            probe: Arc::clone(&self.probe_port),
            fs: Arc::clone(&self.fs_port),
        };
        tokio::spawn(run_relay(ctx, event_rx, progress_tx, outcome_tx));

        Ok(JobHandle {
            id,
            destination,
            progress: progress_rx,
            outcome: outcome_rx,
        })
    }

    /// Cancel whichever job is active. Returns false when there is none.
    pub fn cancel_active(&self) -> bool {
        self.forward_cancel(None)
    }

    /// Cancel the job behind `handle` if it is still running
    pub fn cancel(&self, handle: &JobHandle) -> bool {
        self.forward_cancel(Some(handle.id()))
    }

    fn forward_cancel(&self, target: Option<JobId>) -> bool {
        match self.registry.request_cancel(target) {
            Some(id) => {
                info!("job {}: cancellation requested", id);
                self.engine.cancel();
                true
            }
            None => {
                debug!("no active job to cancel");
                false
            }
        }
    }

    pub fn current_job(&self) -> Option<JobSnapshot> {
        self.registry.snapshot()
    }
}

/// Caller's view of a submitted job: a progress stream and one outcome
#[derive(Debug)]
pub struct JobHandle {
    id: JobId,
    destination: PathBuf,
    progress: mpsc::UnboundedReceiver<f64>,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Where the output will be written
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Next progress fraction; `None` once the job is finished
    pub async fn next_progress(&mut self) -> Option<f64> {
        self.progress.recv().await
    }

    /// Wait for the terminal outcome, discarding unread progress
    pub async fn outcome(self) -> JobOutcome {
        resolve_outcome(self.outcome).await
    }

    /// Split into the progress stream and a future for the outcome
    pub fn into_parts(
        self,
    ) -> (
        mpsc::UnboundedReceiver<f64>,
        impl std::future::Future<Output = JobOutcome>,
    ) {
        (self.progress, resolve_outcome(self.outcome))
    }
}

async fn resolve_outcome(rx: oneshot::Receiver<JobOutcome>) -> JobOutcome {
    rx.await
        .unwrap_or_else(|_| JobOutcome::Failed("job relay stopped without a result".to_string()))
}

/// Unique output path inside `scratch_dir` for `source`
pub fn destination_for(scratch_dir: &Path, source: &Path) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    source.hash(&mut hasher);
    scratch_dir.join(format!(
        "VID_{}{:x}.mp4",
        Uuid::new_v4().simple(),
        hasher.finish()
    ))
}
