// Single-slot job registry enforcing at most one active job

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use crate::domain::errors::DomainError;
use crate::domain::model::{JobId, JobSnapshot, JobState};

#[derive(Debug, Clone)]
struct ActiveJob {
    id: JobId,
    state: JobState,
    progress: f64,
    destination: PathBuf,
    cancel_requested: bool,
}

/// Holds the one job allowed to run. A second claim fails instead of
/// replacing the first.
#[derive(Debug, Default)]
pub struct JobRegistry {
    slot: Mutex<Option<ActiveJob>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveJob>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reserve the slot for a new pending job
    pub fn try_claim(&self, id: JobId, destination: PathBuf) -> Result<(), DomainError> {
        let mut slot = self.lock();
        if let Some(active) = slot.as_ref() {
            return Err(DomainError::JobAlreadyActive(active.id.to_string()));
        }
        *slot = Some(ActiveJob {
            id,
            state: JobState::Pending,
            progress: 0.0,
            destination,
            cancel_requested: false,
        });
        Ok(())
    }

    /// Move the job to `state` unless it already reached a terminal state
    pub fn transition(&self, id: JobId, state: JobState) -> bool {
        match self.lock().as_mut() {
            Some(job) if job.id == id && !job.state.is_terminal() => {
                job.state = state;
                true
            }
            _ => false,
        }
    }

    pub fn set_progress(&self, id: JobId, progress: f64) {
        if let Some(job) = self.lock().as_mut().filter(|job| job.id == id) {
            job.progress = progress;
        }
    }

    /// Flag the active job for cancellation.
    ///
    /// With `Some(id)` only that job is targeted. Returns the flagged job, or
    /// `None` when there is nothing left to cancel.
    pub fn request_cancel(&self, id: Option<JobId>) -> Option<JobId> {
        match self.lock().as_mut() {
            Some(job) if !job.state.is_terminal() && id.map_or(true, |id| id == job.id) => {
                job.cancel_requested = true;
                Some(job.id)
            }
            _ => None,
        }
    }

    pub fn cancel_requested(&self, id: JobId) -> bool {
        self.lock()
            .as_ref()
            .map_or(false, |job| job.id == id && job.cancel_requested)
    }

    /// Free the slot if it still belongs to `id`
    pub fn release(&self, id: JobId) {
        let mut slot = self.lock();
        if slot.as_ref().map_or(false, |job| job.id == id) {
            *slot = None;
        }
    }

    pub fn active_id(&self) -> Option<JobId> {
        self.lock().as_ref().map(|job| job.id)
    }

    pub fn snapshot(&self) -> Option<JobSnapshot> {
        self.lock().as_ref().map(|job| JobSnapshot {
            id: job.id,
            state: job.state,
            progress: job.progress,
            destination: job.destination.clone(),
        })
    }
}
