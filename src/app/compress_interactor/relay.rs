// Relay - Serializes engine callbacks into one progress stream and one outcome

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::domain::model::*;
use crate::ports::*;

use super::registry::JobRegistry;

/// Engine callback captured as a message
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Started,
    Progress(f64),
    Succeeded(u64),
    Failed(String),
    Cancelled,
}

/// Listener handed to the engine; forwards every callback to the relay task
pub(crate) struct ChannelListener {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl ChannelListener {
    pub(crate) fn new(tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: EngineEvent) {
        // the relay is gone once the job is terminal
        let _ = self.tx.send(event);
    }
}

impl EngineListener for ChannelListener {
    fn on_start(&self) {
        self.send(EngineEvent::Started);
    }

    fn on_progress(&self, fraction: f64) {
        self.send(EngineEvent::Progress(fraction));
    }

    fn on_success(&self, size: u64) {
        self.send(EngineEvent::Succeeded(size));
    }

    fn on_failure(&self, message: &str) {
        self.send(EngineEvent::Failed(message.to_string()));
    }

    fn on_cancelled(&self) {
        self.send(EngineEvent::Cancelled);
    }
}

/// Terminal event as accepted by the relay
#[derive(Debug, Clone, PartialEq)]
pub enum Terminal {
    Succeeded(u64),
    Cancelled,
    Failed(String),
}

impl Terminal {
    pub fn state(&self) -> JobState {
        match self {
            Terminal::Succeeded(_) => JobState::Succeeded,
            Terminal::Cancelled => JobState::Cancelled,
            Terminal::Failed(_) => JobState::Failed,
        }
    }
}

/// What the relay should do with one event
#[derive(Debug, Clone, PartialEq)]
pub enum RelayStep {
    Ignore,
    Running,
    Progress(f64),
    Terminal(Terminal),
}

/// Per-job event filter.
///
/// Only the first terminal event counts. Progress is clamped to [0, 1] and
/// only forwarded when it moves forward.
#[derive(Debug)]
pub struct RelayState {
    state: JobState,
    last_progress: Option<f64>,
}

impl Default for RelayState {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayState {
    pub fn new() -> Self {
        Self {
            state: JobState::Pending,
            last_progress: None,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn apply(&mut self, event: EngineEvent) -> RelayStep {
        if self.state.is_terminal() {
            return RelayStep::Ignore;
        }

        match event {
            EngineEvent::Started => {
                if self.state == JobState::Pending {
                    self.state = JobState::Running;
                    RelayStep::Running
                } else {
                    RelayStep::Ignore
                }
            }
            EngineEvent::Progress(fraction) => {
                self.state = JobState::Running;
                if fraction.is_nan() {
                    return RelayStep::Ignore;
                }
                let fraction = fraction.clamp(0.0, 1.0);
                if self.last_progress.map_or(true, |last| fraction > last) {
                    self.last_progress = Some(fraction);
                    RelayStep::Progress(fraction)
                } else {
                    RelayStep::Ignore
                }
            }
            EngineEvent::Succeeded(size) => {
                self.state = JobState::Succeeded;
                RelayStep::Terminal(Terminal::Succeeded(size))
            }
            EngineEvent::Cancelled => {
                self.state = JobState::Cancelled;
                RelayStep::Terminal(Terminal::Cancelled)
            }
            EngineEvent::Failed(message) => {
                self.state = JobState::Failed;
                RelayStep::Terminal(Terminal::Failed(message))
            }
        }
    }

    /// Whether a closing 1.0 still has to be emitted
    pub fn needs_final_progress(&self) -> bool {
        self.last_progress.map_or(true, |last| last < 1.0)
    }
}

pub(crate) struct RelayContext {
    pub id: JobId,
    pub request: CompressionRequest,
    pub destination: PathBuf,
    pub registry: Arc<JobRegistry>,
    pub probe: Arc<dyn ProbePort>,
    pub fs: Arc<dyn FsPort>,
}

/// Drive one job from engine events to its single outcome.
///
/// The registry turns terminal as soon as the engine reports, so cancels
/// issued while the output is described are no-ops. Ends by sending the
/// outcome, removing the origin when requested, releasing the slot and
/// finally closing the progress stream.
pub(crate) async fn run_relay(
    ctx: RelayContext,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    progress_tx: mpsc::UnboundedSender<f64>,
    outcome_tx: oneshot::Sender<JobOutcome>,
) {
    let mut relay = RelayState::new();

    let terminal = loop {
        let Some(event) = events.recv().await else {
            break Terminal::Failed("engine stopped without reporting a result".to_string());
        };
        match relay.apply(event) {
            RelayStep::Ignore => {}
            RelayStep::Running => {
                ctx.registry.transition(ctx.id, JobState::Running);
                debug!("job {} running", ctx.id);
            }
            RelayStep::Progress(fraction) => {
                ctx.registry.transition(ctx.id, JobState::Running);
                ctx.registry.set_progress(ctx.id, fraction);
                let _ = progress_tx.send(fraction);
            }
            RelayStep::Terminal(terminal) => break terminal,
        }
    };
    // late callbacks are dropped with the receiver
    drop(events);
    ctx.registry.transition(ctx.id, terminal.state());

    let outcome = match terminal {
        Terminal::Succeeded(reported_size) => {
            if relay.needs_final_progress() {
                ctx.registry.set_progress(ctx.id, 1.0);
                let _ = progress_tx.send(1.0);
            }
            let info = describe_output(&*ctx.probe, &*ctx.fs, &ctx.destination, reported_size).await;
            info!(
                "job {} finished: {} ({} bytes)",
                ctx.id,
                info.path.display(),
                info.filesize
            );
            JobOutcome::Succeeded(info)
        }
        Terminal::Cancelled => {
            info!("job {} cancelled", ctx.id);
            JobOutcome::Cancelled
        }
        Terminal::Failed(message) => {
            warn!("job {} failed: {}", ctx.id, message);
            JobOutcome::Failed(message)
        }
    };

    let succeeded = matches!(outcome, JobOutcome::Succeeded(_));
    if outcome_tx.send(outcome).is_err() {
        debug!("job {} outcome dropped, no one is waiting", ctx.id);
    }

    if succeeded && ctx.request.delete_origin {
        match ctx.fs.delete_file(&ctx.request.source).await {
            Ok(()) => debug!("removed origin {}", ctx.request.source.display()),
            Err(e) => warn!(
                "could not remove origin {}: {}",
                ctx.request.source.display(),
                e
            ),
        }
    }

    // held until the origin is gone so a resubmit cannot race its removal
    ctx.registry.release(ctx.id);
}

/// Metadata for a finished output; never fails, falls back to path and size
async fn describe_output(
    probe: &dyn ProbePort,
    fs: &dyn FsPort,
    destination: &Path,
    reported_size: u64,
) -> MediaInfo {
    let filesize = match fs.file_size(destination).await {
        Ok(size) => size,
        Err(e) => {
            debug!("stat of {} failed, using engine size: {}", destination.display(), e);
            reported_size
        }
    };

    match probe.probe(destination).await {
        Ok(result) => MediaInfo::from_probe(destination, filesize, result),
        Err(e) => {
            warn!("could not probe output {}: {}", destination.display(), e);
            MediaInfo::bare(destination, filesize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_terminal_event_wins() {
        let mut relay = RelayState::new();
        assert_eq!(relay.apply(EngineEvent::Started), RelayStep::Running);
        assert_eq!(
            relay.apply(EngineEvent::Cancelled),
            RelayStep::Terminal(Terminal::Cancelled)
        );
        assert_eq!(relay.apply(EngineEvent::Succeeded(10)), RelayStep::Ignore);
        assert_eq!(relay.apply(EngineEvent::Progress(0.9)), RelayStep::Ignore);
        assert_eq!(relay.state(), JobState::Cancelled);
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let mut relay = RelayState::new();
        assert_eq!(relay.apply(EngineEvent::Progress(-0.5)), RelayStep::Progress(0.0));
        assert_eq!(relay.apply(EngineEvent::Progress(0.4)), RelayStep::Progress(0.4));
        assert_eq!(relay.apply(EngineEvent::Progress(0.3)), RelayStep::Ignore);
        assert_eq!(relay.apply(EngineEvent::Progress(0.4)), RelayStep::Ignore);
        assert_eq!(relay.apply(EngineEvent::Progress(f64::NAN)), RelayStep::Ignore);
        assert_eq!(relay.apply(EngineEvent::Progress(1.7)), RelayStep::Progress(1.0));
        assert!(!relay.needs_final_progress());
    }

    #[test]
    fn progress_without_start_marks_running() {
        let mut relay = RelayState::new();
        assert_eq!(relay.apply(EngineEvent::Progress(0.1)), RelayStep::Progress(0.1));
        assert_eq!(relay.state(), JobState::Running);
        assert_eq!(relay.apply(EngineEvent::Started), RelayStep::Ignore);
    }

    #[test]
    fn final_progress_needed_until_complete() {
        let mut relay = RelayState::new();
        assert!(relay.needs_final_progress());
        relay.apply(EngineEvent::Progress(0.99));
        assert!(relay.needs_final_progress());
    }

    #[test]
    fn failure_carries_message() {
        let mut relay = RelayState::new();
        assert_eq!(
            relay.apply(EngineEvent::Failed("codec missing".to_string())),
            RelayStep::Terminal(Terminal::Failed("codec missing".to_string()))
        );
        assert_eq!(relay.state(), JobState::Failed);
    }

    #[test]
    fn terminal_maps_to_job_state() {
        assert_eq!(Terminal::Succeeded(1).state(), JobState::Succeeded);
        assert_eq!(Terminal::Cancelled.state(), JobState::Cancelled);
        assert_eq!(Terminal::Failed(String::new()).state(), JobState::Failed);
    }

    #[tokio::test]
    async fn listener_forwards_callbacks_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let listener = ChannelListener::new(tx);
        listener.on_start();
        listener.on_progress(0.5);
        listener.on_failure("boom");

        assert_eq!(rx.recv().await, Some(EngineEvent::Started));
        assert_eq!(rx.recv().await, Some(EngineEvent::Progress(0.5)));
        assert_eq!(rx.recv().await, Some(EngineEvent::Failed("boom".to_string())));
    }
}
