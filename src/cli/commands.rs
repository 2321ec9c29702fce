//! Command implementations

use std::future::Future;

use anyhow::{anyhow, Context, Result};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::app::api::VideoCompressor;
use crate::cli::args::{CompressArgs, InfoArgs, ThumbnailArgs};
use crate::domain::model::JobOutcome;
use crate::output::{ConsoleProgressReporter, JsonProgressReporter, ProgressReporter, ResultWriter};

/// Execute the compress command, cancelling the job on Ctrl+C
pub async fn compress(compressor: &VideoCompressor, args: CompressArgs) -> Result<()> {
    let handle = compressor
        .compress_video(
            &args.input,
            args.quality,
            args.delete_origin,
            Some(!args.no_audio),
            args.frame_rate,
        )
        .await
        .with_context(|| format!("Failed to start compression of {}", args.input.display()))?;

    let mut reporter: Box<dyn ProgressReporter> = if args.json {
        Box::new(JsonProgressReporter::stdout())
    } else {
        Box::new(ConsoleProgressReporter::new(true))
    };
    reporter.on_start(handle.id(), &args.input, handle.destination());

    let id = handle.id();
    let (progress, outcome) = handle.into_parts();
    let outcome = watch_job(reporter.as_mut(), progress, outcome, tokio::signal::ctrl_c(), || {
        warn!("interrupt received, cancelling job {}", id);
        compressor.cancel_compression();
    })
    .await;

    match outcome {
        JobOutcome::Succeeded(media_info) => {
            if !args.json {
                ResultWriter::stdout(true).write(&media_info.as_compress_result())?;
            }
            info!("Compression completed: {}", media_info.path.display());
            Ok(())
        }
        JobOutcome::Cancelled => Err(anyhow!("Compression of {} was cancelled", args.input.display())),
        JobOutcome::Failed(message) => Err(anyhow!("Compression failed: {}", message)),
    }
}

/// Report progress until the job ends, calling `on_interrupt` at most once
/// when `interrupt` fires.
///
/// The interrupt future lives for the whole job, so a signal that arrives
/// while a progress update is being reported is still seen.
async fn watch_job<O, I>(
    reporter: &mut dyn ProgressReporter,
    mut progress: mpsc::UnboundedReceiver<f64>,
    outcome: O,
    interrupt: I,
    mut on_interrupt: impl FnMut(),
) -> JobOutcome
where
    O: Future<Output = JobOutcome>,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(outcome);
    tokio::pin!(interrupt);

    let mut interrupted = false;
    let outcome = loop {
        tokio::select! {
            Some(fraction) = progress.recv() => reporter.on_progress(fraction),
            outcome = &mut outcome => break outcome,
            signal = &mut interrupt, if !interrupted => {
                interrupted = true;
                match signal {
                    Ok(()) => on_interrupt(),
                    Err(e) => warn!("cannot listen for interrupts: {}", e),
                }
            }
        }
    };
    // the closing 1.0 may still be queued behind the outcome
    while let Ok(fraction) = progress.try_recv() {
        reporter.on_progress(fraction);
    }
    reporter.on_finish(&outcome);
    outcome
}

/// Execute the info command
pub async fn info(compressor: &VideoCompressor, args: InfoArgs) -> Result<()> {
    let media_info = compressor
        .get_media_info(&args.input)
        .await
        .with_context(|| format!("Failed to inspect {}", args.input.display()))?;

    ResultWriter::stdout(true).write(&media_info)
}

/// Execute the thumbnail command
pub async fn thumbnail(compressor: &VideoCompressor, args: ThumbnailArgs) -> Result<()> {
    let path = compressor
        .get_file_thumbnail(&args.input, args.quality, args.position)
        .await
        .with_context(|| format!("Failed to extract a thumbnail from {}", args.input.display()))?;

    ResultWriter::stdout(true).write(&json!({ "path": path }))
}

/// Execute the clear-cache command
pub async fn clear_cache(compressor: &VideoCompressor) -> Result<()> {
    let report = compressor
        .delete_all_cache()
        .await
        .with_context(|| format!("Failed to clear {}", compressor.scratch_dir().display()))?;

    ResultWriter::stdout(true).write(&report)
}
