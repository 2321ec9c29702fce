//! Progress reporters for the command line

use std::io::Write;
use std::path::Path;

use serde_json::{json, Value};

use crate::domain::model::{JobId, JobOutcome};

/// Receives job lifecycle updates on the CLI side
pub trait ProgressReporter: Send {
    /// Called once the job has been accepted
    fn on_start(&mut self, id: JobId, source: &Path, destination: &Path);

    /// Called with each forwarded progress fraction
    fn on_progress(&mut self, fraction: f64);

    /// Called with the terminal outcome
    fn on_finish(&mut self, outcome: &JobOutcome);
}

/// Render a fraction as a fixed-width bar
pub fn render_bar(fraction: f64, width: usize) -> String {
    let percent = (fraction.clamp(0.0, 1.0) * 100.0).min(100.0);
    let filled = ((percent / 100.0) * width as f64) as usize;
    format!(
        "[{}{}] {:>5.1}%",
        "█".repeat(filled),
        "░".repeat(width - filled),
        percent
    )
}

/// Console progress bar on stderr
pub struct ConsoleProgressReporter {
    verbose: bool,
    bar_width: usize,
}

impl ConsoleProgressReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            bar_width: 30,
        }
    }
}

impl ProgressReporter for ConsoleProgressReporter {
    fn on_start(&mut self, id: JobId, source: &Path, destination: &Path) {
        if self.verbose {
            eprintln!("Compressing {} (job {})", source.display(), id);
            eprintln!("   Output: {}", destination.display());
        }
    }

    fn on_progress(&mut self, fraction: f64) {
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "\r{}", render_bar(fraction, self.bar_width));
        let _ = stderr.flush();
    }

    fn on_finish(&mut self, outcome: &JobOutcome) {
        eprintln!();
        match outcome {
            JobOutcome::Succeeded(info) => {
                if self.verbose {
                    eprintln!("Done: {} ({} bytes)", info.path.display(), info.filesize);
                }
            }
            JobOutcome::Cancelled => eprintln!("Cancelled"),
            JobOutcome::Failed(message) => eprintln!("Failed: {}", message),
        }
    }
}

/// JSON-lines progress events on stdout
pub struct JsonProgressReporter<W: Write + Send = std::io::Stdout> {
    out: W,
}

impl JsonProgressReporter {
    pub fn stdout() -> Self {
        Self {
            out: std::io::stdout(),
        }
    }
}

impl<W: Write + Send> JsonProgressReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: Value) {
        let _ = writeln!(self.out, "{}", event);
        let _ = self.out.flush();
    }
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

impl<W: Write + Send> ProgressReporter for JsonProgressReporter<W> {
    fn on_start(&mut self, id: JobId, source: &Path, destination: &Path) {
        self.emit(json!({
            "event": "start",
            "job": id.to_string(),
            "source": source,
            "destination": destination,
            "timestamp": timestamp(),
        }));
    }

    fn on_progress(&mut self, fraction: f64) {
        self.emit(json!({
            "event": "progress",
            "progress": fraction,
            "timestamp": timestamp(),
        }));
    }

    fn on_finish(&mut self, outcome: &JobOutcome) {
        let event = match outcome {
            JobOutcome::Succeeded(info) => json!({
                "event": "complete",
                "result": info.as_compress_result(),
                "timestamp": timestamp(),
            }),
            JobOutcome::Cancelled => json!({
                "event": "cancelled",
                "timestamp": timestamp(),
            }),
            JobOutcome::Failed(message) => json!({
                "event": "error",
                "message": message,
                "timestamp": timestamp(),
            }),
        };
        self.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::MediaInfo;

    fn events(buf: Vec<u8>) -> Vec<Value> {
        String::from_utf8(buf)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn bar_fills_with_fraction() {
        assert_eq!(render_bar(0.0, 4), "[░░░░]   0.0%");
        assert_eq!(render_bar(0.5, 4), "[██░░]  50.0%");
        assert_eq!(render_bar(1.0, 4), "[████] 100.0%");
        assert_eq!(render_bar(3.0, 4), "[████] 100.0%");
    }

    #[test]
    fn json_reporter_writes_one_event_per_line() {
        let mut reporter = JsonProgressReporter::new(Vec::new());
        reporter.on_start(JobId::new(), Path::new("/in.mov"), Path::new("/s/VID_x.mp4"));
        reporter.on_progress(0.5);
        reporter.on_finish(&JobOutcome::Succeeded(MediaInfo::bare("/s/VID_x.mp4", 42)));

        let events = events(reporter.into_inner());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0]["event"], "start");
        assert_eq!(events[0]["source"], "/in.mov");
        assert_eq!(events[1]["progress"], 0.5);
        assert_eq!(events[2]["event"], "complete");
        assert_eq!(events[2]["result"]["filesize"], 42);
        assert_eq!(events[2]["result"]["isCancel"], false);
        assert!(events[2]["timestamp"].is_string());
    }

    #[test]
    fn json_reporter_reports_failure_message() {
        let mut reporter = JsonProgressReporter::new(Vec::new());
        reporter.on_finish(&JobOutcome::Failed("encoder crashed".to_string()));

        let events = events(reporter.into_inner());
        assert_eq!(events[0]["event"], "error");
        assert_eq!(events[0]["message"], "encoder crashed");
    }
}
