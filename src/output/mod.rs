//! Command output: progress reporting and result documents

pub mod progress;
pub mod writer;

pub use progress::{ConsoleProgressReporter, JsonProgressReporter, ProgressReporter};
pub use writer::ResultWriter;
