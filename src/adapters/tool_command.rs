//! Builder for one-shot external tool invocations.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use crate::domain::errors::DomainError;

/// Default command timeout for probes and frame grabs
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// A builder for constructing and executing external tool invocations.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// Spawn failures, non-zero exits and timeouts are all reported as
    /// errors built by `to_error`, with stderr included for non-zero exits.
    pub async fn execute_with(
        &self,
        to_error: impl Fn(String) -> DomainError,
    ) -> Result<ToolOutput, DomainError> {
        let program_name = self.program_name();
        debug!(tool = %program_name, args = ?self.args, "running tool");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| to_error(format!("{program_name}: failed to spawn: {e}")))?;

        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let tool_output = ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                };
                if !output.status.success() {
                    return Err(to_error(format!(
                        "{program_name}: exited with status {}: {}",
                        output.status,
                        tool_output.stderr.trim()
                    )));
                }
                Ok(tool_output)
            }
            Ok(Err(e)) => Err(to_error(format!(
                "{program_name}: I/O error waiting for process: {e}"
            ))),
            // the child future is dropped here, and kill_on_drop reaps it
            Err(_elapsed) => Err(to_error(format!(
                "{program_name}: timed out after {:?}",
                self.timeout
            ))),
        }
    }
}
