//! Result writer for command output

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

/// Writes command results as JSON documents
pub struct ResultWriter<W: Write> {
    out: W,
    pretty: bool,
}

impl ResultWriter<std::io::Stdout> {
    pub fn stdout(pretty: bool) -> Self {
        Self::new(std::io::stdout(), pretty)
    }
}

impl<W: Write> ResultWriter<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self { out, pretty }
    }

    pub fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .context("Failed to serialize result")?;

        writeln!(self.out, "{}", text).context("Failed to write result")?;
        self.out.flush().context("Failed to flush result")
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
