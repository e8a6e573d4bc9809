//! JSON output for simulation runs
//!
//! Step snapshots are streamed as JSON lines; the final population and the
//! per-generation reports are written as JSON arrays at the end of a run.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use gridlife_core::{GenerationReport, IndividualView, SnapshotSink, StepSnapshot};
use serde::Serialize;

/// Streams step snapshots as one JSON object per line
///
/// The first write error is kept and reported by [`JsonLinesSink::finish`];
/// later snapshots are dropped.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    written: usize,
    error: Option<io::Error>,
}

impl JsonLinesSink<BufWriter<File>> {
    /// Create (or truncate) a snapshot file
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create snapshot file {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            error: None,
        }
    }

    /// Number of snapshots written so far
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flush and hand back the writer, or the first error seen
    pub fn finish(mut self) -> Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err).context("Failed to write snapshots");
        }
        self.writer.flush().context("Failed to flush snapshots")?;
        Ok(self.writer)
    }

    fn write_line(&mut self, snapshot: &StepSnapshot) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, snapshot)?;
        self.writer.write_all(b"\n")
    }
}

impl<W: Write> SnapshotSink for JsonLinesSink<W> {
    fn record_step(&mut self, snapshot: &StepSnapshot) {
        if self.error.is_some() {
            return;
        }
        match self.write_line(snapshot) {
            Ok(()) => self.written += 1,
            Err(e) => {
                log::warn!("Failed to write snapshot: {}", e);
                self.error = Some(e);
            }
        }
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    writer.flush().context("Failed to flush output")?;
    Ok(())
}

/// Write the population as a JSON array of `{id, coords, color}`
pub fn write_population(path: &Path, views: &[IndividualView]) -> Result<()> {
    write_json(path, views)?;
    log::info!("Population written: {}", path.display());
    Ok(())
}

/// Write all generation reports as a JSON array
pub fn write_generation_reports(path: &Path, reports: &[GenerationReport]) -> Result<()> {
    write_json(path, reports)?;
    log::info!("Generation reports written: {}", path.display());
    Ok(())
}
