// src/logging.rs
//
// Diagnostics and trajectory sinks.
// - init_tracing:     fmt subscriber on stderr, filtered by RUST_LOG
// - TrajectorySink:   per-step record consumer used by `sim::run_with_sink`
// - NoopSink:         discards all records
// - JsonlSink:        writes one JSON object per record, one per line

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::sim::TrajectoryRecord;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` is used. Calling this
/// twice is harmless (the second call is ignored).
pub fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .try_init();
}

/// Abstract sink for per-step trajectory records.
pub trait TrajectorySink {
    fn log_record(&mut self, record: &TrajectoryRecord);

    fn flush(&mut self) {}
}

/// Sink that discards all records.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl TrajectorySink for NoopSink {
    fn log_record(&mut self, _record: &TrajectoryRecord) {}
}

/// JSONL file sink.
///
/// Write failures never abort a run: the first one is reported through
/// `tracing`, later ones are only counted.
pub struct JsonlSink<W: Write = BufWriter<File>> {
    writer: W,
    written: u64,
    failures: u64,
}

impl JsonlSink<BufWriter<File>> {
    /// Create (truncate) `path` and write records to it.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::from_writer(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer,
            written: 0,
            failures: 0,
        }
    }

    /// Records successfully written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn try_write(&mut self, record: &TrajectoryRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")
    }

    fn note_failure(&mut self, err: &dyn std::fmt::Display) {
        if self.failures == 0 {
            warn!(%err, "trajectory sink write failed; further failures are counted only");
        }
        self.failures += 1;
    }
}

impl<W: Write> TrajectorySink for JsonlSink<W> {
    fn log_record(&mut self, record: &TrajectoryRecord) {
        match self.try_write(record) {
            Ok(()) => self.written += 1,
            Err(err) => self.note_failure(&err),
        }
    }

    fn flush(&mut self) {
        if let Err(err) = self.writer.flush() {
            self.note_failure(&err);
        }
    }
}
