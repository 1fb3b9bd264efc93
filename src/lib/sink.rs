//! Output sink for sorted lines.
//!
//! Each record is appended to a write buffer together with its `\n` terminator and the
//! buffer is handed to the underlying writer in whole records. A failed write either
//! aborts (the default) or is logged and skipped, according to the [`WriteFailurePolicy`].
//! Under `Continue` every record still in the buffer when a write fails is counted as
//! failed and dropped, and a record torn by a partial write is terminated before the next
//! write so the records after it stay intact.

use crate::progress::ProgressTracker;
use anyhow::{Context, Result};
use bstr::ByteSlice;
use log::warn;
use memchr::{memchr_iter, memrchr};
use std::fmt;
use std::fs::File;
use std::io::{self, ErrorKind, Write};
use std::path::Path;

/// Buffer size for the output writer.
const OUTPUT_BUFFER_SIZE: usize = 256 * 1024;

/// What to do when writing a line to the output fails.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Stop and return the error.
    #[default]
    Abort,
    /// Log the failing line, count it, and keep writing.
    Continue,
}

impl fmt::Display for WriteFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailurePolicy::Abort => write!(f, "abort"),
            WriteFailurePolicy::Continue => write!(f, "continue"),
        }
    }
}

/// Counts from a completed write.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SinkStats {
    /// Lines written successfully.
    pub lines_written: u64,
    /// Lines whose write failed and was skipped.
    pub write_failures: u64,
}

/// Newline-terminated line writer.
pub struct LineSink<W: Write> {
    writer: W,
    /// Whole records not yet handed to `writer`, each ending in `\n`.
    buffer: Vec<u8>,
    capacity: usize,
    /// The last write stopped inside a record.
    torn: bool,
    policy: WriteFailurePolicy,
    progress: Option<ProgressTracker>,
    stats: SinkStats,
}

impl LineSink<File> {
    /// Create (or truncate) `path` and write lines to it.
    pub fn create(path: &Path, policy: WriteFailurePolicy) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Self::with_capacity(file, OUTPUT_BUFFER_SIZE, policy))
    }
}

impl<W: Write> LineSink<W> {
    #[must_use]
    pub fn new(writer: W, policy: WriteFailurePolicy) -> Self {
        Self::with_capacity(writer, OUTPUT_BUFFER_SIZE, policy)
    }

    /// Create a sink with an explicit write buffer size.
    ///
    /// With a capacity of 0 every record is written as soon as it arrives.
    #[must_use]
    pub fn with_capacity(writer: W, capacity: usize, policy: WriteFailurePolicy) -> Self {
        Self {
            writer,
            buffer: Vec::with_capacity(capacity),
            capacity,
            torn: false,
            policy,
            progress: None,
            stats: SinkStats::default(),
        }
    }

    /// Log progress through `tracker` as lines are written.
    #[must_use]
    pub fn with_progress(mut self, tracker: ProgressTracker) -> Self {
        self.progress = Some(tracker);
        self
    }

    /// Queue one line and its newline terminator, writing the buffer once it is full.
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(line);
        self.buffer.push(b'\n');

        if let Some(progress) = &self.progress {
            progress.log_if_needed(1);
        }

        if self.buffer.len() >= self.capacity {
            self.write_buffer()?;
        }
        Ok(())
    }

    /// Write every line of a sorted stream.
    ///
    /// An `Err` item from the stream is returned immediately regardless of policy.
    pub fn drain<I>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Vec<u8>>>,
    {
        for line in lines {
            let line = line?;
            self.write_line(&line)?;
        }
        Ok(())
    }

    /// Write buffered records and return the final counts.
    pub fn finish(mut self) -> Result<SinkStats> {
        self.write_buffer()?;
        if let Err(e) = self.writer.flush() {
            match self.policy {
                WriteFailurePolicy::Abort => return Err(e).context("Failed to flush output"),
                WriteFailurePolicy::Continue => warn!("Failed to flush output: {e}"),
            }
        }
        if let Some(progress) = &self.progress {
            progress.log_final();
        }
        Ok(self.stats)
    }

    /// Hand the buffered records to the writer and settle the counts.
    fn write_buffer(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        // Terminate a record left incomplete by an earlier partial write.
        let lead = usize::from(self.torn);
        if self.torn {
            self.buffer.insert(0, b'\n');
        }

        let (written, result) = write_some(&mut self.writer, &self.buffer);
        let done = written.max(lead);
        self.stats.lines_written += memchr_iter(b'\n', &self.buffer[lead..done]).count() as u64;

        let outcome = match result {
            Ok(()) => {
                self.torn = false;
                Ok(())
            }
            Err(e) => {
                // First byte of the record the failure landed in.
                let start =
                    memrchr(b'\n', &self.buffer[lead..done]).map_or(lead, |i| lead + i + 1);
                if written > 0 {
                    self.torn = done > start;
                }
                self.record_failure(start, e)
            }
        };

        self.buffer.clear();
        outcome
    }

    /// Apply the policy to the unwritten records in `buffer[start..]`.
    fn record_failure(&mut self, start: usize, e: io::Error) -> Result<()> {
        match self.policy {
            WriteFailurePolicy::Abort => Err(e).context("Failed to write output line"),
            WriteFailurePolicy::Continue => {
                let lost = &self.buffer[start..self.buffer.len() - 1];
                for line in lost.split(|&b| b == b'\n') {
                    self.stats.write_failures += 1;
                    warn!("Failed to write line '{}': {e}", line.as_bstr());
                }
                Ok(())
            }
        }
    }
}

/// Write as much of `buf` as the writer accepts, returning the byte count reached.
fn write_some<W: Write>(writer: &mut W, buf: &[u8]) -> (usize, io::Result<()>) {
    let mut written = 0;
    while written < buf.len() {
        match writer.write(&buf[written..]) {
            Ok(0) => return (written, Err(io::Error::from(ErrorKind::WriteZero))),
            Ok(n) => written += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return (written, Err(e)),
        }
    }
    (written, Ok(()))
}
