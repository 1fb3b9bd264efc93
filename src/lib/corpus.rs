//! Feeding input files into a sort engine.
//!
//! Files are tokenized in the order given and every record is inserted by the calling
//! thread, so insertion order is always the corpus encounter order. With more than one
//! thread, up to `threads` files are tokenized ahead in the background.

use crate::lines::LineReader;
use crate::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressTracker};
use crate::read_ahead::ReadAheadLines;
use crate::sort::LineSorter;
use anyhow::Result;
use log::info;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Counts gathered while reading the corpus.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Number of files read.
    pub files: usize,
    /// Number of records read, duplicates included.
    pub lines: u64,
    /// Bytes of record data read, newlines excluded.
    pub line_bytes: u64,
}

/// Reads a list of input files into a [`LineSorter`].
pub struct CorpusReader {
    inputs: Vec<PathBuf>,
    max_line_length: Option<usize>,
    threads: usize,
    verbose: bool,
    progress_interval: u64,
}

impl CorpusReader {
    #[must_use]
    pub fn new(inputs: Vec<PathBuf>) -> Self {
        Self {
            inputs,
            max_line_length: None,
            threads: 1,
            verbose: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Reject any record longer than `max` bytes.
    #[must_use]
    pub fn max_line_length(mut self, max: Option<usize>) -> Self {
        self.max_line_length = max;
        self
    }

    /// Number of files tokenized ahead in the background; 1 reads synchronously.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Log per-file counts and read progress.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[must_use]
    pub fn progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Insert every record of every input into `sorter`.
    ///
    /// Stops at the first unreadable file or over-long line.
    pub fn feed<S: LineSorter>(&self, sorter: &mut S) -> Result<IngestStats> {
        let progress = ProgressTracker::new("Read lines").with_interval(self.progress_interval);
        let mut stats = IngestStats::default();

        if self.threads > 1 {
            self.feed_read_ahead(sorter, &progress, &mut stats)?;
        } else {
            self.feed_sync(sorter, &progress, &mut stats)?;
        }

        if self.verbose {
            progress.log_final();
        }
        Ok(stats)
    }

    fn feed_sync<S: LineSorter>(
        &self,
        sorter: &mut S,
        progress: &ProgressTracker,
        stats: &mut IngestStats,
    ) -> Result<()> {
        for path in &self.inputs {
            let reader = LineReader::from_path(path, self.max_line_length)?;
            let mut file_lines = 0u64;
            for line in reader {
                let line = line?;
                stats.line_bytes += line.len() as u64;
                sorter.insert(line)?;
                file_lines += 1;
                if self.verbose {
                    progress.log_if_needed(1);
                }
            }
            self.finish_file(path, file_lines, stats);
        }
        Ok(())
    }

    fn feed_read_ahead<S: LineSorter>(
        &self,
        sorter: &mut S,
        progress: &ProgressTracker,
        stats: &mut IngestStats,
    ) -> Result<()> {
        let mut pending = self.inputs.iter();
        let mut window: VecDeque<ReadAheadLines> = VecDeque::with_capacity(self.threads);
        for path in pending.by_ref().take(self.threads) {
            window.push_back(ReadAheadLines::spawn(path.clone(), self.max_line_length));
        }

        while let Some(mut reader) = window.pop_front() {
            if let Some(path) = pending.next() {
                window.push_back(ReadAheadLines::spawn(path.clone(), self.max_line_length));
            }

            let mut file_lines = 0u64;
            while let Some(batch) = reader.next_batch() {
                let batch = batch?;
                let batch_len = batch.len() as u64;
                for line in batch {
                    stats.line_bytes += line.len() as u64;
                    sorter.insert(line)?;
                }
                file_lines += batch_len;
                if self.verbose {
                    progress.log_if_needed(batch_len);
                }
            }
            self.finish_file(reader.path(), file_lines, stats);
        }
        Ok(())
    }

    fn finish_file(&self, path: &Path, file_lines: u64, stats: &mut IngestStats) {
        stats.files += 1;
        stats.lines += file_lines;
        if self.verbose {
            info!("Read {} lines from {}", file_lines, path.display());
        }
    }
}
