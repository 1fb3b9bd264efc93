//! External merge-sort with deduplication for line corpora.
//!
//! Handles corpora larger than available RAM by spilling sorted chunks to temporary files.
//!
//! # Algorithm
//!
//! 1. **Accumulate phase**: Push lines into a contiguous buffer until the budget is reached
//! 2. **Sort phase**: Sort the buffer index (parallel with rayon when threads > 1)
//! 3. **Spill phase**: Drop adjacent duplicates and write the buffer as a run file
//! 4. **Compaction**: When `max_open_runs` runs share a level, merge them into one run of
//!    the next level, so each line is rewritten once per level
//! 5. **Merge phase**: Reduce the run count to `max_open_runs`, then deduplicating k-way
//!    merge of the runs and the residual buffer
//!
//! The work directory is created on the first spill. A corpus that fits within the
//! buffer budget never touches the disk.

use crate::logging::format_bytes;
use crate::sort::line_buffer::LineBuffer;
use crate::sort::merge::{KWayMerge, MergeSource, SortedLines};
use crate::sort::run::{RunReader, RunWriter};
use crate::sort::{LineSorter, SortStats};
use anyhow::{Context, Result};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Default in-memory buffer budget (2 MiB).
pub const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Default bound on the number of runs merged at once.
pub const DEFAULT_MAX_OPEN_RUNS: usize = 256;

/// Default gzip level for run files.
pub const DEFAULT_TEMP_COMPRESSION: u32 = 1;

/// A spilled run and its compaction level (0 for runs written from the buffer).
struct Run {
    path: PathBuf,
    level: u32,
}

/// Bounded-memory deduplicating sorter.
///
/// # Example
/// ```
/// use fsort_lib::sort::{ExternalSorter, LineSorter};
///
/// let mut sorter = ExternalSorter::new().buffer_size(64);
/// for i in (0..100).rev() {
///     sorter.insert(format!("{:03}", i % 50).into_bytes()).unwrap();
/// }
/// let lines: Vec<Vec<u8>> = sorter.sorted().unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(lines.len(), 50);
/// assert_eq!(lines[0], b"000".to_vec());
/// ```
pub struct ExternalSorter {
    /// In-memory budget for buffered lines, index overhead included.
    buffer_size: usize,
    /// Base directory for the work area.
    temp_dir: Option<PathBuf>,
    /// Number of threads for sorting the buffer.
    threads: usize,
    /// gzip level for run files, 0 for uncompressed.
    temp_compression: u32,
    /// Fan-in of every merge.
    max_open_runs: usize,
    buffer: LineBuffer,
    /// Levels never increase along the vector.
    runs: Vec<Run>,
    next_run_id: usize,
    stats: SortStats,
    // Declared last so it outlives anything else referencing the runs.
    work_dir: Option<TempDir>,
}

impl Default for ExternalSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExternalSorter {
    /// Create a new external sorter with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            temp_dir: None,
            threads: 1,
            temp_compression: DEFAULT_TEMP_COMPRESSION,
            max_open_runs: DEFAULT_MAX_OPEN_RUNS,
            buffer: LineBuffer::default(),
            runs: Vec::new(),
            next_run_id: 0,
            stats: SortStats::default(),
            work_dir: None,
        }
    }

    /// Set the in-memory buffer budget in bytes.
    #[must_use]
    pub fn buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(1);
        self
    }

    /// Set the base directory under which the work area is created.
    #[must_use]
    pub fn temp_dir(mut self, path: PathBuf) -> Self {
        self.temp_dir = Some(path);
        self
    }

    /// Set the number of threads used to sort the buffer.
    #[must_use]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    /// Set the gzip level for run files (0 disables compression).
    #[must_use]
    pub fn temp_compression(mut self, level: u32) -> Self {
        self.temp_compression = level.min(9);
        self
    }

    /// Set the maximum number of runs merged at once. Values below 2 are raised to 2.
    #[must_use]
    pub fn max_open_runs(mut self, runs: usize) -> Self {
        self.max_open_runs = runs.max(2);
        self
    }

    /// Path of the work area, once the first run has been spilled.
    #[must_use]
    pub fn work_dir_path(&self) -> Option<&Path> {
        self.work_dir.as_ref().map(TempDir::path)
    }

    /// Number of run files currently on disk.
    #[must_use]
    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Create the work area on first use.
    fn ensure_work_dir(&mut self) -> Result<PathBuf> {
        if let Some(dir) = &self.work_dir {
            return Ok(dir.path().to_path_buf());
        }

        let mut builder = tempfile::Builder::new();
        builder.prefix("fsort_");
        let dir = match &self.temp_dir {
            Some(base) => {
                std::fs::create_dir_all(base).with_context(|| {
                    format!("Failed to create temp directory: {}", base.display())
                })?;
                builder.tempdir_in(base)
            }
            None => builder.tempdir(),
        }
        .context("Failed to create temp directory")?;

        debug!("Created work directory {}", dir.path().display());
        let path = dir.path().to_path_buf();
        self.work_dir = Some(dir);
        Ok(path)
    }

    fn next_run_path(&mut self) -> Result<PathBuf> {
        let dir = self.ensure_work_dir()?;
        let path = dir.join(format!("run_{:04}.bin", self.next_run_id));
        self.next_run_id += 1;
        Ok(path)
    }

    /// Sort and deduplicate the buffer in place.
    fn sort_buffer(&mut self) {
        if self.threads > 1 {
            self.buffer.par_sort();
        } else {
            self.buffer.sort();
        }
        self.buffer.dedup();
    }

    /// Write the buffer as a run and clear it.
    fn spill(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        self.sort_buffer();
        let path = self.next_run_path()?;
        let mut writer = RunWriter::create(&path, self.temp_compression)?;
        let mut bytes = 0u64;
        for line in self.buffer.iter() {
            writer.write_line(line)?;
            bytes += line.len() as u64;
        }
        let lines = writer.finish()?;

        debug!("Spilled {} lines ({}) to {}", lines, format_bytes(bytes), path.display());
        self.stats.runs_written += 1;
        self.stats.bytes_spilled += bytes;
        self.runs.push(Run { path, level: 0 });
        self.buffer.clear();

        self.compact_full_levels()
    }

    /// Merge the newest runs while `max_open_runs` of them share a level.
    fn compact_full_levels(&mut self) -> Result<()> {
        while let Some(level) = self.runs.last().map(|run| run.level) {
            let same_level = self.runs.iter().rev().take_while(|run| run.level == level).count();
            if same_level < self.max_open_runs {
                break;
            }
            self.merge_newest(same_level, level + 1)?;
        }
        Ok(())
    }

    /// Bring the run count down to `max_open_runs`, merging the smallest runs first.
    fn reduce_runs(&mut self) -> Result<()> {
        while self.runs.len() > self.max_open_runs {
            let count = (self.runs.len() - self.max_open_runs + 1).min(self.max_open_runs);
            let level = self.runs[self.runs.len() - count].level;
            self.merge_newest(count, level)?;
        }
        Ok(())
    }

    /// Merge the newest `count` runs into one run at `level`.
    fn merge_newest(&mut self, count: usize, level: u32) -> Result<()> {
        let inputs = self.runs.split_off(self.runs.len() - count);
        debug!("Compacting {} runs into level {}", inputs.len(), level);

        let sources = inputs
            .iter()
            .map(|run| RunReader::open(&run.path).map(MergeSource::Run))
            .collect::<Result<Vec<_>>>()?;
        let mut merge = KWayMerge::new(sources)?;

        let path = self.next_run_path()?;
        let mut writer = RunWriter::create(&path, self.temp_compression)?;
        let mut bytes = 0u64;
        while let Some(line) = merge.next_line()? {
            writer.write_line(&line)?;
            bytes += line.len() as u64;
        }
        let lines = writer.finish()?;
        drop(merge);

        for run in &inputs {
            std::fs::remove_file(&run.path)
                .with_context(|| format!("Failed to remove run file: {}", run.path.display()))?;
        }

        debug!("Compacted {} runs into {} ({} lines)", inputs.len(), path.display(), lines);
        self.stats.runs_written += 1;
        self.stats.compactions += 1;
        self.stats.bytes_compacted += bytes;
        self.runs.push(Run { path, level });
        Ok(())
    }
}

impl LineSorter for ExternalSorter {
    type Sorted = SortedLines;

    fn insert(&mut self, line: Vec<u8>) -> Result<()> {
        self.stats.records_read += 1;
        self.stats.bytes_read += line.len() as u64;
        self.buffer.push(&line);

        if self.buffer.memory_usage() >= self.buffer_size {
            self.spill()?;
        }
        Ok(())
    }

    fn sorted(mut self) -> Result<SortedLines> {
        self.sort_buffer();
        let buffer = std::mem::take(&mut self.buffer);

        if self.runs.is_empty() {
            info!("All lines fit in memory, performing in-memory sort");
            let merge = KWayMerge::new(vec![MergeSource::memory(buffer)])?;
            return Ok(SortedLines::new(merge, self.work_dir.take()));
        }

        self.reduce_runs()?;
        let mut sources = self
            .runs
            .iter()
            .map(|run| RunReader::open(&run.path).map(MergeSource::Run))
            .collect::<Result<Vec<_>>>()?;
        if !buffer.is_empty() {
            sources.push(MergeSource::memory(buffer));
        }

        let merge = KWayMerge::new(sources)?;
        info!("Merging {} sources", merge.source_count());
        Ok(SortedLines::new(merge, self.work_dir.take()))
    }

    fn stats(&self) -> SortStats {
        self.stats
    }
}
