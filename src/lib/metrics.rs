//! Sort metrics and TSV output.

use crate::corpus::IngestStats;
use crate::sink::SinkStats;
use crate::sort::SortStats;
use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of decimal places used for floating point metrics.
pub const FLOAT_PRECISION: usize = 6;

/// Summary of one `fsort` invocation, written as a single TSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortMetrics {
    /// Method name as given on the command line (`radix` or `extsort`).
    pub method: String,
    /// Number of input files.
    pub files: usize,
    /// Lines read from all inputs, duplicates included.
    pub records_read: u64,
    /// Distinct lines written to the output.
    pub records_written: u64,
    /// Run files spilled, compacted runs included.
    pub runs_written: usize,
    /// Number of run compactions.
    pub compactions: usize,
    /// Output lines whose write failed and was skipped.
    pub write_failures: u64,
    /// Wall-clock time of the whole sort.
    pub elapsed_seconds: String,
}

impl SortMetrics {
    /// Combine the statistics of each stage.
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        ingest: &IngestStats,
        sort: &SortStats,
        sink: &SinkStats,
        elapsed_seconds: f64,
    ) -> Self {
        Self {
            method: method.into(),
            files: ingest.files,
            records_read: ingest.lines,
            records_written: sink.lines_written,
            runs_written: sort.runs_written,
            compactions: sort.compactions,
            write_failures: sink.write_failures,
            elapsed_seconds: format!("{elapsed_seconds:.FLOAT_PRECISION$}"),
        }
    }
}

/// Write metrics to a TSV file.
pub fn write_metrics<P: AsRef<Path>, T: Serialize>(path: P, metrics: &[T]) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default()
        .write_tsv(&path_ref, metrics)
        .with_context(|| format!("Failed to write sort metrics: {}", path_ref.display()))
}
