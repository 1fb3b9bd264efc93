//! Deduplicating line sort engines.
//!
//! Two engines implement [`LineSorter`]:
//! - **In-memory** ([`InMemorySorter`]): an ordered set of every distinct line. Fast, but
//!   memory grows with the distinct corpus.
//! - **External** ([`ExternalSorter`]): bounded-memory sort-merge that spills sorted,
//!   deduplicated runs to a temporary work area and merges them with a min-heap.
//!
//! # Architecture
//!
//! 1. **Accumulate phase**: Lines are pushed into the engine one at a time
//! 2. **Spill phase** (external only): Sort, deduplicate and write the buffer as a run
//! 3. **Compaction** (external only): Merge runs into one when the fan-in bound is hit
//! 4. **Merge phase**: Stream the sorted, duplicate-free sequence to the caller
//!
//! Both engines produce byte-identical output for the same corpus.

pub mod external;
pub mod in_memory;
pub mod line_buffer;
pub mod merge;
pub mod run;

use anyhow::Result;
use std::fmt;

pub use external::ExternalSorter;
pub use in_memory::InMemorySorter;
pub use merge::SortedLines;

/// Engine used to sort and deduplicate the corpus.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SortMethod {
    /// Ordered in-memory set.
    InMemory,
    /// Bounded-memory spill and merge.
    #[default]
    External,
}

impl fmt::Display for SortMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortMethod::InMemory => write!(f, "in-memory"),
            SortMethod::External => write!(f, "external"),
        }
    }
}

/// Statistics from a sort operation.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortStats {
    /// Lines inserted, duplicates included.
    pub records_read: u64,
    /// Bytes of line data inserted.
    pub bytes_read: u64,
    /// Number of run files written, compacted runs included.
    pub runs_written: usize,
    /// Number of times existing runs were merged into one.
    pub compactions: usize,
    /// Bytes of line data spilled to run files.
    pub bytes_spilled: u64,
    /// Bytes of line data rewritten by compactions.
    pub bytes_compacted: u64,
}

/// A sink for lines that yields them back sorted and deduplicated.
pub trait LineSorter {
    /// Stream of sorted, unique lines produced by [`LineSorter::sorted`].
    type Sorted: Iterator<Item = Result<Vec<u8>>>;

    /// Add one line to the corpus.
    fn insert(&mut self, line: Vec<u8>) -> Result<()>;

    /// Finish ingestion and return the sorted, duplicate-free sequence.
    fn sorted(self) -> Result<Self::Sorted>;

    /// Statistics accumulated so far.
    fn stats(&self) -> SortStats;
}
