//! Deduplicating k-way merge over sorted sources.
//!
//! Every source yields lines in strictly ascending order. The merge keeps one pending
//! line per source in a min-heap; when the smallest line is emitted, every other source
//! whose pending line is equal is advanced too, so a line present in several runs is
//! produced once.

use crate::sort::line_buffer::LineBuffer;
use crate::sort::run::RunReader;
use anyhow::Result;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use tempfile::TempDir;

/// A sorted, duplicate-free input to the merge.
pub enum MergeSource {
    /// A run file on disk.
    Run(RunReader),
    /// The residual in-memory buffer, already sorted and deduplicated.
    Memory { buffer: LineBuffer, idx: usize },
}

impl MergeSource {
    /// Wrap a sorted, deduplicated buffer.
    #[must_use]
    pub fn memory(buffer: LineBuffer) -> Self {
        MergeSource::Memory { buffer, idx: 0 }
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        match self {
            MergeSource::Run(reader) => reader.next_line(),
            MergeSource::Memory { buffer, idx } => {
                let line = buffer.get(*idx).map(<[u8]>::to_vec);
                if line.is_some() {
                    *idx += 1;
                }
                Ok(line)
            }
        }
    }
}

/// Entry in the merge heap.
struct HeapEntry {
    line: Vec<u8>,
    source_idx: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.line.cmp(&other.line).then_with(|| self.source_idx.cmp(&other.source_idx))
    }
}

/// Min-heap merge of sorted sources with cross-source deduplication.
pub struct KWayMerge {
    sources: Vec<MergeSource>,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl KWayMerge {
    /// Prime the heap with the first line of every source.
    pub fn new(sources: Vec<MergeSource>) -> Result<Self> {
        let mut merge = Self { heap: BinaryHeap::with_capacity(sources.len()), sources };
        for source_idx in 0..merge.sources.len() {
            merge.advance(source_idx)?;
        }
        Ok(merge)
    }

    /// Number of sources being merged.
    #[must_use]
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    fn advance(&mut self, source_idx: usize) -> Result<()> {
        if let Some(line) = self.sources[source_idx].next_line()? {
            self.heap.push(Reverse(HeapEntry { line, source_idx }));
        }
        Ok(())
    }

    /// Produce the next distinct line, or `None` once every source is exhausted.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(Reverse(entry)) = self.heap.pop() else {
            return Ok(None);
        };
        self.advance(entry.source_idx)?;

        while self.heap.peek().is_some_and(|Reverse(top)| top.line == entry.line) {
            if let Some(Reverse(duplicate)) = self.heap.pop() {
                self.advance(duplicate.source_idx)?;
            }
        }

        Ok(Some(entry.line))
    }
}

/// Sorted, duplicate-free stream of lines produced by a sort engine.
///
/// Owns the temporary work area (if any) holding the run files being merged; dropping
/// the stream, whether drained, abandoned part way or during unwinding, removes it.
/// After the first `Err` item the stream is exhausted.
pub struct SortedLines {
    merge: KWayMerge,
    emitted: u64,
    failed: bool,
    // Declared last so readers are closed before the directory is removed.
    _work_dir: Option<TempDir>,
}

impl SortedLines {
    pub(crate) fn new(merge: KWayMerge, work_dir: Option<TempDir>) -> Self {
        Self { merge, emitted: 0, failed: false, _work_dir: work_dir }
    }

    /// Number of lines produced so far.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.emitted
    }
}

impl Iterator for SortedLines {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.merge.next_line() {
            Ok(Some(line)) => {
                self.emitted += 1;
                Some(Ok(line))
            }
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
