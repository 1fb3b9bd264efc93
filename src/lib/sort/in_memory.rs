//! In-memory dedup sort backed by an ordered set.

use crate::sort::{LineSorter, SortStats};
use anyhow::Result;
use std::collections::BTreeSet;
use std::collections::btree_set;

/// Sorts by inserting every line into a `BTreeSet`; re-inserting a line is a no-op.
///
/// # Example
/// ```
/// use fsort_lib::sort::{InMemorySorter, LineSorter};
///
/// let mut sorter = InMemorySorter::new();
/// for line in ["pear", "apple", "pear"] {
///     sorter.insert(line.as_bytes().to_vec()).unwrap();
/// }
/// let lines: Vec<Vec<u8>> = sorter.sorted().unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(lines, vec![b"apple".to_vec(), b"pear".to_vec()]);
/// ```
#[derive(Default)]
pub struct InMemorySorter {
    lines: BTreeSet<Vec<u8>>,
    stats: SortStats,
}

impl InMemorySorter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct lines held.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.lines.len()
    }
}

impl LineSorter for InMemorySorter {
    type Sorted = InMemoryLines;

    fn insert(&mut self, line: Vec<u8>) -> Result<()> {
        self.stats.records_read += 1;
        self.stats.bytes_read += line.len() as u64;
        self.lines.insert(line);
        Ok(())
    }

    fn sorted(self) -> Result<InMemoryLines> {
        Ok(InMemoryLines { inner: self.lines.into_iter() })
    }

    fn stats(&self) -> SortStats {
        self.stats
    }
}

/// Ascending iteration over the distinct lines of an [`InMemorySorter`].
pub struct InMemoryLines {
    inner: btree_set::IntoIter<Vec<u8>>,
}

impl Iterator for InMemoryLines {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(Ok)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
