//! Contiguous line buffer for the external sort.
//!
//! Lines are stored back to back in one allocation and sorted through a compact index,
//! which keeps per-line overhead at 24 bytes and avoids millions of small allocations.
//!
//! ```text
//! data: [line0][line1][line2]...
//! refs: [LineRef { prefix, offset, len }, ...]   <- sorted, data stays in place
//! ```

use rayon::prelude::*;
use std::cmp::Ordering;

/// Index entry for one line in a [`LineBuffer`].
#[derive(Copy, Clone, Debug)]
pub struct LineRef {
    /// First eight bytes of the line, big-endian, zero padded.
    prefix: u64,
    /// Offset of the line in the data buffer.
    offset: u64,
    /// Length of the line in bytes.
    len: u64,
}

/// Byte-lexicographic ordering key built from the first eight bytes of a line.
///
/// Zero padding keeps the key consistent with slice ordering: a key mismatch decides
/// the comparison, a key match is resolved by comparing the full slices.
#[inline]
#[must_use]
pub fn prefix_key(line: &[u8]) -> u64 {
    let mut bytes = [0u8; 8];
    let n = line.len().min(8);
    bytes[..n].copy_from_slice(&line[..n]);
    u64::from_be_bytes(bytes)
}

/// Arena of lines with a sortable index.
#[derive(Default)]
pub struct LineBuffer {
    data: Vec<u8>,
    refs: Vec<LineRef>,
}

impl LineBuffer {
    /// Append a line.
    #[inline]
    pub fn push(&mut self, line: &[u8]) {
        let offset = self.data.len() as u64;
        self.data.extend_from_slice(line);
        self.refs.push(LineRef { prefix: prefix_key(line), offset, len: line.len() as u64 });
    }

    #[inline]
    fn slice<'a>(data: &'a [u8], r: &LineRef) -> &'a [u8] {
        let start = r.offset as usize;
        &data[start..start + r.len as usize]
    }

    #[inline]
    fn compare(data: &[u8], a: &LineRef, b: &LineRef) -> Ordering {
        a.prefix.cmp(&b.prefix).then_with(|| Self::slice(data, a).cmp(Self::slice(data, b)))
    }

    /// Sort the index in byte-lexicographic order of the lines.
    pub fn sort(&mut self) {
        let data = &self.data;
        self.refs.sort_unstable_by(|a, b| Self::compare(data, a, b));
    }

    /// Sort using rayon's parallel sort.
    pub fn par_sort(&mut self) {
        let data = &self.data;
        self.refs.par_sort_unstable_by(|a, b| Self::compare(data, a, b));
    }

    /// Remove adjacent duplicates from the index. Call after sorting.
    pub fn dedup(&mut self) {
        let data = &self.data;
        self.refs
            .dedup_by(|a, b| a.prefix == b.prefix && Self::slice(data, a) == Self::slice(data, b));
    }

    /// Line bytes at index position `idx`.
    #[inline]
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&[u8]> {
        self.refs.get(idx).map(|r| Self::slice(&self.data, r))
    }

    /// Iterate over lines in index order.
    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.refs.iter().map(|r| Self::slice(&self.data, r))
    }

    /// Bytes accounted against the buffer budget: line data plus index entries.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.data.len() + self.refs.len() * std::mem::size_of::<LineRef>()
    }

    /// Number of lines in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Clear the buffer for reuse, keeping its allocations.
    pub fn clear(&mut self) {
        self.data.clear();
        self.refs.clear();
    }
}
