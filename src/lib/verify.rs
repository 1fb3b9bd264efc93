//! Checking that a file is already sorted and duplicate-free.

use crate::lines::LineReader;
use anyhow::Result;
use std::cmp::Ordering;
use std::io::BufRead;
use std::path::Path;

/// Outcome of checking one input.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    /// Number of lines read.
    pub lines_checked: u64,
    /// Lines smaller than the line before them.
    pub out_of_order: u64,
    /// Lines equal to the line before them.
    pub duplicates: u64,
    /// 1-based line number and content of the first offending line.
    pub first_violation: Option<(u64, Vec<u8>)>,
}

impl VerifyReport {
    /// Total number of offending lines.
    #[must_use]
    pub fn violations(&self) -> u64 {
        self.out_of_order + self.duplicates
    }

    /// True if every line is strictly greater than the one before it.
    #[must_use]
    pub fn is_sorted_unique(&self) -> bool {
        self.violations() == 0
    }
}

/// Check that the lines of `path` are strictly ascending in byte order.
pub fn verify_sorted_unique(path: &Path, max_line_length: Option<usize>) -> Result<VerifyReport> {
    let reader = LineReader::from_path(path, max_line_length)?;
    verify_lines(reader)
}

/// Check that the lines produced by `reader` are strictly ascending in byte order.
pub fn verify_lines<R: BufRead>(reader: LineReader<R>) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    let mut prev: Option<Vec<u8>> = None;

    for line in reader {
        let line = line?;
        report.lines_checked += 1;

        if let Some(prev_line) = &prev {
            let violation = match line.cmp(prev_line) {
                Ordering::Greater => false,
                Ordering::Equal => {
                    report.duplicates += 1;
                    true
                }
                Ordering::Less => {
                    report.out_of_order += 1;
                    true
                }
            };
            if violation && report.first_violation.is_none() {
                report.first_violation = Some((report.lines_checked, line.clone()));
            }
        }
        prev = Some(line);
    }

    Ok(report)
}
