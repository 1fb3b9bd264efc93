//! Newline tokenizer for raw byte streams.
//!
//! Splits input on the `\n` byte only. The newline is not part of the record, a trailing
//! `\r` is kept, and no encoding validation is performed. `0x0A` never occurs inside a
//! multi-byte UTF-8 sequence, so splitting on it cannot break a character apart.

use crate::errors::{FsortError, Result};
use memchr::memchr;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::Path;

/// Read buffer size for input files.
const INPUT_BUFFER_SIZE: usize = 256 * 1024;

/// Lazy, finite sequence of line records read from a byte stream.
///
/// A record longer than the configured maximum is an error rather than a skipped line;
/// the bound is enforced while scanning, so an over-long line is never fully buffered.
/// After the first error the reader is exhausted.
///
/// # Example
/// ```
/// use fsort_lib::lines::LineReader;
///
/// let lines: Vec<Vec<u8>> = LineReader::new(&b"apple\nbanana\npear"[..], None)
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(lines, vec![b"apple".to_vec(), b"banana".to_vec(), b"pear".to_vec()]);
/// ```
pub struct LineReader<R> {
    reader: R,
    max_line_length: Option<usize>,
    source_name: String,
    line_number: u64,
    bytes_read: u64,
    done: bool,
}

impl LineReader<BufReader<File>> {
    /// Open a file for tokenizing.
    pub fn from_path(path: &Path, max_line_length: Option<usize>) -> Result<Self> {
        let file = File::open(path).map_err(|e| FsortError::InvalidInput {
            description: "Input file".to_string(),
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let reader = BufReader::with_capacity(INPUT_BUFFER_SIZE, file);
        Ok(Self::new(reader, max_line_length).with_source(path.display().to_string()))
    }
}

impl<R: BufRead> LineReader<R> {
    /// Create a tokenizer over `reader`. `None` means lines may be of any length.
    pub fn new(reader: R, max_line_length: Option<usize>) -> Self {
        Self {
            reader,
            max_line_length,
            source_name: "<stream>".to_string(),
            line_number: 0,
            bytes_read: 0,
            done: false,
        }
    }

    /// Name used for this input in error messages.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Number of records returned so far.
    #[must_use]
    pub fn line_number(&self) -> u64 {
        self.line_number
    }

    /// Number of bytes consumed from the stream so far, newlines included.
    #[must_use]
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Read the next record, or `None` at end of stream.
    pub fn read_line(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let mut line = Vec::new();
        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.done = true;
                    return Err(e.into());
                }
            };

            if available.is_empty() {
                self.done = true;
                if line.is_empty() {
                    return Ok(None);
                }
                self.line_number += 1;
                return Ok(Some(line));
            }

            let (chunk, consumed, complete) = match memchr(b'\n', available) {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };

            if self.max_line_length.is_some_and(|max| line.len() + chunk.len() > max) {
                self.done = true;
                return Err(FsortError::LineTooLong {
                    source_name: self.source_name.clone(),
                    line_number: self.line_number + 1,
                    max_len: self.max_line_length.unwrap_or_default(),
                });
            }

            line.extend_from_slice(chunk);
            self.reader.consume(consumed);
            self.bytes_read += consumed as u64;

            if complete {
                self.line_number += 1;
                return Ok(Some(line));
            }
        }
    }
}

impl<R: BufRead> Iterator for LineReader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_line().transpose()
    }
}
