//! Background read-ahead for input files.
//!
//! A `ReadAheadLines` tokenizes one input file on a background thread and hands the
//! records to the consuming thread in batches through a bounded channel, so that
//! reading and tokenizing overlap with insertion into the sort engine.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   LineReader    │───>│  Batch channel  │───>│  Sort engine    │
//! │  (background)   │    │    (bounded)    │    │ (single writer) │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```

use crate::errors::Result;
use crate::lines::LineReader;
use crossbeam_channel::{Receiver, Sender, bounded};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

/// Number of lines per batch sent through the channel.
const BATCH_SIZE: usize = 4096;

/// Number of batches to buffer in the channel.
const CHANNEL_BUFFER_SIZE: usize = 8;

/// A batch of records, or the error that ended the file.
pub type LineBatch = Result<Vec<Vec<u8>>>;

/// Background tokenizer for a single input file.
pub struct ReadAheadLines {
    path: PathBuf,
    /// Receiver for batches (Option to allow closing before join).
    receiver: Option<Receiver<LineBatch>>,
    /// Handle to the reader thread.
    handle: Option<JoinHandle<()>>,
}

impl ReadAheadLines {
    /// Start tokenizing `path` in the background with the default batch configuration.
    #[must_use]
    pub fn spawn(path: PathBuf, max_line_length: Option<usize>) -> Self {
        Self::with_batch_size(path, max_line_length, BATCH_SIZE, CHANNEL_BUFFER_SIZE)
    }

    /// Start tokenizing `path` with explicit batch and channel sizes.
    #[must_use]
    pub fn with_batch_size(
        path: PathBuf,
        max_line_length: Option<usize>,
        batch_size: usize,
        channel_buffer: usize,
    ) -> Self {
        let (tx, rx) = bounded(channel_buffer.max(1));
        let thread_path = path.clone();
        let batch_size = batch_size.max(1);

        let handle = thread::spawn(move || {
            Self::reader_thread(thread_path, max_line_length, &tx, batch_size);
        });

        Self { path, receiver: Some(rx), handle: Some(handle) }
    }

    /// The file being read.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn reader_thread(
        path: PathBuf,
        max_line_length: Option<usize>,
        tx: &Sender<LineBatch>,
        batch_size: usize,
    ) {
        let reader = match LineReader::from_path(&path, max_line_length) {
            Ok(reader) => reader,
            Err(e) => {
                let _ = tx.send(Err(e));
                return;
            }
        };

        let mut batch = Vec::with_capacity(batch_size);
        for result in reader {
            match result {
                Ok(line) => {
                    batch.push(line);
                    if batch.len() >= batch_size {
                        if tx.send(Ok(batch)).is_err() {
                            // Receiver dropped
                            return;
                        }
                        batch = Vec::with_capacity(batch_size);
                    }
                }
                Err(e) => {
                    // Records before the error are still delivered in order.
                    if !batch.is_empty() && tx.send(Ok(batch)).is_err() {
                        return;
                    }
                    let _ = tx.send(Err(e));
                    return;
                }
            }
        }

        if !batch.is_empty() {
            let _ = tx.send(Ok(batch));
        }
    }

    /// Receive the next batch. `None` once the file is exhausted.
    pub fn next_batch(&mut self) -> Option<LineBatch> {
        let receiver = self.receiver.as_ref()?;
        match receiver.recv() {
            Ok(batch) => Some(batch),
            Err(_) => None,
        }
    }
}

impl Drop for ReadAheadLines {
    fn drop(&mut self) {
        // Close the receiver first so a reader blocked on a full channel can exit.
        drop(self.receiver.take());

        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Iterator for ReadAheadLines {
    type Item = LineBatch;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_batch()
    }
}
