//! Run files: sorted, duplicate-free batches of lines spilled to temporary storage.
//!
//! Format: `[len: u32 LE][line: len bytes]` per line, optionally wrapped in a gzip
//! stream. Readers auto-detect compression from the gzip magic bytes.

use crate::errors::FsortError;
use anyhow::{Context, Result};
use flate2::Compression;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Buffer size for writing run files.
const RUN_WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Buffer size for reading run files during merge.
const RUN_READ_BUFFER_SIZE: usize = 64 * 1024;

/// gzip magic bytes.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Wrapper for run writers supporting both raw and compressed output.
enum RunWriterInner {
    /// Uncompressed output (fastest).
    Raw(BufWriter<File>),
    /// gzip-compressed output.
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for RunWriterInner {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            RunWriterInner::Raw(w) => w.write(buf),
            RunWriterInner::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            RunWriterInner::Raw(w) => w.flush(),
            RunWriterInner::Gzip(w) => w.flush(),
        }
    }
}

/// Writer for one run file.
pub struct RunWriter {
    path: PathBuf,
    writer: RunWriterInner,
    lines: u64,
}

impl RunWriter {
    /// Create a run file.
    ///
    /// - `compression_level` 0 = uncompressed.
    /// - `compression_level` 1-9 = gzip at the given level.
    pub fn create(path: &Path, compression_level: u32) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create run file: {}", path.display()))?;
        let buf = BufWriter::with_capacity(RUN_WRITE_BUFFER_SIZE, file);

        let writer = if compression_level == 0 {
            RunWriterInner::Raw(buf)
        } else {
            RunWriterInner::Gzip(GzEncoder::new(buf, Compression::new(compression_level.min(9))))
        };

        Ok(Self { path: path.to_path_buf(), writer, lines: 0 })
    }

    /// Append a line.
    #[inline]
    pub fn write_line(&mut self, line: &[u8]) -> Result<()> {
        let len = u32::try_from(line.len()).map_err(|_| FsortError::InvalidParameter {
            parameter: "line".to_string(),
            reason: format!("{} byte line does not fit in a run file", line.len()),
        })?;
        self.writer
            .write_all(&len.to_le_bytes())
            .and_then(|()| self.writer.write_all(line))
            .with_context(|| format!("Failed to write run file: {}", self.path.display()))?;
        self.lines += 1;
        Ok(())
    }

    /// Finish writing, flushing all data to disk. Returns the number of lines written.
    pub fn finish(self) -> Result<u64> {
        let path = self.path;
        let result = match self.writer {
            RunWriterInner::Raw(mut w) => w.flush(),
            RunWriterInner::Gzip(w) => w.finish().and_then(|mut inner| inner.flush()),
        };
        result.with_context(|| format!("Failed to finish run file: {}", path.display()))?;
        Ok(self.lines)
    }
}

/// Wrapper for run readers supporting both raw and compressed input.
enum RunReaderInner {
    Raw(BufReader<File>),
    Gzip(Box<MultiGzDecoder<BufReader<File>>>),
}

impl Read for RunReaderInner {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            RunReaderInner::Raw(r) => r.read(buf),
            RunReaderInner::Gzip(r) => r.read(buf),
        }
    }
}

/// Sequential reader over one run file.
pub struct RunReader {
    path: PathBuf,
    reader: RunReaderInner,
}

impl RunReader {
    /// Open a run file, detecting gzip compression via magic bytes.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open run file: {}", path.display()))?;
        let mut buf_reader = BufReader::with_capacity(RUN_READ_BUFFER_SIZE, file);

        let mut magic = [0u8; 2];
        let is_compressed = match buf_reader.read_exact(&mut magic) {
            Ok(()) => magic == GZIP_MAGIC,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => false,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read run file: {}", path.display()));
            }
        };
        buf_reader
            .seek(SeekFrom::Start(0))
            .with_context(|| format!("Failed to seek in run file: {}", path.display()))?;

        let reader = if is_compressed {
            RunReaderInner::Gzip(Box::new(MultiGzDecoder::new(buf_reader)))
        } else {
            RunReaderInner::Raw(buf_reader)
        };

        Ok(Self { path: path.to_path_buf(), reader })
    }

    fn corrupt(&self, reason: impl Into<String>) -> FsortError {
        FsortError::CorruptRun { path: self.path.clone(), reason: reason.into() }
    }

    /// Read the next line, `None` at a clean end of file.
    ///
    /// A file that ends inside a length prefix or a line, or whose compressed stream
    /// cannot be decoded, yields [`FsortError::CorruptRun`].
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut len_buf = [0u8; 4];
        let mut filled = 0;
        while filled < len_buf.len() {
            match self.reader.read(&mut len_buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => return Err(self.corrupt("truncated length prefix").into()),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(self.corrupt(e.to_string()).into()),
            }
        }

        // The line grows as bytes arrive, so a corrupt prefix cannot force a huge allocation.
        let len = u32::from_le_bytes(len_buf) as usize;
        let mut line = Vec::with_capacity(len.min(RUN_READ_BUFFER_SIZE));
        let read = (&mut self.reader).take(len as u64).read_to_end(&mut line);
        match read {
            Ok(n) if n == len => Ok(Some(line)),
            Ok(n) => Err(self
                .corrupt(format!("truncated line: expected {len} bytes, found {n}"))
                .into()),
            Err(e) => Err(self.corrupt(e.to_string()).into()),
        }
    }
}
