//! Merge line files into one sorted, duplicate-free file.
//!
//! # Methods
//!
//! - **radix**: Every distinct line is held in an ordered in-memory set
//! - **extsort**: Bounded-memory external merge-sort through temporary run files
//!
//! Both produce byte-identical output.
//!
//! # Verification
//!
//! Use `--verify` to check that files are already sorted and duplicate-free without
//! writing output.

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use fsort_lib::corpus::{CorpusReader, IngestStats};
use fsort_lib::logging::{OperationTimer, format_bytes, format_count, log_memory_usage};
use fsort_lib::metrics::{SortMetrics, write_metrics};
use fsort_lib::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressTracker};
use fsort_lib::sink::{LineSink, SinkStats, WriteFailurePolicy};
use fsort_lib::sort::external::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_OPEN_RUNS};
use fsort_lib::sort::{ExternalSorter, InMemorySorter, LineSorter, SortMethod, SortStats};
use fsort_lib::validation::{validate_at_least, validate_files_exist, validate_positive};
use fsort_lib::verify::verify_sorted_unique;
use log::{info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Long flags that older invocations pass with a single dash (`-file a.txt`).
const SINGLE_DASH_FLAGS: [&str; 7] =
    ["file", "maxlen", "method", "out", "tmpdir", "verbose", "version"];

/// Sort engine selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// Ordered in-memory set
    Radix,
    /// External merge-sort with temporary run files
    Extsort,
}

impl MethodArg {
    /// Name used on the command line and in derived output names.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            MethodArg::Radix => "radix",
            MethodArg::Extsort => "extsort",
        }
    }
}

impl From<MethodArg> for SortMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Radix => SortMethod::InMemory,
            MethodArg::Extsort => SortMethod::External,
        }
    }
}

/// Behavior when writing an output line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WriteErrorArg {
    /// Stop at the first failed write
    Abort,
    /// Log the failed line and keep writing
    Continue,
}

impl From<WriteErrorArg> for WriteFailurePolicy {
    fn from(arg: WriteErrorArg) -> Self {
        match arg {
            WriteErrorArg::Abort => WriteFailurePolicy::Abort,
            WriteErrorArg::Continue => WriteFailurePolicy::Continue,
        }
    }
}

/// Merge line files into one sorted, duplicate-free file.
#[derive(Debug, Parser)]
#[command(
    name = "fsort",
    version = crate::version::VERSION.as_str(),
    styles = crate::STYLES,
    about = "\x1b[36mMerge line files into one sorted, duplicate-free file\x1b[0m",
    long_about = r#"
Merge any number of line-oriented text files into a single output file that contains
every distinct line exactly once, sorted in byte-lexicographic order.

Lines are split on '\n' only and compared as raw bytes: no locale, no Unicode collation,
no encoding validation. A trailing '\r' is part of the line. Empty lines are kept.

METHODS:

  radix     Hold every distinct line in an ordered in-memory set. Fastest when the
            distinct corpus fits in RAM.

  extsort   Sort bounded buffers (--buffer-size), spill them as temporary runs under
            --tmpdir, then merge the runs. Handles corpora larger than RAM.

OUTPUT:

  Without --out, the output is written to the current directory as the method name
  followed by '_<stem>' for each input, e.g. 'extsort_a_b' for 'a.txt b.txt'.

EXAMPLES:

  # Merge two wordlists
  fsort -f a.txt -f b.txt -o merged.txt

  # Large corpus with a 512 MiB buffer, 4 threads and a scratch disk
  fsort -f huge.txt -m 512M -t 4 --tmpdir /scratch --verbose

  # Check a file is already sorted and duplicate-free
  fsort -f merged.txt --verify

COMPATIBILITY:

  The single-dash forms -file, -maxlen, -method, -out, -tmpdir, -verbose and -version
  (with a separate value or '=value') are read as their double-dash equivalents.
"#
)]
pub struct Fsort {
    /// Input file (repeat for multiple files).
    #[arg(short = 'f', long = "file", required = true)]
    pub files: Vec<PathBuf>,

    /// Maximum line length in bytes; a longer line is an error. Unbounded if unset.
    #[arg(long = "maxlen")]
    pub maxlen: Option<usize>,

    /// Sort method.
    #[arg(long = "method", value_enum, default_value = "extsort")]
    pub method: MethodArg,

    /// Output file. Derived from the method and input names if unset.
    #[arg(short = 'o', long = "out", conflicts_with = "verify")]
    pub out: Option<PathBuf>,

    /// Base directory for temporary run files (default: system temp directory).
    #[arg(long = "tmpdir")]
    pub tmpdir: Option<PathBuf>,

    /// Log per-file counts, progress and memory usage.
    #[arg(long = "verbose")]
    pub verbose: bool,

    /// In-memory buffer budget for extsort (e.g. 512K, 64M, 2G).
    #[arg(short = 'm', long = "buffer-size", default_value = "2M", value_parser = parse_memory)]
    pub buffer_size: usize,

    /// Threads for reading inputs ahead and sorting buffers.
    #[arg(short = 't', long = "threads", default_value = "1")]
    pub threads: usize,

    /// gzip level for temporary run files (0 = uncompressed).
    #[arg(
        long = "temp-compression",
        default_value = "1",
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub temp_compression: u32,

    /// Maximum number of temporary runs merged at once.
    #[arg(long = "max-open-runs", default_value_t = DEFAULT_MAX_OPEN_RUNS)]
    pub max_open_runs: usize,

    /// What to do when writing an output line fails.
    #[arg(long = "on-write-error", value_enum, default_value = "abort")]
    pub on_write_error: WriteErrorArg,

    /// Log progress every N lines (with --verbose).
    #[arg(long = "progress-interval", default_value_t = DEFAULT_PROGRESS_INTERVAL)]
    pub progress_interval: u64,

    /// Write a one-row TSV of sort metrics to this path.
    #[arg(long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Check that each input is already sorted and duplicate-free (no output written).
    #[arg(long = "verify", conflicts_with = "out")]
    pub verify: bool,
}

/// Parse memory size string (e.g., "512M", "1G", "2G").
fn parse_memory(s: &str) -> Result<usize, String> {
    let s = s.trim().to_uppercase();

    if s.is_empty() {
        return Err("Empty memory specification".to_string());
    }

    let (num_str, multiplier) = if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: f64 = num_str.parse().map_err(|_| format!("Invalid number: {num_str}"))?;

    if num <= 0.0 {
        return Err("Memory size must be positive".to_string());
    }

    Ok((num * f64::from(multiplier)) as usize)
}

/// Rewrite single-dash long flags such as `-out x` or `-maxlen=100` to their `--` form.
///
/// Clap would otherwise read `-out x` as `-o ut` followed by a stray `x`. Arguments after
/// `--` are left untouched.
pub fn normalize_single_dash_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut literal = false;
    args.into_iter()
        .map(|arg| {
            if literal {
                return arg;
            }
            let Some(text) = arg.to_str() else { return arg };
            if text == "--" {
                literal = true;
                return arg;
            }
            let Some(flag) = text.strip_prefix('-').filter(|rest| !rest.starts_with('-')) else {
                return arg;
            };
            let name = flag.split_once('=').map_or(flag, |(name, _)| name);
            if SINGLE_DASH_FLAGS.contains(&name) { OsString::from(format!("-{text}")) } else { arg }
        })
        .collect()
}

/// Output path used when `--out` is not given: `<method>_<stem1>_<stem2>...`.
#[must_use]
pub fn default_output_path(method: MethodArg, files: &[PathBuf]) -> PathBuf {
    let mut name = method.name().to_string();
    for file in files {
        name.push('_');
        let stem = file.file_stem().or_else(|| file.file_name()).unwrap_or(file.as_os_str());
        name.push_str(&stem.to_string_lossy());
    }
    PathBuf::from(name)
}

/// Statistics from every stage of one sort.
struct RunStats {
    ingest: IngestStats,
    sort: SortStats,
    sink: SinkStats,
}

impl Fsort {
    /// Run the command.
    pub fn execute(&self) -> Result<()> {
        self.validate()?;

        if self.verify {
            return self.execute_verify();
        }

        self.execute_sort()
    }

    fn validate(&self) -> Result<()> {
        validate_files_exist(&self.files, "Input file")?;
        validate_positive(self.buffer_size, "buffer-size")?;
        validate_at_least(self.threads, 1, "threads")?;
        validate_at_least(self.max_open_runs, 2, "max-open-runs")?;
        validate_at_least(self.progress_interval, 1, "progress-interval")?;
        if let Some(maxlen) = self.maxlen {
            validate_at_least(maxlen, 1, "maxlen")?;
        }
        Ok(())
    }

    fn output_path(&self) -> PathBuf {
        self.out.clone().unwrap_or_else(|| default_output_path(self.method, &self.files))
    }

    /// Execute sort mode: read, sort, and write output.
    fn execute_sort(&self) -> Result<()> {
        let output = self.output_path();
        let method = SortMethod::from(self.method);
        let timer = OperationTimer::new("Sorting lines");

        info!("Starting fsort");
        for file in &self.files {
            info!("Input: {}", file.display());
        }
        info!("Output: {}", output.display());
        info!("Method: {} ({method})", self.method.name());
        match self.maxlen {
            Some(maxlen) => info!("Max line length: {maxlen} bytes"),
            None => info!("Max line length: unbounded"),
        }
        if method == SortMethod::External {
            info!("Buffer size: {}", format_bytes(self.buffer_size as u64));
            info!("Temp compression level: {}", self.temp_compression);
            info!("Max open runs: {}", self.max_open_runs);
            if let Some(ref tmp) = self.tmpdir {
                info!("Temp directory: {}", tmp.display());
            }
        }
        info!("Threads: {}", self.threads);

        let stats = match method {
            SortMethod::InMemory => self.run_engine(InMemorySorter::new(), &output)?,
            SortMethod::External => {
                let mut sorter = ExternalSorter::new()
                    .buffer_size(self.buffer_size)
                    .threads(self.threads)
                    .temp_compression(self.temp_compression)
                    .max_open_runs(self.max_open_runs);
                if let Some(ref tmp) = self.tmpdir {
                    sorter = sorter.temp_dir(tmp.clone());
                }
                self.run_engine(sorter, &output)?
            }
        };

        // Summary
        info!("=== Summary ===");
        info!("Files read: {}", stats.ingest.files);
        info!("Lines read: {}", format_count(stats.ingest.lines));
        info!("Lines written: {}", format_count(stats.sink.lines_written));
        info!(
            "Duplicates removed: {}",
            format_count(stats.ingest.lines.saturating_sub(stats.sink.lines_written))
        );
        if stats.sort.runs_written > 0 {
            info!("Temporary runs: {}", stats.sort.runs_written);
            info!("Spilled: {}", format_bytes(stats.sort.bytes_spilled));
        }
        if stats.sort.compactions > 0 {
            info!("Run compactions: {}", stats.sort.compactions);
            info!("Compacted: {}", format_bytes(stats.sort.bytes_compacted));
        }
        if stats.sink.write_failures > 0 {
            warn!("Failed writes: {}", format_count(stats.sink.write_failures));
        }
        info!("Output: {}", output.display());

        if let Some(ref path) = self.metrics {
            let metrics = SortMetrics::new(
                self.method.name(),
                &stats.ingest,
                &stats.sort,
                &stats.sink,
                timer.elapsed().as_secs_f64(),
            );
            write_metrics(path, &[metrics])?;
            info!("Wrote metrics to {}", path.display());
        }

        timer.log_completion(stats.ingest.lines);
        Ok(())
    }

    /// Feed the corpus into `sorter` and write its sorted output.
    ///
    /// The output file is only created once every input has been read, and is removed
    /// again if writing it fails.
    fn run_engine<S: LineSorter>(&self, mut sorter: S, output: &Path) -> Result<RunStats> {
        let ingest = CorpusReader::new(self.files.clone())
            .max_line_length(self.maxlen)
            .threads(self.threads)
            .verbose(self.verbose)
            .progress_interval(self.progress_interval)
            .feed(&mut sorter)?;
        if self.verbose {
            log_memory_usage("read");
        }

        let sort = sorter.stats();
        let lines = sorter.sorted()?;

        let mut sink = LineSink::create(output, self.on_write_error.into())?;
        if self.verbose {
            sink = sink.with_progress(
                ProgressTracker::new("Wrote lines")
                    .with_interval(self.progress_interval)
                    .with_total(ingest.lines),
            );
        }

        let written = sink.drain(lines).and_then(|()| sink.finish());
        let sink = match written {
            Ok(stats) => stats,
            Err(e) => {
                if let Err(remove_err) = std::fs::remove_file(output) {
                    warn!("Failed to remove partial output {}: {remove_err}", output.display());
                }
                return Err(e).with_context(|| format!("Failed to write {}", output.display()));
            }
        };
        if self.verbose {
            log_memory_usage("write");
        }

        Ok(RunStats { ingest, sort, sink })
    }

    /// Execute verify mode: read each input and check it is strictly ascending.
    fn execute_verify(&self) -> Result<()> {
        let timer = OperationTimer::new("Verifying sort order");

        let mut total_lines = 0u64;
        let mut failed_files = 0usize;
        for file in &self.files {
            let report = verify_sorted_unique(file, self.maxlen)?;
            total_lines += report.lines_checked;

            info!("=== Verification: {} ===", file.display());
            info!("Lines checked: {}", format_count(report.lines_checked));
            info!("Out-of-order lines: {}", report.out_of_order);
            info!("Duplicate lines: {}", report.duplicates);

            if report.is_sorted_unique() {
                info!("Result: PASS");
            } else {
                failed_files += 1;
                if let Some((line_number, ref line)) = report.first_violation {
                    info!(
                        "First violation at line {line_number}: {}",
                        String::from_utf8_lossy(line)
                    );
                }
                info!("Result: FAIL");
            }
        }

        timer.log_completion(total_lines);
        if failed_files > 0 {
            bail!(
                "{failed_files} of {} files are NOT sorted and duplicate-free",
                self.files.len()
            );
        }
        Ok(())
    }
}
