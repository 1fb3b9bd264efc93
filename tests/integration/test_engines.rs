//! Engine correctness: deduplication, ordering, engine equivalence and buffer-size
//! invariance.

use anyhow::Result;
use fsort_lib::corpus::CorpusReader;
use fsort_lib::sink::{LineSink, SinkStats, WriteFailurePolicy};
use fsort_lib::sort::{ExternalSorter, InMemorySorter, LineSorter};
use rstest::rstest;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::helpers::{
    assert_output_eq, lines_of, random_lines, sorted_unique, write_inputs, write_text,
};

/// Feed `inputs` into `sorter` and write the sorted output to `out`.
fn sort_to_file<S: LineSorter>(
    mut sorter: S,
    inputs: &[PathBuf],
    threads: usize,
    out: &Path,
) -> Result<SinkStats> {
    CorpusReader::new(inputs.to_vec()).threads(threads).feed(&mut sorter)?;
    let mut sink = LineSink::create(out, WriteFailurePolicy::Abort)?;
    sink.drain(sorter.sorted()?)?;
    sink.finish()
}

#[test]
fn test_duplicates_within_one_file() {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "a.txt", "apple\nbanana\napple\n");
    let out = dir.path().join("out.txt");

    let stats = sort_to_file(ExternalSorter::new(), &[input], 1, &out).unwrap();
    assert_eq!(stats.lines_written, 2);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "apple\nbanana\n");
}

#[test]
fn test_duplicates_across_files() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![
        write_text(dir.path(), "1.txt", "b\n"),
        write_text(dir.path(), "2.txt", "a\n"),
        write_text(dir.path(), "3.txt", "a\n"),
    ];
    let out = dir.path().join("out.txt");

    sort_to_file(InMemorySorter::new(), &inputs, 1, &out).unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "a\nb\n");
}

#[rstest]
#[case::in_memory(false)]
#[case::external(true)]
fn test_empty_file_contributes_nothing(#[case] external: bool) {
    let dir = TempDir::new().unwrap();
    let inputs = vec![
        write_text(dir.path(), "empty.txt", ""),
        write_text(dir.path(), "words.txt", "pear\nfig\npear\n"),
    ];
    let out = dir.path().join("out.txt");

    if external {
        sort_to_file(ExternalSorter::new().buffer_size(1), &inputs, 1, &out).unwrap();
    } else {
        sort_to_file(InMemorySorter::new(), &inputs, 1, &out).unwrap();
    }
    assert_output_eq(&out, &lines_of(&["fig", "pear"]));
}

#[test]
fn test_all_inputs_empty() {
    let dir = TempDir::new().unwrap();
    let inputs = vec![write_text(dir.path(), "a.txt", ""), write_text(dir.path(), "b.txt", "")];
    let out = dir.path().join("out.txt");

    let stats = sort_to_file(ExternalSorter::new(), &inputs, 2, &out).unwrap();
    assert_eq!(stats.lines_written, 0);
    assert!(std::fs::read(&out).unwrap().is_empty());
}

#[test]
fn test_empty_lines_and_carriage_returns_are_records() {
    let dir = TempDir::new().unwrap();
    let input = write_text(dir.path(), "a.txt", "b\r\n\nb\n\na\n");
    let out = dir.path().join("out.txt");

    sort_to_file(ExternalSorter::new(), &[input], 1, &out).unwrap();
    assert_eq!(std::fs::read(&out).unwrap(), b"\na\nb\nb\r\n".to_vec());
}

#[rstest]
#[case(1, 1)]
#[case(2, 3)]
#[case(3, 7)]
fn test_engine_equivalence(#[case] seed: u64, #[case] files: usize) {
    let dir = TempDir::new().unwrap();
    let corpus = random_lines(seed, 5_000, 12);
    let inputs = write_inputs(dir.path(), &corpus, files);
    let expected = sorted_unique(&corpus);

    let in_memory_out = dir.path().join("radix.txt");
    let external_out = dir.path().join("extsort.txt");
    sort_to_file(InMemorySorter::new(), &inputs, 1, &in_memory_out).unwrap();
    sort_to_file(ExternalSorter::new().buffer_size(2_048), &inputs, 1, &external_out).unwrap();

    assert_output_eq(&in_memory_out, &expected);
    assert_eq!(std::fs::read(&in_memory_out).unwrap(), std::fs::read(&external_out).unwrap());
}

#[rstest]
fn test_buffer_size_invariance(
    #[values(1, 100, 4_096, 1 << 20)] buffer_size: usize,
    #[values(0, 1)] temp_compression: u32,
    #[values(2, 256)] max_open_runs: usize,
) {
    let dir = TempDir::new().unwrap();
    let corpus = random_lines(42, 600, 10);
    let inputs = write_inputs(dir.path(), &corpus, 3);
    let out = dir.path().join("out.txt");

    let sorter = ExternalSorter::new()
        .buffer_size(buffer_size)
        .temp_compression(temp_compression)
        .max_open_runs(max_open_runs)
        .temp_dir(dir.path().join("tmp"));
    sort_to_file(sorter, &inputs, 1, &out).unwrap();

    assert_output_eq(&out, &sorted_unique(&corpus));
}

#[rstest]
#[case::serial(1)]
#[case::parallel(4)]
fn test_threads_do_not_change_output(#[case] threads: usize) {
    let dir = TempDir::new().unwrap();
    let corpus = random_lines(7, 20_000, 8);
    let inputs = write_inputs(dir.path(), &corpus, 5);
    let out = dir.path().join("out.txt");

    let sorter = ExternalSorter::new().buffer_size(16 * 1024).threads(threads);
    sort_to_file(sorter, &inputs, threads, &out).unwrap();

    assert_output_eq(&out, &sorted_unique(&corpus));
}

#[test]
fn test_external_stats_report_spills() {
    let dir = TempDir::new().unwrap();
    let corpus = random_lines(11, 2_000, 10);
    let inputs = write_inputs(dir.path(), &corpus, 2);

    let mut sorter = ExternalSorter::new().buffer_size(1_024).max_open_runs(4);
    let ingest = CorpusReader::new(inputs).feed(&mut sorter).unwrap();
    let stats = sorter.stats();

    assert_eq!(ingest.lines, 2_000);
    assert_eq!(stats.records_read, 2_000);
    assert!(stats.runs_written > 4);
    assert!(stats.compactions > 0);

    let distinct = sorter.sorted().unwrap().count();
    assert_eq!(distinct, sorted_unique(&corpus).len());
}
