//! Temporary work area lifecycle: removed on success, on abandonment and on failure.

use fsort_lib::corpus::CorpusReader;
use fsort_lib::errors::FsortError;
use fsort_lib::sink::{LineSink, WriteFailurePolicy};
use fsort_lib::sort::{ExternalSorter, LineSorter};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

use crate::helpers::{random_lines, write_inputs, write_text};

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

#[test]
fn test_work_area_removed_after_success() {
    let dir = TempDir::new().unwrap();
    let tmp = dir.path().join("tmp");
    let inputs = write_inputs(dir.path(), &random_lines(3, 1_000, 10), 2);

    let mut sorter = ExternalSorter::new().buffer_size(512).temp_dir(tmp.clone());
    CorpusReader::new(inputs).feed(&mut sorter).unwrap();
    assert!(sorter.stats().runs_written > 0);
    assert_eq!(entries(&tmp), 1);

    let out = dir.path().join("out.txt");
    let mut sink = LineSink::create(&out, WriteFailurePolicy::Abort).unwrap();
    sink.drain(sorter.sorted().unwrap()).unwrap();
    sink.finish().unwrap();

    assert_eq!(entries(&tmp), 0);
}

#[test]
fn test_work_area_removed_after_bound_violation() {
    let dir = TempDir::new().unwrap();
    let tmp = dir.path().join("tmp");
    let mut content: String = (0..500).map(|i| format!("word{i}\n")).collect();
    content.push_str(&"x".repeat(500));
    content.push('\n');
    let input = write_text(dir.path(), "a.txt", &content);

    let mut sorter = ExternalSorter::new().buffer_size(256).temp_dir(tmp.clone());
    let err = CorpusReader::new(vec![input])
        .max_line_length(Some(100))
        .feed(&mut sorter)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<FsortError>(),
        Some(FsortError::LineTooLong { line_number: 501, .. })
    ));
    assert!(sorter.stats().runs_written > 0);
    assert_eq!(entries(&tmp), 1);

    drop(sorter);
    assert_eq!(entries(&tmp), 0);
}

#[test]
fn test_work_area_removed_when_output_cannot_be_created() {
    let dir = TempDir::new().unwrap();
    let tmp = dir.path().join("tmp");
    let inputs = write_inputs(dir.path(), &random_lines(5, 1_000, 10), 1);

    let mut sorter = ExternalSorter::new().buffer_size(512).temp_dir(tmp.clone());
    CorpusReader::new(inputs).feed(&mut sorter).unwrap();
    let lines = sorter.sorted().unwrap();
    assert_eq!(entries(&tmp), 1);

    let missing = dir.path().join("no_such_dir").join("out.txt");
    assert!(LineSink::create(&missing, WriteFailurePolicy::Abort).is_err());
    drop(lines);
    assert_eq!(entries(&tmp), 0);
}

#[test]
fn test_cli_failure_leaves_no_temp_files_or_output() {
    let dir = TempDir::new().unwrap();
    let tmp = dir.path().join("tmp");
    let inputs = write_inputs(dir.path(), &random_lines(9, 2_000, 10), 2);
    let out = dir.path().join("no_such_dir").join("out.txt");

    let output = Command::new(env!("CARGO_BIN_EXE_fsort"))
        .args(["-f", inputs[0].to_str().unwrap(), "-f", inputs[1].to_str().unwrap()])
        .args(["-o", out.to_str().unwrap(), "--tmpdir", tmp.to_str().unwrap(), "-m", "1K"])
        .output()
        .expect("Failed to run fsort");

    assert!(!output.status.success());
    assert!(!out.exists());
    assert_eq!(entries(&tmp), 0);
}
