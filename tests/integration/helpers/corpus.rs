//! Seeded random corpora written across several input files.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Generate `count` random lines from a small alphabet so that duplicates are common.
///
/// Lines may be empty, share long prefixes, and contain `\r` or non-UTF-8 bytes, but
/// never `\n`.
pub fn random_lines(seed: u64, count: usize, max_len: usize) -> Vec<Vec<u8>> {
    const ALPHABET: &[u8] = b"abcAB019 \r\xc3\xa9\xff";
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let len = rng.random_range(0..=max_len);
            (0..len).map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())]).collect()
        })
        .collect()
}

/// Distinct lines in byte order.
pub fn sorted_unique(lines: &[Vec<u8>]) -> Vec<Vec<u8>> {
    lines.iter().cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

/// Write `lines` round-robin into `files` input files under `dir`.
///
/// The last file is left without a trailing newline unless its final line is empty.
pub fn write_inputs(dir: &Path, lines: &[Vec<u8>], files: usize) -> Vec<PathBuf> {
    let mut contents: Vec<Vec<u8>> = vec![Vec::new(); files];
    for (i, line) in lines.iter().enumerate() {
        let content = &mut contents[i % files];
        content.extend_from_slice(line);
        content.push(b'\n');
    }
    if let Some(last) = contents.last_mut() {
        let n = last.len();
        if n > 1 && last[n - 2] != b'\n' {
            last.pop();
        }
    }

    contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let path = dir.join(format!("input_{i}.txt"));
            std::fs::write(&path, content).expect("Failed to write input");
            path
        })
        .collect()
}

/// Write a single input file.
pub fn write_text(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write input");
    path
}

/// Convert string literals to owned byte lines.
pub fn lines_of(items: &[&str]) -> Vec<Vec<u8>> {
    items.iter().map(|s| s.as_bytes().to_vec()).collect()
}
