#![allow(clippy::doc_markdown)] // Generated file contains OPT_LEVEL without backticks

use std::sync::LazyLock;

include!(concat!(env!("OUT_DIR"), "/built.rs"));

/// Version string reported by `fsort --version` and logged at startup.
///
/// `<package version>-<git hash>` with a `-dirty` suffix for builds from a modified
/// tree, or just the package version when built outside a git checkout.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    version_string(PKG_VERSION, GIT_COMMIT_HASH_SHORT.or(GIT_COMMIT_HASH), GIT_DIRTY)
});

fn version_string(pkg: &str, hash: Option<&str>, dirty: Option<bool>) -> String {
    let mut version = match hash {
        Some(hash) => format!("{pkg}-{hash}"),
        None => pkg.to_string(),
    };
    if dirty == Some(true) {
        version.push_str("-dirty");
    }
    version
}
