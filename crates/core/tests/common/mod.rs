//! Shared test helpers for `pst_toolchain_core` integration tests.

#![allow(unreachable_pub)]

use std::path::PathBuf;
use std::sync::LazyLock;

use pst_toolchain_core::Document;

/// Repository `samples/` directory.
pub fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../samples")
}

/// Read a file from `samples/`.
pub fn read_sample(name: &str) -> String {
    let path = samples_dir().join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("failed to read {}: {}", path.display(), e))
}

/// The well-formed estimation-mode control file, loaded once per test binary.
pub static CASE: LazyLock<Document> = LazyLock::new(|| Document::new(&read_sample("case.pst")));

/// 0-based line of the first line equal to `text` after trimming.
#[allow(dead_code)]
pub fn line_of(doc: &Document, text: &str) -> usize {
    doc.lines()
        .position(|l| l.trim() == text)
        .unwrap_or_else(|| panic!("no line '{text}'"))
}
