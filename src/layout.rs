//! On-disk layout of the corpus working tree.
//!
//! The filesystem is the only hand-off medium between stages:
//! each stage reads the previous stage's directory and owns its own.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Root of the working tree, relative to the current directory.
pub const TEXTS: &str = "texts";

/// Directory receiving downloaded XML documents.
pub fn xml_dir() -> PathBuf {
    Path::new(TEXTS).join("xml")
}

/// Directory receiving extracted and formatted sentence files.
pub fn sentences_dir() -> PathBuf {
    Path::new(TEXTS).join("sentences")
}

/// Remove `path` and everything under it, then recreate it empty.
///
/// Stages call this before their first write, so a re-run never
/// mixes old output with new.
pub fn reset_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)?;
    }
    fs::create_dir_all(path)
}
