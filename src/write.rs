//! Writing pages to the output directory.
//!
//! Plain `fs::write`: an existing file is replaced, and a crash mid-write can
//! leave a truncated file behind. Every run regenerates all pages, so the
//! next run repairs it.

use crate::naming;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Create the output directory and any missing parents. Existing is fine.
pub fn ensure_output_dir(dir: &Path) -> io::Result<()> {
    fs::create_dir_all(dir)
}

/// Write `contents` to `<dir>/<identifier>.md` and return the path.
pub fn write_page(dir: &Path, identifier: &str, contents: &str) -> io::Result<PathBuf> {
    let path = dir.join(naming::output_filename(identifier));
    fs::write(&path, contents)?;
    Ok(path)
}
