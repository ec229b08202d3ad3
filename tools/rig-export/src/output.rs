//! Output file writing
//!
//! Files are written to a temporary file in the destination directory and renamed
//! into place, so a failed export never leaves a partial file behind.

use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Write `contents` to `path` atomically, replacing any existing file
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create output: {:?}", path))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write output: {:?}", path))?;
    file.as_file()
        .sync_all()
        .with_context(|| format!("Failed to flush output: {:?}", path))?;
    file.persist(path)
        .with_context(|| format!("Failed to move output into place: {:?}", path))?;

    Ok(())
}
