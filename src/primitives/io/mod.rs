#![forbid(unsafe_code)]
//! Whole-file I/O used by the columnar file on flush and open.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::types::Result;

/// Reads the entire resource at `path` into memory.
pub fn read_file(path: impl AsRef<Path>) -> Result<Bytes> {
    let path = path.as_ref();
    let data = fs::read(path)?;
    debug!(path = %path.display(), len = data.len(), "colfile.io.read");
    Ok(Bytes::from(data))
}

/// Writes `data` to `path`, creating or replacing it.
///
/// Bytes are staged in a temporary file in the destination directory and
/// renamed into place, so the destination holds either the previous contents
/// or the complete new buffer. The staging handle is dropped on every path.
pub fn write_file(path: impl AsRef<Path>, data: &[u8], sync: bool) -> Result<()> {
    let path = path.as_ref();
    let mut staged = NamedTempFile::new_in(parent_dir(path))?;
    staged.as_file_mut().write_all(data)?;
    if sync {
        staged.as_file().sync_all()?;
    }
    staged.persist(path).map_err(|err| err.error)?;
    debug!(path = %path.display(), len = data.len(), sync, "colfile.io.write");
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
