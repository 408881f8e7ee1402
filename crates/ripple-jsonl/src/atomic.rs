//! Atomic write operations for JSONL files.
//!
//! Data is written to a sibling temporary file which is flushed, closed and
//! then renamed over the target. On POSIX a rename within one filesystem is
//! atomic, so readers see either the old file or the complete new one.
//! A crash can leave the temporary file behind but never a half-written
//! target.

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically writes a slice of values to a JSONL file.
///
/// See [`write_jsonl_atomic_iter`].
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await
}

/// Atomically writes an iterator of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created or written, a
/// value fails to serialize, or the final rename fails. On failure the
/// target is left unchanged and the temporary file is removed on a best
/// effort basis.
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    tracing::trace!(path = %path.display(), "atomically replaced JSONL file");
    Ok(())
}

/// `graph.jsonl` -> `graph.jsonl.tmp`, `graph` -> `graph.tmp`.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(())
}
