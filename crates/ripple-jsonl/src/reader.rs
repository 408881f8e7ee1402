//! JSONL reading operations.
//!
//! [`JsonlReader`] reads one record per line with line number tracking.
//! [`read_jsonl_resilient`] reads a whole file, skipping and reporting lines
//! that cannot be decoded instead of failing on the first one.

use crate::error::{Error, Result};
use crate::warning::Warning;
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// Wraps an async reader in a [`BufReader`] and counts lines so that
/// decoding problems can be reported with their position.
///
/// # Examples
///
/// ```no_run
/// use ripple_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("graph.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_line::<serde_json::Value>().await? {
///     println!("{value}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before any line is read.
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
        }
    }

    /// Returns the 1-based number of the last line read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Reads the next raw line without its line terminator.
    ///
    /// Returns `Ok(None)` at end of input. A final line without a trailing
    /// newline is still returned.
    pub async fn next_raw_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let read = self.reader.read_until(b'\n', &mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }

    /// Reads and decodes the next non-blank line.
    ///
    /// # Errors
    ///
    /// Fails on the first line that is not valid UTF-8 or not valid JSON
    /// for `T`.
    pub async fn read_line<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        while let Some(bytes) = self.next_raw_line().await? {
            let text = std::str::from_utf8(&bytes).map_err(|e| {
                Error::InvalidFormat(format!("line {}: {}", self.line_number, e))
            })?;
            if text.trim().is_empty() {
                continue;
            }
            return Ok(Some(serde_json::from_str(text)?));
        }
        Ok(None)
    }

    /// Consumes the reader, returning the underlying buffered reader.
    #[must_use]
    pub fn into_inner(self) -> BufReader<R> {
        self.reader
    }
}

/// Reads every record of a JSONL file, collecting warnings for bad lines.
///
/// Blank lines are ignored. Lines that are not valid UTF-8 produce
/// [`Warning::SkippedLine`]; lines that do not decode as `T` produce
/// [`Warning::MalformedJson`]. Only I/O failures (including a missing file)
/// are returned as errors.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).await?;
    let mut reader = JsonlReader::new(file);
    let mut values = Vec::new();
    let mut warnings = Vec::new();

    while let Some(bytes) = reader.next_raw_line().await? {
        let line_number = reader.line_number();
        let Ok(text) = std::str::from_utf8(&bytes) else {
            warnings.push(Warning::SkippedLine {
                line_number,
                reason: "invalid UTF-8".to_string(),
            });
            continue;
        };
        if text.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(text) {
            Ok(value) => values.push(value),
            Err(e) => warnings.push(Warning::MalformedJson {
                line_number,
                error: e.to_string(),
            }),
        }
    }

    tracing::trace!(
        path = %path.display(),
        records = values.len(),
        warnings = warnings.len(),
        "read JSONL file"
    );
    Ok((values, warnings))
}
