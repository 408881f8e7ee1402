//! JSONL writing operations.

use crate::error::Result;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

/// Async writer for JSONL (JSON Lines) data.
///
/// Each value is serialized to a single line followed by `\n`. Output is
/// buffered; call [`flush`](Self::flush) before dropping the writer.
pub struct JsonlWriter<W> {
    writer: BufWriter<W>,
}

impl<W: AsyncWrite + Unpin> JsonlWriter<W> {
    /// Creates a new `JsonlWriter` wrapping the given async writer.
    #[must_use]
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Serializes one value as a line.
    pub async fn write<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let json = serde_json::to_vec(value)?;
        self.writer.write_all(&json).await?;
        self.writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Serializes every value of an iterator, one per line.
    pub async fn write_all<T, I>(&mut self, values: I) -> Result<()>
    where
        T: Serialize,
        I: IntoIterator<Item = T>,
    {
        for value in values {
            self.write(&value).await?;
        }
        Ok(())
    }

    /// Flushes buffered output to the underlying writer.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Consumes the writer, returning the underlying buffered writer.
    ///
    /// This does not flush.
    #[must_use]
    pub fn into_inner(self) -> BufWriter<W> {
        self.writer
    }
}
