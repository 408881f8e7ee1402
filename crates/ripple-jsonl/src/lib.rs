//! JSON Lines plumbing for ripple.
//!
//! Provides buffered async reading with line tracking, resilient whole-file
//! reading that reports bad lines as [`Warning`]s instead of failing, a
//! buffered async writer, and crash-safe atomic file replacement.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::{read_jsonl_resilient, JsonlReader};
pub use warning::Warning;
pub use writer::JsonlWriter;
