//! Warning types for non-fatal problems found while reading JSONL.
//!
//! Resilient reading keeps going past bad lines. Each skipped line is
//! reported as a [`Warning`] carrying its 1-based line number, and the
//! caller decides whether the file as a whole is still usable.

use std::fmt;

/// A non-fatal warning that occurred during JSONL processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A line contained malformed JSON that could not be parsed.
    ///
    /// This is also what a file truncated in the middle of a record
    /// produces for its final line.
    MalformedJson {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the JSON parsing error.
        error: String,
    },

    /// A line was skipped for a reason other than malformed JSON.
    SkippedLine {
        /// The 1-based line number that was skipped.
        line_number: usize,
        /// The reason the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Returns the line number associated with this warning.
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_jsonl::Warning;
    ///
    /// let warning = Warning::MalformedJson {
    ///     line_number: 42,
    ///     error: "unexpected token".to_string(),
    /// };
    /// assert_eq!(warning.line_number(), 42);
    /// ```
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => write!(f, "line {line_number}: skipped: {reason}"),
        }
    }
}

impl std::error::Error for Warning {}
