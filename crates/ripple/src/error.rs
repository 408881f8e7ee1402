//! Error types for ripple operations.
//!
//! Nothing in this crate is unrecoverable. The worst case for every failure
//! is "rebuild everything", which is always correct and only slow:
//!
//! - [`ModelError`]: the model could not answer a query. Per-object failures
//!   degrade that object to zero outgoing edges; project-level and fatal
//!   failures abort a graph build.
//! - [`StoreError`]: a persisted snapshot could not be used. The store logs
//!   it and rebuilds the graph from a full scan instead.
//! - [`Error`]: what public operations return.

use crate::domain::{NodeId, ProjectName};
use std::io;
use thiserror::Error;

/// The error type for ripple operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Snapshot store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The model could not be queried.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The workspace has no project with this name.
    #[error("Project not found: {0}")]
    ProjectNotFound(ProjectName),

    /// A graph was handed a project other than the one it belongs to.
    #[error("Graph belongs to project {expected}, not {found}")]
    ProjectMismatch {
        /// Project that owns the graph
        expected: ProjectName,
        /// Project that was supplied
        found: ProjectName,
    },
}

/// A specialized Result type for ripple operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failure reported by the model collaborator.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// A single object could not report its dependencies.
    ///
    /// Graph building treats the object as having no outgoing edges.
    #[error("cannot compute dependencies of {node}: {reason}")]
    Object {
        /// The object that failed
        node: NodeId,
        /// Why it failed
        reason: String,
    },

    /// An object failed in a way that makes any graph built now unsafe.
    #[error("fatal model failure at {node}: {reason}")]
    Fatal {
        /// The object that failed
        node: NodeId,
        /// Why it failed
        reason: String,
    },

    /// The project could not enumerate its objects.
    #[error("cannot enumerate objects of project {project}: {reason}")]
    Project {
        /// The project that failed
        project: ProjectName,
        /// Why it failed
        reason: String,
    },
}

impl ModelError {
    /// Returns `true` if this failure must abort a graph build.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Object { .. })
    }
}

/// Reasons a persisted snapshot was rejected.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No snapshot exists for the project.
    #[error("no snapshot at {0}")]
    Missing(String),

    /// A line of the snapshot could not be decoded.
    #[error("malformed snapshot line: {0}")]
    Malformed(String),

    /// The first record is not a header.
    #[error("snapshot has no header record")]
    MissingHeader,

    /// The header names a format or version this build cannot read.
    #[error("unsupported snapshot format {format} v{version}")]
    UnsupportedFormat {
        /// Format name found in the header
        format: String,
        /// Format version found in the header
        version: u32,
    },

    /// The snapshot was written for a different project.
    #[error("snapshot belongs to project {found}, expected {expected}")]
    ProjectMismatch {
        /// Project being loaded
        expected: ProjectName,
        /// Project named in the header
        found: ProjectName,
    },

    /// Fewer or more edges than the header announced.
    #[error("snapshot announced {expected} edges but holds {found}")]
    Truncated {
        /// Edge count from the header
        expected: usize,
        /// Edges actually read
        found: usize,
    },

    /// The edge records do not hash to the header checksum.
    #[error("snapshot checksum mismatch")]
    ChecksumMismatch,

    /// IO error while reading or writing a snapshot.
    #[error("snapshot IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON error while writing a snapshot.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ripple_jsonl::Error> for StoreError {
    fn from(e: ripple_jsonl::Error) -> Self {
        match e {
            ripple_jsonl::Error::Io(io_err) => Self::Io(io_err),
            ripple_jsonl::Error::Json(json_err) => Self::Json(json_err),
            ripple_jsonl::Error::InvalidFormat(msg) => Self::Malformed(msg),
        }
    }
}
