//! Persistence of dependency graphs across sessions.
//!
//! A [`DependencyGraphStore`] saves one snapshot per project through a
//! [`SnapshotBackend`] and loads it back on first access. Two backends are
//! provided:
//!
//! - **JSONL**: one file per project under a state directory, replaced
//!   atomically on every save
//! - **In-memory**: ephemeral, for tests and embedders without a disk
//!
//! Loading never fails because of the snapshot. Anything wrong with it
//! (missing, corrupt, truncated, written for another project or format)
//! is logged and answered with a fresh [`DependencyGraph::build`].
//!
//! # Example
//!
//! ```no_run
//! use ripple::model::InMemoryProject;
//! use ripple::store::DependencyGraphStore;
//!
//! # async fn example() -> ripple::Result<()> {
//! let store = DependencyGraphStore::jsonl(".ripple/graphs");
//! let project = InMemoryProject::new("core");
//!
//! let loaded = store.load(&project).await?;
//! store.save(&loaded.graph).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::ProjectName;
use crate::error::{Result, StoreError};
use crate::graph::DependencyGraph;
use crate::model::ProjectModel;
use async_trait::async_trait;
use ripple_jsonl::{read_jsonl_resilient, write_jsonl_atomic};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod snapshot;

pub use snapshot::{SnapshotHeader, SnapshotRecord};

/// Result of a snapshot operation.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Where snapshot records are kept.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    /// Read every record saved for `project`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Missing`] if nothing was saved, or another
    /// [`StoreError`] if the stored data cannot be read.
    async fn read(&self, project: &ProjectName) -> StoreResult<Vec<SnapshotRecord>>;

    /// Replace whatever is saved for `project` with `records`.
    async fn write(&self, project: &ProjectName, records: Vec<SnapshotRecord>) -> StoreResult<()>;

    /// Delete the snapshot of `project`. Returns whether one existed.
    async fn remove(&self, project: &ProjectName) -> StoreResult<bool>;
}

/// Snapshot files under a state directory.
#[derive(Debug, Clone)]
pub struct JsonlSnapshotBackend {
    state_dir: PathBuf,
}

impl JsonlSnapshotBackend {
    /// Keep snapshots in `state_dir`, created on first save.
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// File holding the snapshot of `project`.
    #[must_use]
    pub fn snapshot_path(&self, project: &ProjectName) -> PathBuf {
        self.state_dir.join(snapshot_file_name(project))
    }
}

/// `core` -> `core.jsonl`, `My Project/v2` -> `My_Project_v2-dded50d6.jsonl`.
///
/// Names that had to be sanitized carry a short hash of the raw name so
/// that `a b` and `a_b` keep separate files.
fn snapshot_file_name(project: &ProjectName) -> String {
    let raw = project.as_str();
    let stem: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if stem == raw {
        return format!("{stem}.jsonl");
    }
    let digest = format!("{:x}", Sha256::digest(raw.as_bytes()));
    format!("{stem}-{}.jsonl", &digest[..8])
}

#[async_trait]
impl SnapshotBackend for JsonlSnapshotBackend {
    async fn read(&self, project: &ProjectName) -> StoreResult<Vec<SnapshotRecord>> {
        let path = self.snapshot_path(project);
        let (records, warnings) = match read_jsonl_resilient::<SnapshotRecord, _>(&path).await {
            Ok(read) => read,
            Err(e) if e.is_not_found() => {
                return Err(StoreError::Missing(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(first) = warnings.first() {
            debug!(
                path = %path.display(),
                warnings = warnings.len(),
                "snapshot has unreadable lines"
            );
            return Err(StoreError::Malformed(first.to_string()));
        }
        Ok(records)
    }

    async fn write(&self, project: &ProjectName, records: Vec<SnapshotRecord>) -> StoreResult<()> {
        tokio::fs::create_dir_all(&self.state_dir).await?;
        write_jsonl_atomic(self.snapshot_path(project), &records).await?;
        Ok(())
    }

    async fn remove(&self, project: &ProjectName) -> StoreResult<bool> {
        match tokio::fs::remove_file(self.snapshot_path(project)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshots kept in process memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshotBackend {
    snapshots: RwLock<HashMap<ProjectName, Vec<SnapshotRecord>>>,
}

impl InMemorySnapshotBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotBackend for InMemorySnapshotBackend {
    async fn read(&self, project: &ProjectName) -> StoreResult<Vec<SnapshotRecord>> {
        self.snapshots
            .read()
            .await
            .get(project)
            .cloned()
            .ok_or_else(|| StoreError::Missing(format!("memory:{project}")))
    }

    async fn write(&self, project: &ProjectName, records: Vec<SnapshotRecord>) -> StoreResult<()> {
        self.snapshots.write().await.insert(project.clone(), records);
        Ok(())
    }

    async fn remove(&self, project: &ProjectName) -> StoreResult<bool> {
        Ok(self.snapshots.write().await.remove(project).is_some())
    }
}

/// How a loaded graph came to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphOrigin {
    /// Read from a valid snapshot
    Snapshot,
    /// Built from a full scan because the snapshot was unusable
    Rebuilt {
        /// Why the snapshot was not used
        reason: String,
    },
}

/// Result of [`DependencyGraphStore::load`].
#[derive(Debug, Clone)]
pub struct LoadedGraph {
    /// The graph
    pub graph: DependencyGraph,
    /// Where it came from
    pub origin: GraphOrigin,
}

/// Loads and saves project graphs through a [`SnapshotBackend`].
pub struct DependencyGraphStore {
    backend: Box<dyn SnapshotBackend>,
}

impl std::fmt::Debug for DependencyGraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraphStore").finish_non_exhaustive()
    }
}

impl DependencyGraphStore {
    /// Use `backend` for snapshots.
    pub fn new(backend: impl SnapshotBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// Store snapshots as JSONL files under `state_dir`.
    pub fn jsonl(state_dir: impl Into<PathBuf>) -> Self {
        Self::new(JsonlSnapshotBackend::new(state_dir))
    }

    /// Store snapshots in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(InMemorySnapshotBackend::new())
    }

    /// Load the graph of `project` from its snapshot, or build it.
    ///
    /// # Errors
    ///
    /// Only fails when the snapshot is unusable and the fallback build
    /// fails too (see [`DependencyGraph::build`]).
    pub async fn load(&self, project: &dyn ProjectModel) -> Result<LoadedGraph> {
        match self.try_load(project.name()).await {
            Ok(graph) => {
                debug!(
                    project = %project.name(),
                    edges = graph.edge_count(),
                    "loaded dependency graph snapshot"
                );
                Ok(LoadedGraph {
                    graph,
                    origin: GraphOrigin::Snapshot,
                })
            }
            Err(reason) => {
                warn!(
                    project = %project.name(),
                    reason = %reason,
                    "snapshot unusable, rebuilding dependency graph"
                );
                let graph = DependencyGraph::build(project)?;
                Ok(LoadedGraph {
                    graph,
                    origin: GraphOrigin::Rebuilt {
                        reason: reason.to_string(),
                    },
                })
            }
        }
    }

    /// Load the graph of `project` from its snapshot only.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] explaining why the snapshot is unusable.
    pub async fn try_load(&self, project: &ProjectName) -> StoreResult<DependencyGraph> {
        let records = self.backend.read(project).await?;
        snapshot::decode(project, records)
    }

    /// Save a snapshot of `graph`, replacing the previous one.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the snapshot cannot be written. The
    /// previous snapshot, if any, is then left in place.
    pub async fn save(&self, graph: &DependencyGraph) -> StoreResult<()> {
        let records = snapshot::encode(graph)?;
        self.backend.write(graph.project(), records).await?;
        info!(
            project = %graph.project(),
            edges = graph.edge_count(),
            "saved dependency graph snapshot"
        );
        Ok(())
    }

    /// Delete the snapshot of `project`. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the snapshot exists but cannot be removed.
    pub async fn discard(&self, project: &ProjectName) -> StoreResult<bool> {
        self.backend.remove(project).await
    }
}

/// Create the store selected by `config`.
///
/// A relative state directory is resolved against `base_dir`.
pub fn create_store(config: &StoreConfig, base_dir: &Path) -> DependencyGraphStore {
    match config.backend {
        StoreBackend::Jsonl => DependencyGraphStore::jsonl(base_dir.join(&config.state_dir)),
        StoreBackend::Memory => DependencyGraphStore::in_memory(),
    }
}
