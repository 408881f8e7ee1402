//! Graph registry: the orchestrator-owned cache of project graphs.
//!
//! Each project's graph sits behind its own `RwLock`. Resolution takes read
//! guards and `update`/`reinit` take the write guard, so a resolution never
//! observes a half-applied update. Graphs are loaded through the store on
//! first access and written back only at [`GraphRegistry::checkpoint`].

use crate::domain::{NodeId, ProjectName};
use crate::error::{Error, Result, StoreError};
use crate::graph::DependencyGraph;
use crate::model::{ProjectModel, Workspace};
use crate::store::{DependencyGraphStore, GraphOrigin};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// A project graph shared between the registry and its readers.
pub type SharedGraph = Arc<RwLock<DependencyGraph>>;

/// Outcome of [`GraphRegistry::checkpoint`].
#[derive(Debug, Default)]
pub struct CheckpointReport {
    /// Projects whose snapshot was written
    pub saved: Vec<ProjectName>,
    /// Projects whose snapshot could not be written, with the reason
    pub failed: Vec<(ProjectName, StoreError)>,
}

impl CheckpointReport {
    /// Whether every cached graph was saved.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Owns the workspace handle, the snapshot store and the graph cache.
pub struct GraphRegistry {
    workspace: Arc<dyn Workspace>,
    store: DependencyGraphStore,
    graphs: Mutex<HashMap<ProjectName, SharedGraph>>,
}

impl std::fmt::Debug for GraphRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphRegistry")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl GraphRegistry {
    /// Create a registry with an empty cache.
    pub fn new(workspace: Arc<dyn Workspace>, store: DependencyGraphStore) -> Self {
        Self {
            workspace,
            store,
            graphs: Mutex::new(HashMap::new()),
        }
    }

    /// The workspace the registry serves.
    #[must_use]
    pub fn workspace(&self) -> &dyn Workspace {
        self.workspace.as_ref()
    }

    /// The snapshot store.
    #[must_use]
    pub fn store(&self) -> &DependencyGraphStore {
        &self.store
    }

    /// Look up a project in the workspace.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if the workspace has no such project.
    pub fn project(&self, name: &ProjectName) -> Result<Arc<dyn ProjectModel>> {
        self.workspace
            .project(name)
            .ok_or_else(|| Error::ProjectNotFound(name.clone()))
    }

    /// The graph of `name`, loading it on first access.
    ///
    /// The cache lock is not held while loading, so lookups of other
    /// projects proceed during a rebuild. If two callers load the same
    /// project at once, the first graph cached wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] for an unknown project, or the
    /// build error if no snapshot was usable and the project cannot be
    /// scanned.
    pub async fn graph(&self, name: &ProjectName) -> Result<SharedGraph> {
        if let Some(graph) = self.graphs.lock().await.get(name) {
            return Ok(Arc::clone(graph));
        }

        let project = self.project(name)?;
        let loaded = self.store.load(&*project).await?;
        if let GraphOrigin::Rebuilt { reason } = &loaded.origin {
            debug!(project = %name, %reason, "graph rebuilt on first access");
        }

        let mut graphs = self.graphs.lock().await;
        let graph = graphs
            .entry(name.clone())
            .or_insert_with(|| Arc::new(RwLock::new(loaded.graph)));
        Ok(Arc::clone(graph))
    }

    /// Re-derive the outgoing edges of `node` in project `name`.
    ///
    /// # Errors
    ///
    /// See [`GraphRegistry::graph`].
    pub async fn update(&self, name: &ProjectName, node: &NodeId) -> Result<()> {
        let project = self.project(name)?;
        let graph = self.graph(name).await?;
        graph.write().await.update(&*project, node)
    }

    /// Re-derive the outgoing edges of every node in `nodes`.
    ///
    /// All updates are applied under one write guard.
    ///
    /// # Errors
    ///
    /// See [`GraphRegistry::graph`].
    pub async fn update_all(&self, name: &ProjectName, nodes: &[NodeId]) -> Result<()> {
        let project = self.project(name)?;
        let graph = self.graph(name).await?;
        let mut graph = graph.write().await;
        for node in nodes {
            graph.update(&*project, node)?;
        }
        Ok(())
    }

    /// Rebuild the graph of `name` from a full scan.
    ///
    /// A cached graph keeps its previous state if the build fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] or the build error.
    pub async fn reinit(&self, name: &ProjectName) -> Result<()> {
        let project = self.project(name)?;
        let cached = self.graphs.lock().await.get(name).cloned();
        match cached {
            Some(graph) => graph.write().await.reinit(&*project),
            None => {
                let graph = DependencyGraph::build(&*project)?;
                self.graphs
                    .lock()
                    .await
                    .insert(name.clone(), Arc::new(RwLock::new(graph)));
                Ok(())
            }
        }
    }

    /// Drop the cached graph of `name`; the next access reloads it.
    ///
    /// Returns whether a graph was cached.
    pub async fn invalidate(&self, name: &ProjectName) -> bool {
        self.graphs.lock().await.remove(name).is_some()
    }

    /// Names of the projects with a cached graph, sorted.
    pub async fn cached_projects(&self) -> Vec<ProjectName> {
        let mut names: Vec<_> = self.graphs.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Save every cached graph.
    ///
    /// Failures are logged and reported, never returned as errors: the
    /// next session rebuilds whatever could not be saved.
    pub async fn checkpoint(&self) -> CheckpointReport {
        let mut cached: Vec<(ProjectName, SharedGraph)> = self
            .graphs
            .lock()
            .await
            .iter()
            .map(|(name, graph)| (name.clone(), Arc::clone(graph)))
            .collect();
        cached.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = CheckpointReport::default();
        for (name, graph) in cached {
            let graph = graph.read().await;
            match self.store.save(&graph).await {
                Ok(()) => report.saved.push(name),
                Err(e) => {
                    warn!(project = %name, error = %e, "failed to save dependency graph");
                    report.failed.push((name, e));
                }
            }
        }

        info!(
            saved = report.saved.len(),
            failed = report.failed.len(),
            "checkpoint complete"
        );
        report
    }
}
