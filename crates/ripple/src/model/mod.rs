//! Collaborator interfaces consumed by the graph and the resolver.
//!
//! The graph never computes dependencies itself. It indexes what the model
//! reports through [`ProjectModel`], asks [`BuilderSet`] a single policy
//! question, and reaches other projects through [`Workspace`].
//!
//! The traits are synchronous: model queries are in-memory lookups on the
//! orchestrator side. Only snapshot persistence performs I/O.

use crate::domain::{Dependency, NodeId, ProjectName};
use crate::error::ModelError;
use std::sync::Arc;

pub mod memory;

pub use memory::{InMemoryProject, InMemoryWorkspace};

/// The active code generator's view of the model.
pub trait BuilderSet: Send + Sync {
    /// Whether generated code treats composition targets as aggregate roots.
    ///
    /// When `true`, a change to a detail object also invalidates whatever
    /// depends on its master through a master-to-detail composition.
    fn composition_targets_are_aggregate_roots(&self) -> bool;
}

/// One project of the model.
pub trait ProjectModel: Send + Sync {
    /// The project's name.
    fn name(&self) -> &ProjectName;

    /// Every object owned by the project.
    ///
    /// # Errors
    ///
    /// A failure here means the project cannot be scanned at all and aborts
    /// any graph build.
    fn object_ids(&self) -> Result<Vec<NodeId>, ModelError>;

    /// Direct outgoing dependencies of `node`.
    ///
    /// Returns `Ok(None)` when the object no longer exists.
    ///
    /// # Errors
    ///
    /// [`ModelError::Object`] when this object alone cannot be analysed,
    /// [`ModelError::Fatal`] when no graph built now would be safe.
    fn dependencies(&self, node: &NodeId) -> Result<Option<Vec<Dependency>>, ModelError>;

    /// Projects that declare a build dependency on this one.
    fn referencing_projects(&self) -> Vec<ProjectName>;

    /// Whether the project is in a state where resolution is meaningful.
    fn is_buildable(&self) -> bool;

    /// The code generator configured for this project.
    fn builder_set(&self) -> &dyn BuilderSet;
}

/// The set of projects visible to the orchestrator.
pub trait Workspace: Send + Sync {
    /// Look up a project by name.
    fn project(&self, name: &ProjectName) -> Option<Arc<dyn ProjectModel>>;

    /// Names of every project in the workspace.
    fn project_names(&self) -> Vec<ProjectName>;
}

/// Builder set with a fixed answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StaticBuilderSet {
    /// Answer to [`BuilderSet::composition_targets_are_aggregate_roots`]
    pub aggregate_roots: bool,
}

impl BuilderSet for StaticBuilderSet {
    fn composition_targets_are_aggregate_roots(&self) -> bool {
        self.aggregate_roots
    }
}
