//! In-memory model, workspace and builder set.
//!
//! A complete implementation of the collaborator traits backed by plain
//! maps. The object table is mutable through shared references so that a
//! project can be edited while a [`GraphRegistry`](crate::GraphRegistry)
//! holds it, which is how a real orchestrator's model behaves between build
//! cycles. Failures can be injected per object or for the whole project.

use super::{BuilderSet, ProjectModel, StaticBuilderSet, Workspace};
use crate::domain::{Dependency, DependencyType, NodeId, ProjectName};
use crate::error::ModelError;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Clone)]
enum ObjectEntry {
    Live(Vec<Dependency>),
    Failing { reason: String, fatal: bool },
}

#[derive(Debug)]
struct ProjectState {
    objects: BTreeMap<NodeId, ObjectEntry>,
    referencing: Vec<ProjectName>,
    buildable: bool,
    scan_failure: Option<String>,
}

/// A project whose objects live in a map.
#[derive(Debug)]
pub struct InMemoryProject {
    name: ProjectName,
    builder_set: StaticBuilderSet,
    state: RwLock<ProjectState>,
}

impl InMemoryProject {
    /// Create an empty, buildable project.
    pub fn new(name: impl Into<ProjectName>) -> Self {
        Self {
            name: name.into(),
            builder_set: StaticBuilderSet::default(),
            state: RwLock::new(ProjectState {
                objects: BTreeMap::new(),
                referencing: Vec::new(),
                buildable: true,
                scan_failure: None,
            }),
        }
    }

    /// Configure whether composition targets are aggregate roots.
    #[must_use]
    pub fn with_aggregate_roots(mut self, aggregate_roots: bool) -> Self {
        self.builder_set = StaticBuilderSet { aggregate_roots };
        self
    }

    /// Declare that `project` depends on this one.
    #[must_use]
    pub fn referenced_by(self, project: impl Into<ProjectName>) -> Self {
        self.write().referencing.push(project.into());
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, ProjectState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ProjectState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add an object without dependencies. Existing objects are left as is.
    pub fn add_object(&self, node: NodeId) {
        self.write()
            .objects
            .entry(node)
            .or_insert_with(|| ObjectEntry::Live(Vec::new()));
    }

    /// Record that `source` depends on `target`, creating `source` if needed.
    ///
    /// A failing object becomes live again with just this dependency.
    pub fn add_dependency(&self, source: NodeId, target: NodeId, dep_type: DependencyType) {
        let dep = Dependency::new(source.clone(), target, dep_type);
        let mut state = self.write();
        let entry = state
            .objects
            .entry(source)
            .or_insert_with(|| ObjectEntry::Live(Vec::new()));
        match entry {
            ObjectEntry::Live(deps) => {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
            ObjectEntry::Failing { .. } => *entry = ObjectEntry::Live(vec![dep]),
        }
    }

    /// Replace everything `node` reports, verbatim.
    pub fn set_dependencies(&self, node: NodeId, deps: Vec<Dependency>) {
        self.write().objects.insert(node, ObjectEntry::Live(deps));
    }

    /// Delete an object. Returns whether it existed.
    pub fn remove_object(&self, node: &NodeId) -> bool {
        self.write().objects.remove(node).is_some()
    }

    /// Make `node` report a recoverable failure.
    pub fn fail_object(&self, node: NodeId, reason: impl Into<String>) {
        self.write().objects.insert(
            node,
            ObjectEntry::Failing {
                reason: reason.into(),
                fatal: false,
            },
        );
    }

    /// Make `node` report a failure that aborts graph builds.
    pub fn fail_object_fatally(&self, node: NodeId, reason: impl Into<String>) {
        self.write().objects.insert(
            node,
            ObjectEntry::Failing {
                reason: reason.into(),
                fatal: true,
            },
        );
    }

    /// Make object enumeration fail (`None` restores it).
    pub fn set_scan_failure(&self, reason: Option<String>) {
        self.write().scan_failure = reason;
    }

    /// Mark the project buildable or not.
    pub fn set_buildable(&self, buildable: bool) {
        self.write().buildable = buildable;
    }

    /// Number of objects in the project.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.read().objects.len()
    }
}

impl ProjectModel for InMemoryProject {
    fn name(&self) -> &ProjectName {
        &self.name
    }

    fn object_ids(&self) -> Result<Vec<NodeId>, ModelError> {
        let state = self.read();
        if let Some(reason) = &state.scan_failure {
            return Err(ModelError::Project {
                project: self.name.clone(),
                reason: reason.clone(),
            });
        }
        Ok(state.objects.keys().cloned().collect())
    }

    fn dependencies(&self, node: &NodeId) -> Result<Option<Vec<Dependency>>, ModelError> {
        match self.read().objects.get(node) {
            None => Ok(None),
            Some(ObjectEntry::Live(deps)) => Ok(Some(deps.clone())),
            Some(ObjectEntry::Failing { reason, fatal }) => {
                let node = node.clone();
                let reason = reason.clone();
                Err(if *fatal {
                    ModelError::Fatal { node, reason }
                } else {
                    ModelError::Object { node, reason }
                })
            }
        }
    }

    fn referencing_projects(&self) -> Vec<ProjectName> {
        self.read().referencing.clone()
    }

    fn is_buildable(&self) -> bool {
        self.read().buildable
    }

    fn builder_set(&self) -> &dyn BuilderSet {
        &self.builder_set
    }
}

/// A workspace holding [`InMemoryProject`]s.
#[derive(Debug, Default)]
pub struct InMemoryWorkspace {
    projects: RwLock<BTreeMap<ProjectName, Arc<InMemoryProject>>>,
}

impl InMemoryWorkspace {
    /// Create an empty workspace.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a project, returning the shared handle.
    pub fn add_project(&self, project: InMemoryProject) -> Arc<InMemoryProject> {
        let project = Arc::new(project);
        self.projects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(project.name.clone(), Arc::clone(&project));
        project
    }

    /// Remove a project from the workspace.
    pub fn remove_project(&self, name: &ProjectName) -> Option<Arc<InMemoryProject>> {
        self.projects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
    }
}

impl Workspace for InMemoryWorkspace {
    fn project(&self, name: &ProjectName) -> Option<Arc<dyn ProjectModel>> {
        self.projects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(|p| Arc::clone(p) as Arc<dyn ProjectModel>)
    }

    fn project_names(&self) -> Vec<ProjectName> {
        self.projects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str) -> NodeId {
        NodeId::object("PolicyCmptType", name)
    }

    #[test]
    fn missing_object_reports_none() {
        let project = InMemoryProject::new("core");
        assert!(project.dependencies(&node("a")).unwrap().is_none());
    }

    #[test]
    fn add_dependency_creates_source_and_deduplicates() {
        let project = InMemoryProject::new("core");
        project.add_dependency(node("a"), node("b"), DependencyType::Subtype);
        project.add_dependency(node("a"), node("b"), DependencyType::Subtype);

        let deps = project.dependencies(&node("a")).unwrap().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(project.object_ids().unwrap(), vec![node("a")]);
    }

    #[test]
    fn injected_failures_surface_as_model_errors() {
        let project = InMemoryProject::new("core");
        project.fail_object(node("a"), "unreadable");
        project.fail_object_fatally(node("b"), "corrupt");

        assert!(!project.dependencies(&node("a")).unwrap_err().is_fatal());
        assert!(project.dependencies(&node("b")).unwrap_err().is_fatal());

        project.set_scan_failure(Some("no config".to_string()));
        assert!(matches!(
            project.object_ids(),
            Err(ModelError::Project { .. })
        ));
    }

    #[test]
    fn workspace_hands_out_shared_projects() {
        let workspace = InMemoryWorkspace::new();
        let core = workspace.add_project(InMemoryProject::new("core").referenced_by("app"));

        let found = workspace.project(&ProjectName::from("core")).unwrap();
        core.add_object(node("a"));

        assert_eq!(found.object_ids().unwrap(), vec![node("a")]);
        assert_eq!(found.referencing_projects(), vec![ProjectName::from("app")]);
        assert!(workspace.project(&ProjectName::from("app")).is_none());
    }
}
