//! Common test utilities shared across integration tests.

#![allow(dead_code)]

use ripple::domain::{Dependency, DependencyType, NodeId, ProjectName};
use ripple::model::{InMemoryProject, InMemoryWorkspace};
use ripple::{DependencyGraphStore, GraphRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Route ripple's logs to the test harness.
///
/// Controlled via `RUST_LOG`, e.g. `RUST_LOG=ripple=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ripple=info,ripple_jsonl=info")),
        )
        .with_test_writer()
        .try_init();
}

/// A policy component type node.
pub fn obj(name: &str) -> NodeId {
    NodeId::object("PolicyCmptType", name)
}

/// `dependent` depends on `dependency` with `dep_type`.
pub fn edge(dependent: &str, dependency: &str, dep_type: DependencyType) -> Dependency {
    Dependency::new(obj(dependent), obj(dependency), dep_type)
}

/// Shorthand for a project name.
pub fn project(name: &str) -> ProjectName {
    ProjectName::from(name)
}

/// Add every edge to `project`'s model.
pub fn add_edges(project: &InMemoryProject, edges: &[Dependency]) {
    for dep in edges {
        project.add_dependency(dep.source.clone(), dep.target.clone(), dep.dep_type);
    }
}

/// A workspace with a single project `core` holding `edges`.
pub fn single_project(edges: &[Dependency]) -> (GraphRegistry, Arc<InMemoryProject>) {
    let workspace = Arc::new(InMemoryWorkspace::new());
    let core = workspace.add_project(InMemoryProject::new("core"));
    add_edges(&core, edges);
    let registry = GraphRegistry::new(workspace, DependencyGraphStore::in_memory());
    (registry, core)
}
