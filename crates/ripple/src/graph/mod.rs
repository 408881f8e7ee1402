//! Per-project dependency graph.
//!
//! One petgraph graph holds both indices: a node's outgoing edges are what
//! it depends on, its incoming edges are its dependants. Because there is a
//! single edge set, every edge is visible from both ends or from neither.
//!
//! # Edge Direction
//!
//! Edges point from **dependent -> dependency**. For a dependency
//! `Child -[subtype]-> Parent`, `Parent`'s incoming edges yield `Child`.
//!
//! The graph is only mutated through [`DependencyGraph::build`],
//! [`DependencyGraph::update`] and [`DependencyGraph::reinit`]. Nodes that
//! lose their last edge are removed, so the node set is exactly the set of
//! edge endpoints.

use crate::domain::{Dependency, DependencyType, NodeId, ProjectName};
use crate::error::{Error, Result};
use crate::model::ProjectModel;
use petgraph::Direction;
use petgraph::algo;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Counts describing a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    /// Distinct nodes taking part in at least one edge
    pub nodes: usize,
    /// Total edges
    pub edges: usize,
    /// Edges per dependency type
    pub by_type: BTreeMap<DependencyType, usize>,
}

/// Dependency graph of one project.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    project: ProjectName,
    graph: StableDiGraph<NodeId, DependencyType>,
    node_map: HashMap<NodeId, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph owned by `project`.
    pub fn new(project: impl Into<ProjectName>) -> Self {
        Self {
            project: project.into(),
            graph: StableDiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Build a graph from a full scan of `project`.
    ///
    /// Objects whose dependencies cannot be computed are treated as having
    /// none, with a warning. Objects that vanished between enumeration and
    /// query are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Model`] if the project cannot enumerate its objects
    /// or an object reports a fatal failure. No partial graph is returned.
    pub fn build(project: &dyn ProjectModel) -> Result<Self> {
        let name = project.name().clone();
        let objects = project.object_ids()?;
        let mut graph = Self::new(name.clone());
        let mut degraded = 0_usize;

        for node in &objects {
            match project.dependencies(node) {
                Ok(Some(deps)) => graph.insert_reported(node, deps),
                Ok(None) => debug!(project = %name, %node, "object vanished during scan"),
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(project = %name, error = %e, "treating object as dependency-free");
                    degraded += 1;
                }
            }
        }

        let cycles = graph.cycles();
        if !cycles.is_empty() {
            warn!(
                project = %name,
                cycles = cycles.len(),
                "object dependency graph contains cycles"
            );
        }

        info!(
            project = %name,
            objects = objects.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            degraded,
            "built dependency graph"
        );
        Ok(graph)
    }

    /// Reconstruct a graph from a list of edges.
    pub fn from_edges<I>(project: impl Into<ProjectName>, edges: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        let mut graph = Self::new(project);
        for dep in edges {
            graph.insert_edge(dep);
        }
        graph
    }

    /// Re-derive the outgoing edges of `node` from the model.
    ///
    /// Every edge sourced at `node` is removed, then the object's current
    /// dependencies are inserted. A deleted object, or one whose
    /// dependencies cannot be computed, ends up with no outgoing edges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectMismatch`] if `project` does not own this
    /// graph. Model failures never fail an update.
    pub fn update(&mut self, project: &dyn ProjectModel, node: &NodeId) -> Result<()> {
        self.check_project(project)?;

        let former_targets = self.remove_outgoing(node);
        match project.dependencies(node) {
            Ok(Some(deps)) => self.insert_reported(node, deps),
            Ok(None) => debug!(project = %self.project, %node, "object removed"),
            Err(e) => warn!(
                project = %self.project,
                error = %e,
                fatal = e.is_fatal(),
                "dropping outgoing edges of failing object"
            ),
        }

        self.prune(node);
        for target in &former_targets {
            self.prune(target);
        }
        Ok(())
    }

    /// Replace the whole graph with a fresh build of `project`.
    ///
    /// The current state is kept if the build fails.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectMismatch`] for a foreign project, or the
    /// error from [`DependencyGraph::build`].
    pub fn reinit(&mut self, project: &dyn ProjectModel) -> Result<()> {
        self.check_project(project)?;
        *self = Self::build(project)?;
        Ok(())
    }

    /// Edges whose target is `node`: who depends on it.
    #[must_use]
    pub fn dependants(&self, node: &NodeId) -> Vec<Dependency> {
        self.collect_edges(node, Direction::Incoming)
    }

    /// Edges whose source is `node`: what it depends on.
    #[must_use]
    pub fn depends_on(&self, node: &NodeId) -> Vec<Dependency> {
        self.collect_edges(node, Direction::Outgoing)
    }

    /// Every edge of the graph, sorted.
    #[must_use]
    pub fn edges(&self) -> Vec<Dependency> {
        let mut edges: Vec<Dependency> = self
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (source, target) = self.graph.edge_endpoints(e)?;
                Some(Dependency::new(
                    self.graph[source].clone(),
                    self.graph[target].clone(),
                    self.graph[e],
                ))
            })
            .collect();
        edges.sort();
        edges
    }

    /// Whether `node` takes part in any edge.
    #[must_use]
    pub fn contains_node(&self, node: &NodeId) -> bool {
        self.node_map.contains_key(node)
    }

    /// The owning project.
    #[must_use]
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no edges.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Node, edge and per-type counts.
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut by_type = BTreeMap::new();
        for e in self.graph.edge_indices() {
            *by_type.entry(self.graph[e]).or_insert(0) += 1;
        }
        GraphStats {
            nodes: self.node_count(),
            edges: self.edge_count(),
            by_type,
        }
    }

    /// Object-level dependency cycles.
    ///
    /// Each cycle is a strongly connected component with more than one
    /// node, or a single node depending on itself. Members are sorted.
    #[must_use]
    pub fn cycles(&self) -> Vec<Vec<NodeId>> {
        let mut cycles: Vec<Vec<NodeId>> = algo::tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| {
                scc.len() > 1 || scc.iter().any(|&n| self.graph.find_edge(n, n).is_some())
            })
            .map(|scc| {
                let mut members: Vec<NodeId> =
                    scc.into_iter().map(|n| self.graph[n].clone()).collect();
                members.sort();
                members
            })
            .collect();
        cycles.sort();
        cycles
    }

    fn check_project(&self, project: &dyn ProjectModel) -> Result<()> {
        if project.name() == &self.project {
            Ok(())
        } else {
            Err(Error::ProjectMismatch {
                expected: self.project.clone(),
                found: project.name().clone(),
            })
        }
    }

    fn collect_edges(&self, node: &NodeId, direction: Direction) -> Vec<Dependency> {
        let Some(&idx) = self.node_map.get(node) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, direction)
            .map(|edge| {
                Dependency::new(
                    self.graph[edge.source()].clone(),
                    self.graph[edge.target()].clone(),
                    *edge.weight(),
                )
            })
            .collect()
    }

    /// Insert what the model reported for `node`, dropping foreign edges.
    fn insert_reported(&mut self, node: &NodeId, deps: Vec<Dependency>) {
        for dep in deps {
            if dep.source == *node {
                self.insert_edge(dep);
            } else {
                warn!(
                    project = %self.project,
                    queried = %node,
                    edge = %dep,
                    "ignoring dependency reported for another source"
                );
            }
        }
    }

    fn insert_edge(&mut self, dep: Dependency) {
        let source = self.ensure_node(dep.source);
        let target = self.ensure_node(dep.target);
        let exists = self
            .graph
            .edges(source)
            .any(|e| e.target() == target && *e.weight() == dep.dep_type);
        if !exists {
            self.graph.add_edge(source, target, dep.dep_type);
        }
    }

    fn ensure_node(&mut self, node: NodeId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(&node) {
            return idx;
        }
        let idx = self.graph.add_node(node.clone());
        self.node_map.insert(node, idx);
        idx
    }

    /// Remove every edge sourced at `node`, returning the former targets.
    fn remove_outgoing(&mut self, node: &NodeId) -> BTreeSet<NodeId> {
        let Some(&idx) = self.node_map.get(node) else {
            return BTreeSet::new();
        };
        let outgoing: Vec<_> = self
            .graph
            .edges(idx)
            .map(|e| (e.id(), e.target()))
            .collect();

        let mut targets = BTreeSet::new();
        for (edge, target) in outgoing {
            self.graph.remove_edge(edge);
            targets.insert(self.graph[target].clone());
        }
        targets
    }

    /// Drop `node` if no edge touches it any more.
    fn prune(&mut self, node: &NodeId) {
        let Some(&idx) = self.node_map.get(node) else {
            return;
        };
        if self.graph.neighbors_undirected(idx).next().is_none() {
            self.graph.remove_node(idx);
            self.node_map.remove(node);
        }
    }
}

impl PartialEq for DependencyGraph {
    /// Graphs are equal when they belong to the same project and hold the
    /// same edge set.
    fn eq(&self, other: &Self) -> bool {
        self.project == other.project && self.edges() == other.edges()
    }
}

impl Eq for DependencyGraph {}
