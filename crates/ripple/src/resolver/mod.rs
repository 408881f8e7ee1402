//! Change impact resolution across projects.
//!
//! Given the objects that changed, were added or were removed, the resolver
//! finds every dependency whose source must be regenerated, grouped by the
//! project that owns it.
//!
//! # Algorithm
//!
//! For each root node:
//!
//! 1. Expand the root in its own project's graph, walking dependants and
//!    deciding per edge type whether to keep going (see [`policy`]).
//! 2. Fan out to every project referencing the current one, seeding it
//!    with the root and every node reached so far, and expand there.
//! 3. Each project remembers which nodes it has expanded and under which
//!    restriction. A project reached again, through another reference path
//!    or a cycle, is expanded only for nodes it has not seen or now sees
//!    less restricted. These sets only grow, so circular project references
//!    terminate. Within a project each node is expanded at most once per
//!    restriction level, so object-level cycles terminate too.
//!
//! Projects whose graph cannot be obtained are skipped with a warning and
//! listed in [`Resolution::unresolved`]; callers should treat every object
//! in them as affected.

use crate::domain::{NodeId, ProjectName};
use crate::graph::DependencyGraph;
use crate::model::ProjectModel;
use crate::registry::GraphRegistry;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod impact;
pub mod policy;

pub use impact::ImpactMap;

/// Nodes to expand, each with its `instance_of_only` restriction.
type Frontier = BTreeMap<NodeId, bool>;

/// Result of a resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Impacted dependencies per project
    pub impacted: ImpactMap,
    /// Projects that could not be resolved and must be treated as dirty
    pub unresolved: BTreeSet<ProjectName>,
    /// Whether resolution stopped early on request
    pub cancelled: bool,
}

impl Resolution {
    /// Whether every root was resolved in every reachable project.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.unresolved.is_empty()
    }
}

/// Resolves changes to objects of one project.
#[derive(Debug)]
pub struct DependencyResolver<'a> {
    registry: &'a GraphRegistry,
    project: ProjectName,
}

impl<'a> DependencyResolver<'a> {
    /// Create a resolver for changes made in `project`.
    pub fn new(registry: &'a GraphRegistry, project: impl Into<ProjectName>) -> Self {
        Self {
            registry,
            project: project.into(),
        }
    }

    /// The project whose changes this resolver handles.
    #[must_use]
    pub fn project(&self) -> &ProjectName {
        &self.project
    }

    /// Find everything impacted by `changed` and `removed` nodes.
    ///
    /// Removed nodes are resolved exactly like changed ones; resolve before
    /// calling [`GraphRegistry::update`] for them, while their dependants
    /// are still recorded.
    pub async fn resolve(&self, changed: &[NodeId], removed: &[NodeId]) -> Resolution {
        self.resolve_until(changed, removed, || false).await
    }

    /// Like [`resolve`](Self::resolve), checking `is_cancelled` before
    /// each root.
    ///
    /// A cancelled resolution keeps everything found for the roots already
    /// processed and sets [`Resolution::cancelled`].
    pub async fn resolve_until<F>(
        &self,
        changed: &[NodeId],
        removed: &[NodeId],
        is_cancelled: F,
    ) -> Resolution
    where
        F: Fn() -> bool,
    {
        let mut resolution = Resolution::default();
        for root in changed.iter().chain(removed) {
            if is_cancelled() {
                info!(project = %self.project, "resolution cancelled");
                resolution.cancelled = true;
                break;
            }
            self.resolve_root(root, &mut resolution).await;
        }

        debug!(
            project = %self.project,
            roots = changed.len() + removed.len(),
            impacted = resolution.impacted.len(),
            unresolved = resolution.unresolved.len(),
            "resolution finished"
        );
        resolution
    }

    async fn resolve_root(&self, root: &NodeId, resolution: &mut Resolution) {
        let start = Frontier::from([(root.clone(), false)]);
        let mut expanded = BTreeMap::from([(self.project.clone(), start.clone())]);
        let mut projects: HashMap<ProjectName, Option<Arc<dyn ProjectModel>>> = HashMap::new();
        let mut queue = VecDeque::from([(self.project.clone(), start)]);

        while let Some((name, seeds)) = queue.pop_front() {
            let project = projects
                .entry(name.clone())
                .or_insert_with(|| self.registry.workspace().project(&name))
                .clone();
            let Some(project) = project else {
                warn!(project = %name, "project not in workspace, skipping resolution");
                resolution.unresolved.insert(name);
                continue;
            };

            let reached = if project.is_buildable() {
                match self.registry.graph(&name).await {
                    Ok(graph) => {
                        let graph = graph.read().await;
                        let aggregate_roots = project
                            .builder_set()
                            .composition_targets_are_aggregate_roots();
                        expand(&graph, &seeds, aggregate_roots, &mut resolution.impacted)
                    }
                    Err(e) => {
                        warn!(project = %name, error = %e, "no dependency graph, skipping resolution");
                        resolution.unresolved.insert(name.clone());
                        seeds
                    }
                }
            } else {
                warn!(project = %name, "project not buildable, skipping resolution");
                resolution.unresolved.insert(name.clone());
                seeds
            };
            absorb(expanded.entry(name.clone()).or_default(), &reached);

            for referencing in project.referencing_projects() {
                let fresh = absorb(expanded.entry(referencing.clone()).or_default(), &reached);
                if !fresh.is_empty() {
                    debug!(from = %name, to = %referencing, seeds = fresh.len(), "fanning out");
                    queue.push_back((referencing, fresh));
                }
            }
        }
    }
}

/// Merge `offered` into `known`, returning the entries that were new or
/// less restricted than before.
fn absorb(known: &mut Frontier, offered: &Frontier) -> Frontier {
    let mut fresh = Frontier::new();
    for (node, &instance_of_only) in offered {
        let is_new = known.get(node).is_none_or(|&seen| seen && !instance_of_only);
        if is_new {
            known.insert(node.clone(), instance_of_only);
            fresh.insert(node.clone(), instance_of_only);
        }
    }
    fresh
}

/// Walk dependants from `seeds` in one graph, recording impacted edges.
///
/// Returns every node expanded, seeds included, with the loosest
/// restriction it was expanded under.
fn expand(
    graph: &DependencyGraph,
    seeds: &Frontier,
    aggregate_roots: bool,
    impacted: &mut ImpactMap,
) -> Frontier {
    let mut visited = Frontier::new();
    let mut stack: Vec<(NodeId, bool)> = seeds
        .iter()
        .map(|(node, flag)| (node.clone(), *flag))
        .collect();

    while let Some((node, instance_of_only)) = stack.pop() {
        // Already expanded unrestricted, or restricted and still restricted.
        if let Some(&seen) = visited.get(&node) {
            if !seen || instance_of_only {
                continue;
            }
        }
        visited.insert(node.clone(), instance_of_only);

        for dep in graph.dependants(&node) {
            if policy::records(dep.dep_type, instance_of_only) {
                impacted.insert(graph.project().clone(), dep.clone());
            }
            if let Some(child) = policy::propagation(dep.dep_type, instance_of_only, aggregate_roots)
            {
                stack.push((dep.source, child));
            }
        }
    }
    visited
}
