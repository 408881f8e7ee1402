//! Resolver output: impacted dependencies grouped by project.

use crate::domain::{Dependency, NodeId, ProjectName};
use std::collections::{BTreeMap, BTreeSet};

/// Deduplicated impacted dependencies per project.
///
/// The `source` of every recorded dependency is an object whose generated
/// artefacts may be stale. Insertion is idempotent, so discovering the same
/// edge along several paths is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImpactMap {
    entries: BTreeMap<ProjectName, BTreeSet<Dependency>>,
}

impl ImpactMap {
    /// Create an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dep` for `project`. Returns `true` if it was not yet present.
    pub fn insert(&mut self, project: ProjectName, dep: Dependency) -> bool {
        self.entries.entry(project).or_default().insert(dep)
    }

    /// Union `other` into this map.
    pub fn merge(&mut self, other: ImpactMap) {
        for (project, deps) in other.entries {
            self.entries.entry(project).or_default().extend(deps);
        }
    }

    /// Impacted dependencies recorded for `project`.
    #[must_use]
    pub fn get(&self, project: &ProjectName) -> Option<&BTreeSet<Dependency>> {
        self.entries.get(project)
    }

    /// Whether `dep` is recorded for `project`.
    #[must_use]
    pub fn contains(&self, project: &ProjectName, dep: &Dependency) -> bool {
        self.entries
            .get(project)
            .is_some_and(|deps| deps.contains(dep))
    }

    /// Distinct objects of `project` that need regenerating.
    #[must_use]
    pub fn sources(&self, project: &ProjectName) -> BTreeSet<NodeId> {
        self.entries
            .get(project)
            .map(|deps| deps.iter().map(|d| d.source.clone()).collect())
            .unwrap_or_default()
    }

    /// Projects with at least one impacted dependency.
    pub fn projects(&self) -> impl Iterator<Item = &ProjectName> {
        self.entries.keys()
    }

    /// Iterate over every `(project, dependency)` pair.
    pub fn iter(&self) -> impl Iterator<Item = (&ProjectName, &Dependency)> {
        self.entries
            .iter()
            .flat_map(|(project, deps)| deps.iter().map(move |d| (project, d)))
    }

    /// Total number of impacted dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(BTreeSet::len).sum()
    }

    /// Whether nothing is impacted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(BTreeSet::is_empty)
    }
}
