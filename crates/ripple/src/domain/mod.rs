//! Domain types for dependency tracking.
//!
//! These are the values the graph indexes and the resolver returns: node
//! identifiers, typed dependency edges, and project names.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a project in the workspace.
///
/// Used as the key of resolver output and of persisted graph snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl ProjectName {
    /// Create a new project name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a node taking part in dependencies.
///
/// Model objects are identified by their kind and qualified name. External
/// datatypes (which are not model objects but can still be depended upon)
/// are identified by qualified name alone. Equality and ordering are
/// structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum NodeId {
    /// A model object, e.g. a policy component type.
    Object {
        /// Object kind, e.g. `PolicyCmptType` or `TableStructure`
        kind: String,
        /// Fully qualified object name
        name: String,
    },

    /// An external datatype referenced by qualified name.
    Datatype {
        /// Fully qualified datatype name
        name: String,
    },
}

impl NodeId {
    /// Identifier of a model object.
    pub fn object(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Object {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Identifier of an external datatype.
    pub fn datatype(name: impl Into<String>) -> Self {
        Self::Datatype { name: name.into() }
    }

    /// The qualified name, regardless of variant.
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        match self {
            Self::Object { name, .. } | Self::Datatype { name } => name,
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object { kind, name } => write!(f, "{kind}:{name}"),
            Self::Datatype { name } => write!(f, "datatype:{name}"),
        }
    }
}

/// Kind of dependency between two nodes.
///
/// The resolver's closure policy matches on this set exhaustively, so a
/// new variant cannot be added without deciding how it propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DependencyType {
    /// Source is an instance of (configures) the target type
    InstanceOf,

    /// Source is a subtype of the target
    Subtype,

    /// Source references the target
    Reference,

    /// Source uses the target as a datatype
    Datatype,

    /// Source is the detail side of a master-to-detail composition
    ReferenceCompositionMasterDetail,
}

impl DependencyType {
    /// Every dependency type, in declaration order.
    pub const ALL: [DependencyType; 5] = [
        DependencyType::InstanceOf,
        DependencyType::Subtype,
        DependencyType::Reference,
        DependencyType::Datatype,
        DependencyType::ReferenceCompositionMasterDetail,
    ];
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InstanceOf => "instance-of",
            Self::Subtype => "subtype",
            Self::Reference => "reference",
            Self::Datatype => "datatype",
            Self::ReferenceCompositionMasterDetail => "reference-composition-master-detail",
        };
        f.write_str(name)
    }
}

/// A directed, typed edge: `source` requires `target` to stay unchanged.
///
/// When `target` changes, the artefacts generated for `source` may be
/// stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Dependency {
    /// The dependent node
    pub source: NodeId,

    /// The node depended upon
    pub target: NodeId,

    /// Kind of dependency
    pub dep_type: DependencyType,
}

impl Dependency {
    /// Create a new dependency edge
    #[must_use]
    pub fn new(source: NodeId, target: NodeId, dep_type: DependencyType) -> Self {
        Self {
            source,
            target,
            dep_type,
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -[{}]-> {}", self.source, self.dep_type, self.target)
    }
}
