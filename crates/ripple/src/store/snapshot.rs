//! Snapshot records and their validation.
//!
//! A snapshot is a header record followed by one record per edge:
//!
//! ```text
//! {"record":"header","format":"ripple-graph","version":1,"project":"core",...}
//! {"record":"edge","source":{...},"target":{...},"dep_type":"subtype"}
//! ```
//!
//! The header carries the edge count and a SHA-256 over the edge records,
//! so a file cut short on a line boundary is rejected as readily as one
//! with a garbled line.

use crate::domain::{Dependency, ProjectName};
use crate::error::StoreError;
use crate::graph::DependencyGraph;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Format name written to every header.
pub const SNAPSHOT_FORMAT: &str = "ripple-graph";

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// First record of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Always [`SNAPSHOT_FORMAT`]
    pub format: String,
    /// Format version
    pub version: u32,
    /// Project the graph belongs to
    pub project: ProjectName,
    /// When the snapshot was written
    pub saved_at: DateTime<Utc>,
    /// Number of edge records that follow
    pub edge_count: usize,
    /// Lowercase hex SHA-256 of the edge records
    pub checksum: String,
}

/// One line of a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "snake_case")]
pub enum SnapshotRecord {
    /// Snapshot metadata
    Header(SnapshotHeader),
    /// A dependency edge
    Edge(Dependency),
}

/// SHA-256 over the JSON form of `edges`, one per line.
///
/// # Errors
///
/// Returns [`StoreError::Json`] if an edge fails to serialize.
pub fn checksum(edges: &[Dependency]) -> Result<String, StoreError> {
    let mut hasher = Sha256::new();
    for (i, edge) in edges.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(serde_json::to_vec(edge)?);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Turn `graph` into snapshot records, edges sorted.
///
/// # Errors
///
/// Returns [`StoreError::Json`] if an edge fails to serialize.
pub fn encode(graph: &DependencyGraph) -> Result<Vec<SnapshotRecord>, StoreError> {
    let edges = graph.edges();
    let header = SnapshotHeader {
        format: SNAPSHOT_FORMAT.to_string(),
        version: SNAPSHOT_VERSION,
        project: graph.project().clone(),
        saved_at: Utc::now(),
        edge_count: edges.len(),
        checksum: checksum(&edges)?,
    };

    let mut records = Vec::with_capacity(edges.len() + 1);
    records.push(SnapshotRecord::Header(header));
    records.extend(edges.into_iter().map(SnapshotRecord::Edge));
    Ok(records)
}

/// Validate `records` and rebuild the graph of `project` from them.
///
/// # Errors
///
/// Returns a [`StoreError`] describing the first problem found: a missing
/// or misplaced header, an unknown format, a foreign project, a wrong edge
/// count or a checksum mismatch.
pub fn decode(
    project: &ProjectName,
    records: Vec<SnapshotRecord>,
) -> Result<DependencyGraph, StoreError> {
    let mut records = records.into_iter();
    let Some(SnapshotRecord::Header(header)) = records.next() else {
        return Err(StoreError::MissingHeader);
    };

    if header.format != SNAPSHOT_FORMAT || header.version != SNAPSHOT_VERSION {
        return Err(StoreError::UnsupportedFormat {
            format: header.format,
            version: header.version,
        });
    }
    if &header.project != project {
        return Err(StoreError::ProjectMismatch {
            expected: project.clone(),
            found: header.project,
        });
    }

    let mut edges = Vec::with_capacity(header.edge_count);
    for record in records {
        match record {
            SnapshotRecord::Edge(dep) => edges.push(dep),
            SnapshotRecord::Header(_) => {
                return Err(StoreError::Malformed(
                    "header record after the first line".to_string(),
                ));
            }
        }
    }

    if edges.len() != header.edge_count {
        return Err(StoreError::Truncated {
            expected: header.edge_count,
            found: edges.len(),
        });
    }
    if checksum(&edges)? != header.checksum {
        return Err(StoreError::ChecksumMismatch);
    }

    Ok(DependencyGraph::from_edges(project.clone(), edges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DependencyType, NodeId};

    fn sample_graph() -> DependencyGraph {
        DependencyGraph::from_edges(
            "core",
            [
                Dependency::new(
                    NodeId::object("PolicyCmptType", "b"),
                    NodeId::object("PolicyCmptType", "a"),
                    DependencyType::Subtype,
                ),
                Dependency::new(
                    NodeId::object("ProductCmptType", "c"),
                    NodeId::datatype("Money"),
                    DependencyType::Datatype,
                ),
            ],
        )
    }

    fn header_mut(records: &mut [SnapshotRecord]) -> &mut SnapshotHeader {
        match &mut records[0] {
            SnapshotRecord::Header(header) => header,
            SnapshotRecord::Edge(_) => panic!("first record is not a header"),
        }
    }

    #[test]
    fn encode_then_decode_preserves_edges() {
        let graph = sample_graph();
        let records = encode(&graph).unwrap();
        assert_eq!(records.len(), 3);

        let decoded = decode(&ProjectName::from("core"), records).unwrap();
        assert_eq!(decoded, graph);
    }

    #[test]
    fn records_serialize_with_a_tag() {
        let records = encode(&sample_graph()).unwrap();
        let header = serde_json::to_string(&records[0]).unwrap();
        let edge = serde_json::to_string(&records[1]).unwrap();

        assert!(header.starts_with("{\"record\":\"header\""));
        assert!(edge.starts_with("{\"record\":\"edge\""));
        assert_eq!(
            serde_json::from_str::<SnapshotRecord>(&edge).unwrap(),
            records[1]
        );
    }

    #[test]
    fn checksum_depends_on_order_and_content() {
        let edges = sample_graph().edges();
        let mut reversed = edges.clone();
        reversed.reverse();

        assert_eq!(checksum(&edges).unwrap().len(), 64);
        assert_ne!(checksum(&edges).unwrap(), checksum(&reversed).unwrap());
        assert_ne!(checksum(&edges).unwrap(), checksum(&edges[..1]).unwrap());
    }

    #[test]
    fn missing_header_is_rejected() {
        let mut records = encode(&sample_graph()).unwrap();
        records.remove(0);
        assert!(matches!(
            decode(&ProjectName::from("core"), records),
            Err(StoreError::MissingHeader)
        ));
    }

    #[test]
    fn dropped_edge_is_detected() {
        let mut records = encode(&sample_graph()).unwrap();
        records.pop();
        assert!(matches!(
            decode(&ProjectName::from("core"), records),
            Err(StoreError::Truncated {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn tampered_edge_fails_checksum() {
        let mut records = encode(&sample_graph()).unwrap();
        if let SnapshotRecord::Edge(dep) = &mut records[1] {
            dep.dep_type = DependencyType::Reference;
        }
        assert!(matches!(
            decode(&ProjectName::from("core"), records),
            Err(StoreError::ChecksumMismatch)
        ));
    }

    #[test]
    fn foreign_project_and_version_are_rejected() {
        let records = encode(&sample_graph()).unwrap();
        assert!(matches!(
            decode(&ProjectName::from("app"), records.clone()),
            Err(StoreError::ProjectMismatch { .. })
        ));

        let mut future = records;
        header_mut(&mut future).version = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            decode(&ProjectName::from("core"), future),
            Err(StoreError::UnsupportedFormat { .. })
        ));
    }
}
