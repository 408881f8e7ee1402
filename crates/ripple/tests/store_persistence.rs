//! Integration tests for graph snapshots on disk.
//!
//! # Test Coverage
//!
//! - Save then load reproduces the edge set
//! - Every kind of damaged snapshot falls back to a full build
//! - Checkpoints through the registry, including failed saves

use ripple::config::{StoreBackend, StoreConfig};
use ripple::domain::DependencyType::{Datatype, InstanceOf, Reference, Subtype};
use ripple::domain::{Dependency, NodeId};
use ripple::model::{InMemoryProject, InMemoryWorkspace};
use ripple::store::{GraphOrigin, JsonlSnapshotBackend};
use ripple::{DependencyGraph, DependencyGraphStore, GraphRegistry, StoreError, create_store};
use rstest::rstest;
use std::path::Path;
use std::sync::Arc;

mod common;
use common::{add_edges, edge, init_tracing, obj, project};

fn sample_edges() -> Vec<Dependency> {
    vec![
        edge("Y", "X", Subtype),
        edge("Z", "Y", Reference),
        edge("P", "Z", InstanceOf),
        Dependency::new(obj("Z"), NodeId::datatype("Money"), Datatype),
    ]
}

fn sample_project() -> InMemoryProject {
    let core = InMemoryProject::new("core");
    add_edges(&core, &sample_edges());
    core
}

async fn saved_snapshot(dir: &Path) -> (DependencyGraphStore, std::path::PathBuf) {
    let store = DependencyGraphStore::jsonl(dir);
    let graph = DependencyGraph::build(&sample_project()).unwrap();
    store.save(&graph).await.unwrap();
    let path = JsonlSnapshotBackend::new(dir).snapshot_path(&project("core"));
    (store, path)
}

#[tokio::test]
async fn save_then_load_reproduces_edges() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (store, path) = saved_snapshot(dir.path()).await;
    assert!(path.exists());

    let loaded = store.load(&sample_project()).await.unwrap();

    assert_eq!(loaded.origin, GraphOrigin::Snapshot);
    assert_eq!(loaded.graph, DependencyGraph::build(&sample_project()).unwrap());
}

#[tokio::test]
async fn snapshot_is_preferred_over_the_live_model() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (store, _path) = saved_snapshot(dir.path()).await;

    let changed = sample_project();
    changed.remove_object(&obj("Y"));
    let loaded = store.load(&changed).await.unwrap();

    assert_eq!(loaded.origin, GraphOrigin::Snapshot);
    assert_eq!(loaded.graph.edges().len(), sample_edges().len());
}

#[tokio::test]
async fn snapshot_file_is_sorted_jsonl_with_header() {
    let dir = tempfile::tempdir().unwrap();
    let (_store, path) = saved_snapshot(dir.path()).await;

    let contents = tokio::fs::read_to_string(&path).await.unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), 1 + sample_edges().len());
    assert!(lines[0].contains("\"record\":\"header\""));
    assert!(lines[0].contains("\"project\":\"core\""));
    assert!(lines[1..].iter().all(|l| l.contains("\"record\":\"edge\"")));
}

/// Ways of damaging a snapshot file.
#[derive(Debug, Clone, Copy)]
enum Damage {
    CutMidLine,
    DropLastLine,
    GarbageLine,
    Empty,
    Deleted,
    HeaderOnly,
    SwappedEdge,
}

async fn damage(path: &Path, how: Damage) {
    let contents = tokio::fs::read_to_string(path).await.unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    let damaged = match how {
        Damage::CutMidLine => contents[..contents.len() - 10].to_string(),
        Damage::DropLastLine => format!("{}\n", lines[..lines.len() - 1].join("\n")),
        Damage::GarbageLine => format!("{contents}this is not json\n"),
        Damage::Empty => String::new(),
        Damage::Deleted => {
            tokio::fs::remove_file(path).await.unwrap();
            return;
        }
        Damage::HeaderOnly => format!("{}\n", lines[0]),
        Damage::SwappedEdge => contents.replacen("\"subtype\"", "\"reference\"", 1),
    };
    tokio::fs::write(path, damaged).await.unwrap();
}

#[rstest]
#[case::cut_mid_line(Damage::CutMidLine)]
#[case::drop_last_line(Damage::DropLastLine)]
#[case::garbage_line(Damage::GarbageLine)]
#[case::empty(Damage::Empty)]
#[case::deleted(Damage::Deleted)]
#[case::header_only(Damage::HeaderOnly)]
#[case::swapped_edge(Damage::SwappedEdge)]
#[tokio::test]
async fn damaged_snapshot_falls_back_to_full_build(#[case] how: Damage) {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (store, path) = saved_snapshot(dir.path()).await;
    damage(&path, how).await;

    let loaded = store.load(&sample_project()).await.unwrap();

    assert!(
        matches!(loaded.origin, GraphOrigin::Rebuilt { .. }),
        "{how:?} was accepted"
    );
    assert_eq!(loaded.graph, DependencyGraph::build(&sample_project()).unwrap());
}

#[rstest]
#[case::drop_last_line(Damage::DropLastLine, "announced")]
#[case::swapped_edge(Damage::SwappedEdge, "checksum")]
#[case::empty(Damage::Empty, "header")]
#[tokio::test]
async fn damage_is_diagnosed(#[case] how: Damage, #[case] expected: &str) {
    let dir = tempfile::tempdir().unwrap();
    let (store, path) = saved_snapshot(dir.path()).await;
    damage(&path, how).await;

    let err = store.try_load(&project("core")).await.unwrap_err();
    assert!(err.to_string().contains(expected), "{err}");
}

#[tokio::test]
async fn snapshot_of_another_project_is_rejected() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let (store, path) = saved_snapshot(dir.path()).await;
    let other_path = JsonlSnapshotBackend::new(dir.path()).snapshot_path(&project("other"));
    tokio::fs::copy(&path, &other_path).await.unwrap();

    assert!(matches!(
        store.try_load(&project("other")).await,
        Err(StoreError::ProjectMismatch { .. })
    ));

    let other = InMemoryProject::new("other");
    let loaded = store.load(&other).await.unwrap();
    assert!(matches!(loaded.origin, GraphOrigin::Rebuilt { .. }));
    assert!(loaded.graph.is_empty());
}

#[tokio::test]
async fn unusable_snapshot_and_unscannable_project_is_an_error() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let store = DependencyGraphStore::jsonl(dir.path());
    let broken = sample_project();
    broken.set_scan_failure(Some("unreadable".to_string()));

    assert!(store.load(&broken).await.is_err());
}

#[tokio::test]
async fn checkpoint_persists_every_cached_graph() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let workspace = Arc::new(InMemoryWorkspace::new());
    let core = workspace.add_project(InMemoryProject::new("core"));
    let app = workspace.add_project(InMemoryProject::new("app"));
    add_edges(&core, &[edge("B", "A", Subtype)]);
    add_edges(&app, &[edge("U", "B", Reference)]);

    let config = StoreConfig {
        backend: StoreBackend::Jsonl,
        state_dir: "graphs".into(),
    };
    let registry = GraphRegistry::new(workspace.clone(), create_store(&config, dir.path()));
    registry.graph(&project("core")).await.unwrap();
    registry.graph(&project("app")).await.unwrap();

    let report = registry.checkpoint().await;
    assert!(report.is_clean());
    assert_eq!(report.saved, vec![project("app"), project("core")]);

    // A fresh session over the same directory loads from the snapshots.
    let restarted = GraphRegistry::new(workspace, create_store(&config, dir.path()));
    let loaded = restarted.store().load(&*core).await.unwrap();
    assert_eq!(loaded.origin, GraphOrigin::Snapshot);
    assert_eq!(loaded.graph.edges(), vec![edge("B", "A", Subtype)]);
}

#[tokio::test]
async fn failed_checkpoint_is_reported_not_raised() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the state directory should be.
    let blocked = dir.path().join("graphs");
    tokio::fs::write(&blocked, "not a directory").await.unwrap();

    let workspace = Arc::new(InMemoryWorkspace::new());
    let core = workspace.add_project(InMemoryProject::new("core"));
    add_edges(&core, &[edge("B", "A", Subtype)]);
    let registry = GraphRegistry::new(workspace, DependencyGraphStore::jsonl(&blocked));
    registry.graph(&project("core")).await.unwrap();

    let report = registry.checkpoint().await;

    assert!(!report.is_clean());
    assert!(report.saved.is_empty());
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, project("core"));
}
