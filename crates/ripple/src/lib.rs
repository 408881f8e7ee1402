//! Ripple - incremental dependency tracking for model-driven code generation.
//!
//! After a model object changes, ripple answers which other objects, across
//! every project that can see the change, must have their generated
//! artefacts rebuilt.
//!
//! - [`graph`]: per-project dependency graph with incremental update
//! - [`resolver`]: cross-project impact resolution with per-type closure rules
//! - [`store`]: snapshot persistence with rebuild on corruption
//! - [`registry`]: orchestrator-owned cache of project graphs
//! - [`model`]: the interfaces ripple consumes from the model
//!
//! # Example
//!
//! ```
//! use ripple::domain::{DependencyType, NodeId};
//! use ripple::model::{InMemoryProject, InMemoryWorkspace};
//! use ripple::{DependencyGraphStore, DependencyResolver, GraphRegistry};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> ripple::Result<()> {
//! let workspace = Arc::new(InMemoryWorkspace::new());
//! let core = workspace.add_project(InMemoryProject::new("core"));
//! let policy = NodeId::object("PolicyCmptType", "motor.Policy");
//! let car_policy = NodeId::object("PolicyCmptType", "motor.CarPolicy");
//! core.add_dependency(car_policy.clone(), policy.clone(), DependencyType::Subtype);
//!
//! let registry = GraphRegistry::new(workspace, DependencyGraphStore::in_memory());
//! let resolution = DependencyResolver::new(&registry, "core")
//!     .resolve(&[policy], &[])
//!     .await;
//!
//! assert!(resolution.impacted.sources(&"core".into()).contains(&car_policy));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod domain;
pub mod error;
pub mod graph;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod store;

pub use config::RippleConfig;
pub use error::{Error, ModelError, Result, StoreError};
pub use graph::DependencyGraph;
pub use registry::GraphRegistry;
pub use resolver::{DependencyResolver, ImpactMap, Resolution};
pub use store::{DependencyGraphStore, create_store};
