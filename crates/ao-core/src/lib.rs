//! Client core for the AuroraConfig store: multi-cluster dispatch, snapshot
//! access, fuzzy identifier resolution and cascading deletes.

pub mod client;
pub mod config;
pub mod delete;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod resolve;
pub mod snapshot;

pub use client::SnapshotClient;
pub use config::{ApiContext, ClusterConfig, ClusterEndpoint, EndpointSet};
pub use delete::{Answer, Confirm, DeletePlanner, DeletionPlan, PlannerState, commit_plan};
pub use dispatch::{DispatchOutcome, DispatchRequest, Dispatcher, EndpointResponse, Method};
pub use envelope::{Envelope, ValidationReport};
pub use error::{AoError, AoResult, IdentKind};
pub use resolve::{LegalIdentifiers, ResolvedTargets, Resolver};
pub use snapshot::{ConfigPath, Snapshot};
