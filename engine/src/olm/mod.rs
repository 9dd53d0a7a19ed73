//! Operator deployment via the OLM package manager.
//!
//! The deployment check provisions a namespace, catalog source, operator
//! group, and subscription, waits for the subscription to resolve and the
//! resolved CSV to converge, and guarantees artifact capture and teardown
//! on every outcome. The cluster itself sits behind the
//! [`ClusterClient`](client::ClusterClient) boundary.

pub mod client;
pub mod data;
pub mod orchestrator;
pub mod resources;

pub use client::ClusterClient;
pub use data::{derive_operator_data, OperatorData};
pub use orchestrator::OlmDeploymentCheck;
pub use resources::{
    CatalogSource, CatalogSourceSpec, ClusterServiceVersion, CsvPhase, CsvStatus, Namespace,
    ObjectMeta, OperatorGroup, OperatorGroupSpec, Subscription, SubscriptionSpec,
    SubscriptionStatus,
};
