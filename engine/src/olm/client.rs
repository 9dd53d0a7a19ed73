//! The cluster boundary the deployment check drives.
//!
//! Five narrow CRUD capabilities, each scoped by name and namespace. The
//! transport behind them (kubeconfig, in-cluster, a test fake) is the
//! implementer's concern; the orchestrator only requires that `get` on a
//! missing object yields [`CertoError::NotFound`] and that a creation
//! conflict yields [`CertoError::AlreadyExists`].
//!
//! [`CertoError::NotFound`]: certo_core::error::CertoError::NotFound
//! [`CertoError::AlreadyExists`]: certo_core::error::CertoError::AlreadyExists

use async_trait::async_trait;
use certo_core::error::Result;

use super::resources::{
    CatalogSource, ClusterServiceVersion, Namespace, OperatorGroup, Subscription,
};

/// CRUD access to the resources the deployment check owns.
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Create a namespace.
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()>;

    /// Fetch a namespace by name.
    async fn get_namespace(&self, name: &str) -> Result<Namespace>;

    /// Delete a namespace by name.
    async fn delete_namespace(&self, name: &str) -> Result<()>;

    /// Create a catalog source.
    async fn create_catalog_source(&self, catalog: &CatalogSource) -> Result<()>;

    /// Fetch a catalog source.
    async fn get_catalog_source(&self, name: &str, namespace: &str) -> Result<CatalogSource>;

    /// Delete a catalog source.
    async fn delete_catalog_source(&self, name: &str, namespace: &str) -> Result<()>;

    /// Create an operator group.
    async fn create_operator_group(&self, group: &OperatorGroup) -> Result<()>;

    /// Fetch an operator group.
    async fn get_operator_group(&self, name: &str, namespace: &str) -> Result<OperatorGroup>;

    /// Delete an operator group.
    async fn delete_operator_group(&self, name: &str, namespace: &str) -> Result<()>;

    /// Create a subscription.
    async fn create_subscription(&self, subscription: &Subscription) -> Result<()>;

    /// Fetch a subscription.
    async fn get_subscription(&self, name: &str, namespace: &str) -> Result<Subscription>;

    /// Delete a subscription.
    async fn delete_subscription(&self, name: &str, namespace: &str) -> Result<()>;

    /// Fetch a cluster service version.
    async fn get_csv(&self, name: &str, namespace: &str) -> Result<ClusterServiceVersion>;
}
