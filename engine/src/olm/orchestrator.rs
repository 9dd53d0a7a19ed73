//! The operator deployment check.
//!
//! Provisions a namespace, catalog source, operator group, and subscription
//! on a live cluster, waits for the subscription to resolve and the
//! resolved CSV to converge, then captures artifacts and tears everything
//! down. Capture and teardown run no matter how the waits ended.

use std::sync::Arc;

use async_trait::async_trait;
use certo_core::artifact::ArtifactWriter;
use certo_core::check::{Check, CheckHelp, CheckMetadata, ImageReference};
use certo_core::config::OlmSettings;
use certo_core::error::{CertoError, Result};
use serde::Serialize;

use super::client::ClusterClient;
use super::data::{derive_operator_data, OperatorData};
use super::resources::{
    CatalogSource, CatalogSourceSpec, CsvPhase, Namespace, ObjectMeta, OperatorGroup,
    OperatorGroupSpec, Subscription, SubscriptionSpec,
};
use crate::poll::{wait_for, DEFAULT_POLL_INTERVAL};

/// Verifies that an operator bundle deploys through OLM and converges.
///
/// One invocation exclusively owns its install namespace and the four child
/// resources; concurrent invocations against the same namespace are not
/// supported.
pub struct OlmDeploymentCheck {
    cluster: Arc<dyn ClusterClient>,
    artifacts: Arc<dyn ArtifactWriter>,
    settings: OlmSettings,
}

/// Names of the child resources derived from the operator's app name.
struct ResourceNames {
    catalog: String,
    group: String,
    subscription: String,
}

impl ResourceNames {
    fn for_app(app: &str) -> Self {
        Self {
            catalog: format!("{}-catalog", app),
            group: format!("{}-group", app),
            subscription: format!("{}-sub", app),
        }
    }
}

impl OlmDeploymentCheck {
    /// Create the check with its cluster client, artifact sink, and
    /// settings.
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        artifacts: Arc<dyn ArtifactWriter>,
        settings: OlmSettings,
    ) -> Self {
        Self {
            cluster,
            artifacts,
            settings,
        }
    }

    async fn deploy_and_wait(&self, data: &OperatorData) -> Result<bool> {
        self.provision(data).await?;
        self.await_convergence(data).await
    }

    /// Create the namespace, catalog source, operator group, and
    /// subscription, in that order. "Already exists" is swallowed per
    /// resource; any other creation error is terminal.
    async fn provision(&self, data: &OperatorData) -> Result<()> {
        let names = ResourceNames::for_app(&data.app);
        let ns = &data.install_namespace;

        swallow_conflict(self.cluster.create_namespace(&Namespace::named(ns)).await)?;

        let catalog = CatalogSource {
            metadata: ObjectMeta::namespaced(&names.catalog, ns),
            spec: CatalogSourceSpec {
                source_type: "grpc".to_string(),
                image: data.catalog_image.clone(),
                display_name: format!("{} certification catalog", data.app),
            },
        };
        swallow_conflict(self.cluster.create_catalog_source(&catalog).await)?;

        let group = OperatorGroup {
            metadata: ObjectMeta::namespaced(&names.group, ns),
            spec: OperatorGroupSpec {
                target_namespaces: vec![ns.clone()],
            },
        };
        swallow_conflict(self.cluster.create_operator_group(&group).await)?;

        let subscription = Subscription {
            metadata: ObjectMeta::namespaced(&names.subscription, ns),
            spec: SubscriptionSpec {
                channel: data.channel.clone(),
                package: data.package_name.clone(),
                source: names.catalog.clone(),
                source_namespace: ns.clone(),
            },
            status: Default::default(),
        };
        swallow_conflict(self.cluster.create_subscription(&subscription).await)?;

        tracing::info!(
            namespace = %ns,
            catalog = %names.catalog,
            subscription = %names.subscription,
            "Provisioned operator deployment resources"
        );
        Ok(())
    }

    /// Wait for subscription resolution, then for the resolved CSV to reach
    /// a terminal phase. Each wait has its own timeout budget.
    async fn await_convergence(&self, data: &OperatorData) -> Result<bool> {
        let names = ResourceNames::for_app(&data.app);

        let cluster = Arc::clone(&self.cluster);
        let namespace = data.install_namespace.clone();
        let sub_name = names.subscription.clone();
        let installed_csv = wait_for(
            move || {
                let cluster = Arc::clone(&cluster);
                let namespace = namespace.clone();
                let sub_name = sub_name.clone();
                async move {
                    match cluster.get_subscription(&sub_name, &namespace).await {
                        Ok(sub) => Ok(sub.status.installed_csv.filter(|csv| !csv.is_empty())),
                        // The subscription may not be visible yet; keep polling.
                        Err(CertoError::NotFound { .. }) => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            },
            self.settings.subscription_timeout(),
            DEFAULT_POLL_INTERVAL,
        )
        .await?;

        tracing::info!(csv = %installed_csv, "Subscription resolved");

        let cluster = Arc::clone(&self.cluster);
        let namespace = data.install_namespace.clone();
        let csv_name = installed_csv.clone();
        let succeeded = wait_for(
            move || {
                let cluster = Arc::clone(&cluster);
                let namespace = namespace.clone();
                let csv_name = csv_name.clone();
                async move {
                    match cluster.get_csv(&csv_name, &namespace).await {
                        Ok(csv) => match csv.status.phase {
                            CsvPhase::Succeeded => Ok(Some(true)),
                            CsvPhase::Failed => Ok(Some(false)),
                            _ => Ok(None),
                        },
                        Err(CertoError::NotFound { .. }) => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            },
            self.settings.csv_timeout(),
            DEFAULT_POLL_INTERVAL,
        )
        .await?;

        tracing::info!(csv = %installed_csv, succeeded, "Deployment reached a terminal phase");
        Ok(succeeded)
    }

    /// Serialize the current deployment resources to artifacts.
    /// Best-effort: individual capture failures are logged, never
    /// propagated.
    async fn capture(&self, data: &OperatorData) {
        let names = ResourceNames::for_app(&data.app);
        let ns = &data.install_namespace;

        match self.cluster.get_subscription(&names.subscription, ns).await {
            Ok(sub) => self.write_artifact("subscription.json", &sub),
            Err(e) => tracing::warn!(error = %e, "Could not capture subscription"),
        }
        match self.cluster.get_catalog_source(&names.catalog, ns).await {
            Ok(catalog) => self.write_artifact("catalogsource.json", &catalog),
            Err(e) => tracing::warn!(error = %e, "Could not capture catalog source"),
        }
        match self.cluster.get_operator_group(&names.group, ns).await {
            Ok(group) => self.write_artifact("operatorgroup.json", &group),
            Err(e) => tracing::warn!(error = %e, "Could not capture operator group"),
        }
        match self.cluster.get_namespace(ns).await {
            Ok(namespace) => self.write_artifact("namespace.json", &namespace),
            Err(e) => tracing::warn!(error = %e, "Could not capture namespace"),
        }
    }

    fn write_artifact<T: Serialize>(&self, filename: &str, object: &T) {
        let bytes = match serde_json::to_vec_pretty(object) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(artifact = filename, error = %e, "Could not serialize artifact");
                return;
            }
        };
        if let Err(e) = self.artifacts.write(filename, &bytes) {
            tracing::warn!(artifact = filename, error = %e, "Could not write artifact");
        }
    }

    /// Delete the subscription, catalog source, operator group, and
    /// namespace, in that order, ignoring deletion errors.
    async fn teardown(&self, data: &OperatorData) {
        let names = ResourceNames::for_app(&data.app);
        let ns = &data.install_namespace;

        if let Err(e) = self.cluster.delete_subscription(&names.subscription, ns).await {
            tracing::warn!(error = %e, "Subscription teardown failed (ignored)");
        }
        if let Err(e) = self.cluster.delete_catalog_source(&names.catalog, ns).await {
            tracing::warn!(error = %e, "Catalog source teardown failed (ignored)");
        }
        if let Err(e) = self.cluster.delete_operator_group(&names.group, ns).await {
            tracing::warn!(error = %e, "Operator group teardown failed (ignored)");
        }
        if let Err(e) = self.cluster.delete_namespace(ns).await {
            tracing::warn!(error = %e, "Namespace teardown failed (ignored)");
        }
    }
}

/// Treat "already exists" as success: a re-run against leftover resources
/// adopts them. Logged so a pre-existing resource from an unrelated run
/// stays visible in the trace.
fn swallow_conflict(result: Result<()>) -> Result<()> {
    match result {
        Err(CertoError::AlreadyExists { kind, name }) => {
            tracing::warn!(kind = %kind, name = %name, "Resource already exists, adopting");
            Ok(())
        }
        other => other,
    }
}

#[async_trait]
impl Check for OlmDeploymentCheck {
    async fn validate(&self, image: &ImageReference) -> Result<bool> {
        let data = derive_operator_data(image, &self.settings)?;
        tracing::info!(
            package = %data.package_name,
            channel = %data.channel,
            namespace = %data.install_namespace,
            "Deploying operator bundle"
        );

        let outcome = self.deploy_and_wait(&data).await;

        // The verdict is fixed; capture and teardown cannot change it.
        self.capture(&data).await;
        self.teardown(&data).await;

        outcome
    }

    fn name(&self) -> &str {
        "deployable-by-olm"
    }

    fn metadata(&self) -> CheckMetadata {
        CheckMetadata {
            description: "Operator bundle deploys through OLM and reaches a healthy state"
                .to_string(),
            level: "required".to_string(),
            urls: vec!["https://olm.operatorframework.io/".to_string()],
        }
    }

    fn help(&self) -> CheckHelp {
        CheckHelp {
            message: "The operator did not deploy successfully through OLM".to_string(),
            suggestion: "Inspect the captured subscription and CSV artifacts for the \
                         failing phase, and verify the package name and channel in the \
                         bundle annotations match the catalog contents"
                .to_string(),
        }
    }
}
