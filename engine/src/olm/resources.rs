//! Minimal typed renderings of the five cluster resources the deployment
//! check touches.
//!
//! Only the fields the orchestrator reads or the artifacts serialize are
//! modeled; everything else the API server returns is ignored on
//! deserialization.

use serde::{Deserialize, Serialize};

/// Name and namespace of a cluster object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name
    pub name: String,

    /// Object namespace; absent for cluster-scoped objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

impl ObjectMeta {
    /// Metadata for a cluster-scoped object.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }

    /// Metadata for a namespaced object.
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }
}

/// A namespace owning the deployment check's child resources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    pub metadata: ObjectMeta,
}

impl Namespace {
    /// Namespace with the given name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::named(name),
        }
    }
}

/// A catalog source serving the operator package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSource {
    pub metadata: ObjectMeta,
    pub spec: CatalogSourceSpec,
}

/// Catalog source spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSourceSpec {
    /// Catalog protocol; the deployment check always uses "grpc"
    pub source_type: String,

    /// Catalog image reference
    pub image: String,

    /// Human-readable catalog name
    pub display_name: String,
}

/// An operator group targeting the install namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorGroup {
    pub metadata: ObjectMeta,
    pub spec: OperatorGroupSpec,
}

/// Operator group spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorGroupSpec {
    /// Namespaces the operator is granted access to
    pub target_namespaces: Vec<String>,
}

/// A subscription resolving the operator package from a catalog source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub metadata: ObjectMeta,
    pub spec: SubscriptionSpec,
    #[serde(default)]
    pub status: SubscriptionStatus,
}

/// Subscription spec.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    /// Channel to subscribe to
    pub channel: String,

    /// Package name within the catalog
    #[serde(rename = "name")]
    pub package: String,

    /// Catalog source name
    pub source: String,

    /// Namespace of the catalog source
    pub source_namespace: String,
}

/// Subscription status reported by the package manager.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    /// Name of the CSV the subscription resolved to; empty until resolution
    #[serde(default, rename = "installedCSV", skip_serializing_if = "Option::is_none")]
    pub installed_csv: Option<String>,
}

/// A cluster service version, the installed operator's versioned manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterServiceVersion {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: CsvStatus,
}

/// CSV status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvStatus {
    /// Installation phase
    #[serde(default)]
    pub phase: CsvPhase,
}

/// Installation phase of a CSV.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CsvPhase {
    Pending,
    InstallReady,
    Installing,
    Succeeded,
    Failed,
    Replacing,
    Deleting,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for CsvPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let phase = match self {
            Self::Pending => "Pending",
            Self::InstallReady => "InstallReady",
            Self::Installing => "Installing",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::Replacing => "Replacing",
            Self::Deleting => "Deleting",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_serializes_olm_field_names() {
        let sub = Subscription {
            metadata: ObjectMeta::namespaced("op-sub", "op-cert"),
            spec: SubscriptionSpec {
                channel: "stable".to_string(),
                package: "my-operator".to_string(),
                source: "op-catalog".to_string(),
                source_namespace: "op-cert".to_string(),
            },
            status: SubscriptionStatus::default(),
        };

        let json = serde_json::to_string(&sub).unwrap();
        assert!(json.contains("\"name\":\"my-operator\""));
        assert!(json.contains("\"sourceNamespace\":\"op-cert\""));
        assert!(!json.contains("installedCSV"));
    }

    #[test]
    fn test_subscription_status_deserializes_installed_csv() {
        let json = r#"{
            "metadata": {"name": "op-sub", "namespace": "op-cert"},
            "spec": {"channel": "stable", "name": "my-operator",
                     "source": "op-catalog", "sourceNamespace": "op-cert"},
            "status": {"installedCSV": "my-operator.v1.0.0"}
        }"#;
        let sub: Subscription = serde_json::from_str(json).unwrap();
        assert_eq!(sub.status.installed_csv.as_deref(), Some("my-operator.v1.0.0"));
    }

    #[test]
    fn test_csv_phase_deserializes_known_and_unknown() {
        let csv: ClusterServiceVersion = serde_json::from_str(
            r#"{"metadata": {"name": "op.v1"}, "status": {"phase": "Succeeded"}}"#,
        )
        .unwrap();
        assert_eq!(csv.status.phase, CsvPhase::Succeeded);

        let csv: ClusterServiceVersion = serde_json::from_str(
            r#"{"metadata": {"name": "op.v1"}, "status": {"phase": "SomethingNew"}}"#,
        )
        .unwrap();
        assert_eq!(csv.status.phase, CsvPhase::Unknown);
    }

    #[test]
    fn test_csv_status_defaults_when_absent() {
        let csv: ClusterServiceVersion =
            serde_json::from_str(r#"{"metadata": {"name": "op.v1"}}"#).unwrap();
        assert_eq!(csv.status.phase, CsvPhase::Unknown);
    }

    #[test]
    fn test_csv_phase_display() {
        assert_eq!(CsvPhase::Succeeded.to_string(), "Succeeded");
        assert_eq!(CsvPhase::Failed.to_string(), "Failed");
    }

    #[test]
    fn test_object_meta_constructors() {
        let cluster_scoped = ObjectMeta::named("ns");
        assert_eq!(cluster_scoped.namespace, None);

        let namespaced = ObjectMeta::namespaced("obj", "ns");
        assert_eq!(namespaced.namespace.as_deref(), Some("ns"));
    }
}
