use thiserror::Error;

/// Certo error types
#[derive(Error, Debug)]
pub enum CertoError {
    /// Image pull failed; aborts the run before any check executes
    #[error("Image pull failed: {uri} - {message}")]
    PullFailed { uri: String, message: String },

    /// Scratch directory could not be created; aborts the run
    #[error("Scratch directory creation failed: {0}")]
    TempDirCreateFailed(String),

    /// Export or extraction of the image filesystem failed; aborts the run
    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    /// A readiness wait exhausted its timeout budget
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Cluster object lookup found nothing
    #[error("{kind} '{name}' not found")]
    NotFound { kind: String, name: String },

    /// Cluster object creation conflicted with an existing object
    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: String, name: String },

    /// Any other cluster API failure
    #[error("Cluster error: {kind} - {message}")]
    ClusterError { kind: String, message: String },

    /// Bundle annotation metadata missing or unreadable
    #[error("Annotation error: {0}")]
    AnnotationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Artifact write failure
    #[error("Artifact error: {0}")]
    ArtifactError(String),

    /// Image reference or metadata error
    #[error("Image error: {0}")]
    ImageError(String),

    /// Container registry error
    #[error("Registry error: {registry} - {message}")]
    RegistryError { registry: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CertoError {
    fn from(err: serde_json::Error) -> Self {
        CertoError::SerializationError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CertoError {
    fn from(err: serde_yaml::Error) -> Self {
        CertoError::SerializationError(err.to_string())
    }
}

/// Result type alias for Certo operations
pub type Result<T> = std::result::Result<T, CertoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_failed_display() {
        let error = CertoError::PullFailed {
            uri: "quay.io/example/app:v1".to_string(),
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Image pull failed: quay.io/example/app:v1 - connection refused"
        );
    }

    #[test]
    fn test_temp_dir_create_failed_display() {
        let error = CertoError::TempDirCreateFailed("permission denied".to_string());
        assert_eq!(
            error.to_string(),
            "Scratch directory creation failed: permission denied"
        );
    }

    #[test]
    fn test_extraction_failed_display() {
        let error = CertoError::ExtractionFailed("malformed tar stream".to_string());
        assert_eq!(error.to_string(), "Extraction failed: malformed tar stream");
    }

    #[test]
    fn test_timeout_display() {
        let error = CertoError::Timeout("condition not met within 90s".to_string());
        assert_eq!(error.to_string(), "Timeout: condition not met within 90s");
    }

    #[test]
    fn test_not_found_display() {
        let error = CertoError::NotFound {
            kind: "Subscription".to_string(),
            name: "my-operator-sub".to_string(),
        };
        assert_eq!(error.to_string(), "Subscription 'my-operator-sub' not found");
    }

    #[test]
    fn test_already_exists_display() {
        let error = CertoError::AlreadyExists {
            kind: "Namespace".to_string(),
            name: "operator-test".to_string(),
        };
        assert_eq!(error.to_string(), "Namespace 'operator-test' already exists");
    }

    #[test]
    fn test_not_found_and_already_exists_are_distinguishable() {
        let not_found = CertoError::NotFound {
            kind: "CatalogSource".to_string(),
            name: "cs".to_string(),
        };
        let conflict = CertoError::AlreadyExists {
            kind: "CatalogSource".to_string(),
            name: "cs".to_string(),
        };
        assert!(matches!(not_found, CertoError::NotFound { .. }));
        assert!(matches!(conflict, CertoError::AlreadyExists { .. }));
    }

    #[test]
    fn test_registry_error_display() {
        let error = CertoError::RegistryError {
            registry: "quay.io".to_string(),
            message: "authentication failed".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Registry error: quay.io - authentication failed"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: CertoError = io_error.into();
        assert!(matches!(error, CertoError::IoError(_)));
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let result: std::result::Result<serde_json::Value, _> =
            serde_json::from_str("{ invalid json }");
        let error: CertoError = result.unwrap_err().into();
        assert!(matches!(error, CertoError::SerializationError(_)));
    }

    #[test]
    fn test_serde_yaml_error_conversion() {
        let result: std::result::Result<serde_yaml::Value, _> =
            serde_yaml::from_str("invalid: yaml: content:");
        let error: CertoError = result.unwrap_err().into();
        assert!(matches!(error, CertoError::SerializationError(_)));
    }

    #[test]
    fn test_other_error_display() {
        let error = CertoError::Other("unknown failure".to_string());
        assert_eq!(error.to_string(), "unknown failure");
    }
}
