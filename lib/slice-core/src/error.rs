use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid slice subnet {subnet}: {reason}")]
    InvalidSubnet { subnet: String, reason: String },

    #[error("Invalid IPAM cluster octet: {0}")]
    InvalidIpamOctet(i64),

    #[error("Slice {0} has no namespace")]
    MissingNamespace(String),

    #[error("Slice {slice} in namespace {slice_namespace} cannot own objects in namespace {namespace}")]
    CrossNamespaceOwner {
        slice: String,
        slice_namespace: String,
        namespace: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] envy::Error),

    #[error("Kubernetes error: {0}")]
    KubernetesError(#[from] kube::error::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
