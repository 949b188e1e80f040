//! rpcmon error types
//!
//! Only setup paths (construction, histogram enabling, registration, config
//! loading) return errors. Per-RPC recording never fails.

/// rpcmon error types
#[derive(Debug, thiserror::Error)]
pub enum RpcmonError {
    // Metric construction / registry errors
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// The same bundle (or one with identical descriptors) is already
    /// registered with the target registry.
    #[error("metrics already registered")]
    AlreadyRegistered,

    #[error("invalid histogram buckets: {0}")]
    InvalidBuckets(String),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RpcmonError {
    /// Map a registry error, singling out duplicate registration.
    pub(crate) fn from_registration(err: prometheus::Error) -> Self {
        match err {
            prometheus::Error::AlreadyReg => RpcmonError::AlreadyRegistered,
            other => RpcmonError::Prometheus(other),
        }
    }
}

/// Result type alias for rpcmon operations
pub type Result<T> = std::result::Result<T, RpcmonError>;
