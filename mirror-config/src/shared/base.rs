use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// TLS is enabled but no trusted root certificates are provided.
    #[error("Invalid TLS config: `trusted_root_certs` must be set when `enabled` is true")]
    MissingTrustedRootCerts,

    /// The readiness poll interval cannot be zero.
    #[error("`poll_interval_ms` cannot be zero")]
    PollIntervalZero,

    /// General configuration validation error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
