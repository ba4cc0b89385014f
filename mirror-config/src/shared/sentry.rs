use serde::{Deserialize, Serialize};

/// Sentry error tracking and monitoring configuration.
///
/// Contains the DSN required to initialize Sentry for error reporting in the
/// orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentryConfig {
    /// Sentry DSN (Data Source Name) for error reporting and monitoring.
    pub dsn: String,
}
