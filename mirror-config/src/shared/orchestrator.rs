use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::shared::{MysqlConnectionConfig, SentryConfig, SourceConfig, ValidationError};

/// Default readiness poll interval in milliseconds.
const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;

/// Default connection-establishment timeout in milliseconds.
///
/// Applies to every external call except the readiness gate, which retries
/// indefinitely. Operation timeouts are intentionally unbounded: a seed dump
/// may run arbitrarily long.
const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// Filesystem locations owned by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ArtifactsConfig {
    /// Directory where the seed dump artifact is written. Overwritten on each
    /// fresh bootstrap cycle.
    pub dump_dir: PathBuf,
    /// Directory holding the replica identity token. Written once, read
    /// thereafter.
    pub state_dir: PathBuf,
}

/// Complete configuration for the orchestrator service.
///
/// Aggregates the local replica connection, the remote source, filesystem
/// locations and optional service integrations. Typically loaded from
/// configuration files at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Configuration for the local replica instance.
    pub replica: MysqlConnectionConfig,
    /// Configuration for the remote source instance.
    pub source: SourceConfig,
    /// Filesystem locations for the seed artifact and identity token.
    pub artifacts: ArtifactsConfig,
    /// Name of the local schema to seed. Defaults to the source schema name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_schema: Option<String>,
    /// Interval between readiness probes against the local instance.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Connection-establishment timeout for source and replica connections.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Optional Sentry configuration for error tracking.
    ///
    /// If provided, enables Sentry error reporting. If `None`, the
    /// orchestrator operates without Sentry integration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentry: Option<SentryConfig>,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

impl OrchestratorConfig {
    /// Returns the name of the schema to create and seed locally.
    ///
    /// Falls back to the source schema name when no override is configured.
    pub fn local_schema(&self) -> &str {
        self.local_schema.as_deref().unwrap_or(&self.source.schema)
    }

    /// Validates the complete orchestrator configuration.
    ///
    /// Checks the replica TLS settings, the source configuration and the
    /// orchestration parameters.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.replica.tls.validate()?;
        self.source.validate()?;

        if self.poll_interval_ms == 0 {
            return Err(ValidationError::PollIntervalZero);
        }
        if self.artifacts.dump_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`artifacts.dump_dir` cannot be empty".to_string(),
            ));
        }
        if self.artifacts.state_dir.as_os_str().is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`artifacts.state_dir` cannot be empty".to_string(),
            ));
        }
        if let Some(local_schema) = &self.local_schema
            && local_schema.is_empty()
        {
            return Err(ValidationError::InvalidConfig(
                "`local_schema` cannot be empty when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{Credentials, TlsConfig};

    fn sample_config() -> OrchestratorConfig {
        OrchestratorConfig {
            replica: MysqlConnectionConfig {
                host: "127.0.0.1".to_string(),
                port: 3306,
                username: "root".to_string(),
                password: Some("local-admin".to_string().into()),
                tls: TlsConfig {
                    enabled: false,
                    trusted_root_certs: None,
                },
            },
            source: SourceConfig {
                host: "source.internal".to_string(),
                port: 3306,
                schema: "app".to_string(),
                tls: TlsConfig {
                    enabled: false,
                    trusted_root_certs: None,
                },
                admin: Credentials {
                    username: "admin".to_string(),
                    password: "admin-pass".to_string().into(),
                },
                replication: Credentials {
                    username: "repl".to_string(),
                    password: "repl-pass".to_string().into(),
                },
            },
            artifacts: ArtifactsConfig {
                dump_dir: "/var/lib/mirror/dumps".into(),
                state_dir: "/var/lib/mirror/state".into(),
            },
            local_schema: None,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            sentry: None,
        }
    }

    #[test]
    fn test_valid_config_passes_validation() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_local_schema_defaults_to_source_schema() {
        let mut config = sample_config();
        assert_eq!(config.local_schema(), "app");

        config.local_schema = Some("app_mirror".to_string());
        assert_eq!(config.local_schema(), "app_mirror");
    }

    #[test]
    fn test_zero_poll_interval_is_rejected() {
        let mut config = sample_config();
        config.poll_interval_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::PollIntervalZero)
        ));
    }

    #[test]
    fn test_tls_without_certs_is_rejected() {
        let mut config = sample_config();
        config.source.tls.enabled = true;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingTrustedRootCerts)
        ));
    }

    #[test]
    fn test_empty_source_schema_is_rejected() {
        let mut config = sample_config();
        config.source.schema = String::new();
        assert!(config.validate().is_err());
    }
}
