use serde::{Deserialize, Serialize};
use sqlx::mysql::MySqlConnectOptions;

use crate::SerializableSecretString;
use crate::shared::{TlsConfig, ValidationError};
use secrecy::ExposeSecret;

/// A username/password pair for one of the source identities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Credentials {
    /// Username for authenticating with the source server.
    pub username: String,
    /// Password for the specified user. Sensitive and redacted in debug output.
    pub password: SerializableSecretString,
}

/// Configuration for the remote source MySQL instance.
///
/// The source carries two credential sets: an administrative/read identity
/// used by the orchestrator for the status query and the seed dump, and a
/// replication-only identity used exclusively by the replication link started
/// on the local instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Hostname or IP address of the source server.
    pub host: String,
    /// Port number on which the source server is listening.
    pub port: u16,
    /// Name of the schema being mirrored.
    pub schema: String,
    /// TLS configuration for orchestrator connections to the source.
    pub tls: TlsConfig,
    /// Administrative/read identity for status queries and the seed dump.
    pub admin: Credentials,
    /// Replication-only identity consumed by the replication link.
    pub replication: Credentials,
}

impl SourceConfig {
    /// Creates connection options for the administrative identity, scoped to
    /// the mirrored schema.
    pub fn admin_connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.admin.username)
            .password(self.admin.password.expose_secret())
            .database(&self.schema)
            .ssl_mode(self.tls.ssl_mode());

        if let Some(certs) = &self.tls.trusted_root_certs {
            options = options.ssl_ca(certs);
        }

        options
    }

    /// Validates the [`SourceConfig`].
    ///
    /// Checks that host, schema and both usernames are non-empty and that the
    /// TLS configuration is coherent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.host.is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`source.host` cannot be empty".to_string(),
            ));
        }
        if self.schema.is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`source.schema` cannot be empty".to_string(),
            ));
        }
        if self.admin.username.is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`source.admin.username` cannot be empty".to_string(),
            ));
        }
        if self.replication.username.is_empty() {
            return Err(ValidationError::InvalidConfig(
                "`source.replication.username` cannot be empty".to_string(),
            ));
        }

        self.tls.validate()
    }
}
