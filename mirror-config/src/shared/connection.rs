use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use std::path::PathBuf;

use crate::SerializableSecretString;
use crate::shared::ValidationError;

/// Configuration for connecting to a MySQL instance with a single credential.
///
/// Used for the local replica, where the orchestrator holds administrative
/// credentials for the whole bootstrap cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MysqlConnectionConfig {
    /// Hostname or IP address of the MySQL server.
    pub host: String,
    /// Port number on which the MySQL server is listening.
    pub port: u16,
    /// Username for authenticating with the MySQL server.
    pub username: String,
    /// Password for the specified user. Sensitive and redacted in debug output.
    pub password: Option<SerializableSecretString>,
    /// TLS configuration for secure connections.
    pub tls: TlsConfig,
}

/// TLS settings for secure MySQL connections.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// Whether TLS is required for the connection.
    pub enabled: bool,
    /// Path to a PEM bundle of trusted root certificates used to verify the
    /// server. Required when `enabled` is true.
    pub trusted_root_certs: Option<PathBuf>,
}

impl TlsConfig {
    /// Validates the [`TlsConfig`].
    ///
    /// Returns [`ValidationError::MissingTrustedRootCerts`] if TLS is enabled
    /// but no certificate bundle path is provided.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_none() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }

    /// Returns the sqlx SSL mode matching this configuration.
    pub fn ssl_mode(&self) -> MySqlSslMode {
        if self.enabled {
            MySqlSslMode::VerifyCa
        } else {
            MySqlSslMode::Preferred
        }
    }
}

impl MysqlConnectionConfig {
    /// Creates connection options for connecting to the server without
    /// selecting a database.
    ///
    /// Useful for administrative operations that are not scoped to a schema,
    /// like the readiness probe and replication control statements.
    pub fn connect_options(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .ssl_mode(self.tls.ssl_mode());

        if let Some(certs) = &self.tls.trusted_root_certs {
            options = options.ssl_ca(certs);
        }

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        options
    }

    /// Creates connection options scoped to a specific database.
    pub fn connect_options_with_database(&self, database: &str) -> MySqlConnectOptions {
        self.connect_options().database(database)
    }
}
