use secrecy::ExposeSecret;
use sqlx::mysql::MySqlConnection;
use sqlx::{Connection, Row};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use mirror_config::shared::SourceConfig;

use crate::clients::SourceClient;
use crate::clients::mysql::{MYSQL_PWD_ENV, describe_tool_failure};
use crate::coordinate::SourceLogCoordinate;
use crate::error::BootstrapError;

/// Binary used to take the consistent seed dump.
const MYSQLDUMP_BIN: &str = "mysqldump";

/// MySQL implementation of [`SourceClient`].
///
/// Status and retention queries run on short-lived connections opened per
/// call; the dump shells out to `mysqldump`, whose `--single-transaction`
/// flag provides the consistent snapshot the seeding protocol relies on.
pub struct MySqlSourceClient {
    config: SourceConfig,
    connect_timeout: Duration,
}

impl MySqlSourceClient {
    /// Creates a client for the given source. No connection is opened until
    /// the first call.
    pub fn new(config: SourceConfig, connect_timeout: Duration) -> Self {
        Self {
            config,
            connect_timeout,
        }
    }

    /// Opens a short-lived administrative connection to the source.
    async fn admin_connection(&self) -> Result<MySqlConnection, BootstrapError> {
        let options = self.config.admin_connect_options();

        tokio::time::timeout(self.connect_timeout, MySqlConnection::connect_with(&options))
            .await
            .map_err(|_| BootstrapError::ConnectTimeout {
                target: format!("{}:{}", self.config.host, self.config.port),
                timeout: self.connect_timeout,
            })?
            .map_err(BootstrapError::from)
    }
}

impl SourceClient for MySqlSourceClient {
    async fn current_log_coordinate(&self) -> Result<SourceLogCoordinate, BootstrapError> {
        let mut conn = self.admin_connection().await?;
        let row = sqlx::query("SHOW MASTER STATUS")
            .fetch_optional(&mut conn)
            .await?;
        let _ = conn.close().await;

        let Some(row) = row else {
            return Err(BootstrapError::SourceLoggingDisabled);
        };

        let file: String = row.try_get("File")?;
        let position: i64 = row.try_get("Position")?;

        Ok(SourceLogCoordinate::from_status(file, position)?)
    }

    async fn dump_schema(&self, schema: &str, artifact: &Path) -> Result<u64, BootstrapError> {
        let artifact_file = std::fs::File::create(artifact)?;

        let mut command = Command::new(MYSQLDUMP_BIN);
        command
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--user")
            .arg(&self.config.admin.username)
            // One snapshot transaction for the whole dump; rows stream as
            // seen at its start instant regardless of concurrent writes.
            .arg("--single-transaction")
            .arg("--quick")
            // The link runs in explicit coordinate mode, never auto-position.
            .arg("--set-gtid-purged=OFF")
            .env(MYSQL_PWD_ENV, self.config.admin.password.expose_secret())
            .stdin(Stdio::null())
            .stdout(Stdio::from(artifact_file))
            .stderr(Stdio::piped());

        if self.config.tls.enabled {
            command.arg("--ssl-mode=VERIFY_CA");
            if let Some(certs) = &self.config.tls.trusted_root_certs {
                command.arg("--ssl-ca").arg(certs);
            }
        }

        command.arg(schema);

        debug!(schema, artifact = %artifact.display(), "starting seed dump");
        let output = command.spawn()?.wait_with_output().await?;
        if !output.status.success() {
            return Err(BootstrapError::DumpFailed(describe_tool_failure(
                MYSQLDUMP_BIN,
                &output,
            )));
        }

        Ok(std::fs::metadata(artifact)?.len())
    }

    async fn retained_log_files(&self) -> Result<Vec<String>, BootstrapError> {
        let mut conn = self.admin_connection().await?;
        let rows = sqlx::query("SHOW BINARY LOGS").fetch_all(&mut conn).await?;
        let _ = conn.close().await;

        let mut files = Vec::with_capacity(rows.len());
        for row in rows {
            files.push(row.try_get("Log_name")?);
        }

        Ok(files)
    }
}
