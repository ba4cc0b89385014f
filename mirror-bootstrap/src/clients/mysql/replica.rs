use secrecy::ExposeSecret;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{Executor, Row};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use mirror_config::shared::MysqlConnectionConfig;

use crate::clients::mysql::{MYSQL_PWD_ENV, describe_tool_failure, quote_ident, quote_literal};
use crate::clients::{ReplicaClient, ReplicaHealth, ReplicationLinkConfig};
use crate::error::BootstrapError;

/// Binary used to restore the seed dump.
const MYSQL_BIN: &str = "mysql";

/// MySQL implementation of [`ReplicaClient`].
///
/// Uses a lazily-connected single-connection pool: construction never touches
/// the network, so the readiness gate observes connection failures one ping
/// at a time instead of failing at startup.
pub struct MySqlReplicaClient {
    pool: MySqlPool,
    config: MysqlConnectionConfig,
}

impl MySqlReplicaClient {
    /// Creates a client for the local instance.
    pub fn new(config: MysqlConnectionConfig, connect_timeout: Duration) -> Self {
        let pool = MySqlPoolOptions::new()
            .min_connections(0)
            .max_connections(1)
            .acquire_timeout(connect_timeout)
            .connect_lazy_with(config.connect_options());

        Self { pool, config }
    }
}

/// Renders the `CHANGE REPLICATION SOURCE TO` statement for a link.
///
/// The statement cannot be prepared, so every string value goes through
/// [`quote_literal`].
pub(crate) fn render_change_source_statement(link: &ReplicationLinkConfig) -> String {
    let clauses = [
        format!("SOURCE_HOST = {}", quote_literal(&link.host)),
        format!("SOURCE_PORT = {}", link.port),
        format!("SOURCE_USER = {}", quote_literal(&link.username)),
        format!(
            "SOURCE_PASSWORD = {}",
            quote_literal(link.password.expose_secret())
        ),
        format!(
            "SOURCE_LOG_FILE = {}",
            quote_literal(&link.log_coordinate.file)
        ),
        format!("SOURCE_LOG_POS = {}", link.log_coordinate.position),
        format!(
            "SOURCE_AUTO_POSITION = {}",
            if link.auto_position { 1 } else { 0 }
        ),
        format!(
            "SOURCE_SSL = {}",
            if link.use_encrypted_transport { 1 } else { 0 }
        ),
    ];

    format!("CHANGE REPLICATION SOURCE TO {}", clauses.join(", "))
}

impl ReplicaClient for MySqlReplicaClient {
    async fn ping(&self) -> Result<(), BootstrapError> {
        self.pool.execute("SELECT 1").await?;

        Ok(())
    }

    async fn configured_link_count(&self) -> Result<u64, BootstrapError> {
        // One row per configured replication channel; zero rows on an
        // instance that has never been configured (or was fully reset).
        let rows = sqlx::query("SHOW REPLICA STATUS")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.len() as u64)
    }

    async fn ensure_schema(&self, schema: &str) -> Result<(), BootstrapError> {
        let statement = format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(schema));
        self.pool.execute(statement.as_str()).await?;

        Ok(())
    }

    async fn load_seed_artifact(
        &self,
        schema: &str,
        artifact: &Path,
    ) -> Result<(), BootstrapError> {
        let artifact_file = std::fs::File::open(artifact)?;

        let mut command = Command::new(MYSQL_BIN);
        command
            .arg("--host")
            .arg(&self.config.host)
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--user")
            .arg(&self.config.username)
            .arg(schema)
            .stdin(Stdio::from(artifact_file))
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if let Some(password) = &self.config.password {
            command.env(MYSQL_PWD_ENV, password.expose_secret());
        }

        debug!(schema, artifact = %artifact.display(), "loading seed artifact");
        let output = command.spawn()?.wait_with_output().await?;
        if !output.status.success() {
            return Err(BootstrapError::LoadFailed(describe_tool_failure(
                MYSQL_BIN, &output,
            )));
        }

        Ok(())
    }

    async fn reset_replication(&self) -> Result<(), BootstrapError> {
        // Stopping fails when replication was never running; that is fine,
        // the reset below is what actually clears stale configuration.
        if let Err(error) = self.pool.execute("STOP REPLICA").await {
            debug!(%error, "stop replica before reset failed");
        }
        self.pool.execute("RESET REPLICA ALL").await?;

        Ok(())
    }

    async fn configure_link(&self, link: &ReplicationLinkConfig) -> Result<(), BootstrapError> {
        let statement = render_change_source_statement(link);
        self.pool.execute(statement.as_str()).await?;

        Ok(())
    }

    async fn start_replication(&self) -> Result<(), BootstrapError> {
        self.pool.execute("START REPLICA").await?;

        Ok(())
    }

    async fn ensure_read_only(&self) -> Result<(), BootstrapError> {
        self.pool.execute("SET GLOBAL read_only = ON").await?;
        self.pool.execute("SET GLOBAL super_read_only = ON").await?;

        Ok(())
    }

    async fn health(&self) -> Result<Option<ReplicaHealth>, BootstrapError> {
        let row = sqlx::query("SHOW REPLICA STATUS")
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let io_state: String = row.try_get("Replica_IO_Running")?;
        let sql_state: String = row.try_get("Replica_SQL_Running")?;
        let last_io_error: Option<String> = row.try_get("Last_IO_Error")?;
        let last_sql_error: Option<String> = row.try_get("Last_SQL_Error")?;
        let seconds_behind_source: Option<i64> = row.try_get("Seconds_Behind_Source")?;

        Ok(Some(ReplicaHealth {
            io_thread_running: io_state.eq_ignore_ascii_case("yes"),
            sql_thread_running: sql_state.eq_ignore_ascii_case("yes"),
            last_io_error: last_io_error.filter(|error| !error.is_empty()),
            last_sql_error: last_sql_error.filter(|error| !error.is_empty()),
            seconds_behind_source: seconds_behind_source.and_then(|lag| u64::try_from(lag).ok()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinate::SourceLogCoordinate;

    #[test]
    fn test_change_source_statement_rendering() {
        let link = ReplicationLinkConfig {
            host: "source.internal".to_string(),
            port: 3306,
            username: "repl".to_string(),
            password: "s3cr'et".to_string().into(),
            use_encrypted_transport: true,
            auto_position: false,
            log_coordinate: SourceLogCoordinate::new("binlog.000042", 1234).unwrap(),
        };

        let statement = render_change_source_statement(&link);
        assert_eq!(
            statement,
            "CHANGE REPLICATION SOURCE TO \
             SOURCE_HOST = 'source.internal', \
             SOURCE_PORT = 3306, \
             SOURCE_USER = 'repl', \
             SOURCE_PASSWORD = 's3cr''et', \
             SOURCE_LOG_FILE = 'binlog.000042', \
             SOURCE_LOG_POS = 1234, \
             SOURCE_AUTO_POSITION = 0, \
             SOURCE_SSL = 1"
        );
    }
}
