use mirror_bootstrap::clients::mysql::{MySqlReplicaClient, MySqlSourceClient};
use mirror_bootstrap::orchestrator::{Orchestrator, OrchestratorSettings, RunReport};
use mirror_bootstrap::state::ReplicaState;
use mirror_config::shared::{
    ArtifactsConfig, MysqlConnectionConfig, OrchestratorConfig, SourceConfig,
};
use std::time::Duration;
use tracing::{debug, info};

/// Starts the bootstrap orchestrator with the provided configuration.
///
/// Wires the MySQL clients, runs the single linear bootstrap pass, and logs
/// the outcome. Any error aborts the process with a non-zero exit code;
/// recovery is left to the next container restart.
pub async fn start_orchestrator(config: OrchestratorConfig) -> anyhow::Result<()> {
    info!("starting replica bootstrap orchestrator");

    log_config(&config);

    let connect_timeout = Duration::from_millis(config.connect_timeout_ms);
    let source = MySqlSourceClient::new(config.source.clone(), connect_timeout);
    let replica = MySqlReplicaClient::new(config.replica.clone(), connect_timeout);

    let settings = OrchestratorSettings {
        source_host: config.source.host.clone(),
        source_port: config.source.port,
        replication_username: config.source.replication.username.clone(),
        replication_password: config.source.replication.password.clone().into(),
        source_schema: config.source.schema.clone(),
        local_schema: config.local_schema().to_string(),
        // The link always requires an encrypted transport, independently of
        // how the orchestrator's own source connections are configured.
        use_encrypted_transport: true,
        dump_dir: config.artifacts.dump_dir.clone(),
        state_dir: config.artifacts.state_dir.clone(),
        poll_interval: Duration::from_millis(config.poll_interval_ms),
    };

    let orchestrator = Orchestrator::new(source, replica, settings);
    let report = orchestrator.run().await?;
    log_report(&report);

    info!("orchestrator run completed");

    Ok(())
}

fn log_config(config: &OrchestratorConfig) {
    log_replica_config(&config.replica);
    log_source_config(&config.source);
    log_artifacts_config(&config.artifacts);
    debug!(
        local_schema = config.local_schema(),
        poll_interval_ms = config.poll_interval_ms,
        connect_timeout_ms = config.connect_timeout_ms,
        "orchestration config"
    );
}

fn log_replica_config(config: &MysqlConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "local replica connection config",
    );
}

fn log_source_config(config: &SourceConfig) {
    debug!(
        host = config.host,
        port = config.port,
        schema = config.schema,
        admin_username = config.admin.username,
        replication_username = config.replication.username,
        tls_enabled = config.tls.enabled,
        "source connection config",
    );
}

fn log_artifacts_config(config: &ArtifactsConfig) {
    debug!(
        dump_dir = %config.dump_dir.display(),
        state_dir = %config.state_dir.display(),
        "artifacts config"
    );
}

fn log_report(report: &RunReport) {
    match report.initial_state {
        ReplicaState::Fresh => {
            info!("fresh bootstrap completed, replication seeded and started")
        }
        ReplicaState::Configured => {
            info!("existing replication state verified, read-only re-enforced")
        }
    }
}
