//! The phase-ordered bootstrap run.

use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::clients::{ReplicaClient, ReplicaHealth, ReplicationLinkConfig, SourceClient};
use crate::coordinate::SourceLogCoordinate;
use crate::error::BootstrapError;
use crate::identity::ReplicaIdentity;
use crate::state::ReplicaState;

/// File under the dump directory holding the seed artifact.
///
/// A fixed name keeps the artifact write-once per fresh cycle: the next fresh
/// cycle simply overwrites it.
const SEED_ARTIFACT_FILE: &str = "seed.sql";

/// Parameters of a bootstrap run, decoupled from the file-level configuration
/// so the orchestrator can be driven directly in tests.
pub struct OrchestratorSettings {
    /// Hostname of the source, as written into the replication link.
    pub source_host: String,
    /// Port of the source, as written into the replication link.
    pub source_port: u16,
    /// Replication-only username on the source.
    pub replication_username: String,
    /// Password for the replication user.
    pub replication_password: SecretString,
    /// Schema dumped from the source.
    pub source_schema: String,
    /// Schema created and seeded locally.
    pub local_schema: String,
    /// Whether the replication link must use an encrypted transport.
    pub use_encrypted_transport: bool,
    /// Directory the seed artifact is written to.
    pub dump_dir: PathBuf,
    /// Directory the replica identity token lives in.
    pub state_dir: PathBuf,
    /// Interval between readiness probes.
    pub poll_interval: Duration,
}

impl OrchestratorSettings {
    /// Full path of the seed artifact.
    pub fn seed_artifact_path(&self) -> PathBuf {
        self.dump_dir.join(SEED_ARTIFACT_FILE)
    }

    fn link_config(&self, log_coordinate: SourceLogCoordinate) -> ReplicationLinkConfig {
        ReplicationLinkConfig {
            host: self.source_host.clone(),
            port: self.source_port,
            username: self.replication_username.clone(),
            password: self.replication_password.clone(),
            use_encrypted_transport: self.use_encrypted_transport,
            auto_position: false,
            log_coordinate,
        }
    }
}

/// Summary of a completed bootstrap run.
#[derive(Debug)]
pub struct RunReport {
    /// State the replica was in when the run started.
    pub initial_state: ReplicaState,
    /// Whether this run performed the seed-and-configure cycle.
    pub seeded: bool,
    /// Replication thread health at the end of the run, if reported.
    pub health: Option<ReplicaHealth>,
}

/// Drives one bootstrap pass over a source and a replica.
///
/// Control flow is strictly linear; every phase blocks on its external call
/// before the next one starts. Crash-safety comes from idempotency, not from
/// transactional rollback: a kill mid-run either leaves the replica fresh
/// (the next run redoes the whole cycle) or configured (the next run
/// short-circuits to read-only enforcement).
pub struct Orchestrator<S, R> {
    source: S,
    replica: R,
    settings: OrchestratorSettings,
}

impl<S, R> Orchestrator<S, R>
where
    S: SourceClient,
    R: ReplicaClient,
{
    pub fn new(source: S, replica: R, settings: OrchestratorSettings) -> Self {
        Self {
            source,
            replica,
            settings,
        }
    }

    /// Runs the full bootstrap pass.
    pub async fn run(&self) -> Result<RunReport, BootstrapError> {
        self.wait_until_ready().await;

        let initial_state = self.detect_state().await?;
        info!(state = %initial_state, "detected replica state");

        let seeded = match initial_state {
            ReplicaState::Fresh => {
                self.seed_and_configure().await?;
                true
            }
            ReplicaState::Configured => {
                info!("replication already configured, leaving existing state untouched");
                false
            }
        };

        // Read-only flags do not survive every restart scenario, so they are
        // re-asserted on both paths.
        self.replica.ensure_read_only().await?;
        info!("read-only and super-read-only enforced");

        let health = self.replica.health().await?;
        self.report_health(health.as_ref());

        Ok(RunReport {
            initial_state,
            seeded,
            health,
        })
    }

    /// Blocks until the local instance answers a trivial query.
    ///
    /// Polls on a fixed interval with no upper bound: instance startup time
    /// is unbounded, and the supervisor applies its own timeout if needed.
    async fn wait_until_ready(&self) {
        let mut attempts: u64 = 0;
        loop {
            match self.replica.ping().await {
                Ok(()) => {
                    info!(attempts, "local instance is ready");
                    return;
                }
                Err(error) => {
                    attempts += 1;
                    debug!(attempts, %error, "local instance not ready yet");
                    tokio::time::sleep(self.settings.poll_interval).await;
                }
            }
        }
    }

    async fn detect_state(&self) -> Result<ReplicaState, BootstrapError> {
        let count = self.replica.configured_link_count().await?;

        Ok(ReplicaState::from_link_count(count))
    }

    /// The fresh-path cycle: capture coordinate, dump, load, configure, start.
    async fn seed_and_configure(&self) -> Result<(), BootstrapError> {
        let identity = ReplicaIdentity::load_or_create(&self.settings.state_dir)?;
        info!(identity = identity.as_str(), "replica identity");

        // The coordinate must be captured before the dump opens its
        // snapshot: a position read before the snapshot can only trail it,
        // and replaying from a trailing position merely re-applies rows the
        // snapshot already contains. Reversing this order can record a
        // position ahead of the snapshot and silently lose the gap.
        let coordinate = self.source.current_log_coordinate().await?;
        info!(coordinate = %coordinate, "captured source log coordinate");

        std::fs::create_dir_all(&self.settings.dump_dir)?;
        let artifact = self.settings.seed_artifact_path();
        let bytes = self
            .source
            .dump_schema(&self.settings.source_schema, &artifact)
            .await?;
        if bytes == 0 {
            return Err(BootstrapError::EmptySeedArtifact { path: artifact });
        }
        info!(bytes, artifact = %artifact.display(), "seed dump captured");

        // The dump may have outlived the source's log retention window, in
        // which case the captured coordinate is no longer replayable and the
        // only correct recovery is a fresh cycle.
        let retained = self.source.retained_log_files().await?;
        if !retained.iter().any(|file| file == &coordinate.file) {
            return Err(BootstrapError::CoordinateNotRetained {
                file: coordinate.file.clone(),
            });
        }

        self.replica
            .ensure_schema(&self.settings.local_schema)
            .await?;
        self.replica
            .load_seed_artifact(&self.settings.local_schema, &artifact)
            .await?;
        info!(schema = self.settings.local_schema, "seed artifact loaded");

        self.replica.reset_replication().await?;
        self.replica
            .configure_link(&self.settings.link_config(coordinate))
            .await?;
        self.replica.start_replication().await?;
        info!("replication link configured and started");

        Ok(())
    }

    /// Logs replication thread health. Health problems are surfaced for
    /// external monitoring, never treated as a bootstrap failure.
    fn report_health(&self, health: Option<&ReplicaHealth>) {
        match health {
            Some(health) if health.is_healthy() => {
                info!(
                    seconds_behind_source = health.seconds_behind_source,
                    "replication threads running"
                );
            }
            Some(health) => {
                warn!(
                    io_thread_running = health.io_thread_running,
                    sql_thread_running = health.sql_thread_running,
                    last_io_error = health.last_io_error.as_deref(),
                    last_sql_error = health.last_sql_error.as_deref(),
                    "replication threads not healthy"
                );
            }
            None => {
                warn!("instance reports no replication status");
            }
        }
    }
}
