//! Client seams between the orchestrator and its two databases.
//!
//! The orchestrator only ever talks to the outside world through
//! [`SourceClient`] and [`ReplicaClient`]. The MySQL implementations live in
//! [`mysql`]; [`memory`] provides in-process implementations used to test the
//! orchestration logic without real database instances.

use secrecy::SecretString;
use std::future::Future;
use std::path::Path;

use crate::coordinate::SourceLogCoordinate;
use crate::error::BootstrapError;

pub mod memory;
pub mod mysql;

/// Replication link parameters written to the local instance once per fresh
/// bootstrap cycle.
///
/// The link always runs in explicit coordinate mode: `auto_position` stays
/// false and the captured [`SourceLogCoordinate`] is the single source of
/// truth for where replay begins.
#[derive(Debug, Clone)]
pub struct ReplicationLinkConfig {
    /// Hostname of the source server.
    pub host: String,
    /// Port of the source server.
    pub port: u16,
    /// Replication-only username on the source.
    pub username: String,
    /// Password for the replication user.
    pub password: SecretString,
    /// Whether the link must use an encrypted transport.
    pub use_encrypted_transport: bool,
    /// Whether the link may derive its own start position. Always false in
    /// this design.
    pub auto_position: bool,
    /// The binlog coordinate replay starts from.
    pub log_coordinate: SourceLogCoordinate,
}

/// Replication thread health as reported by the local instance.
#[derive(Debug, Clone)]
pub struct ReplicaHealth {
    /// Whether the IO thread (log download) is running.
    pub io_thread_running: bool,
    /// Whether the SQL thread (log apply) is running.
    pub sql_thread_running: bool,
    /// Last IO thread error, if any.
    pub last_io_error: Option<String>,
    /// Last SQL thread error, if any.
    pub last_sql_error: Option<String>,
    /// Replication lag in seconds, when known.
    pub seconds_behind_source: Option<u64>,
}

impl ReplicaHealth {
    /// Returns true when both replication threads are running.
    pub fn is_healthy(&self) -> bool {
        self.io_thread_running && self.sql_thread_running
    }
}

/// Operations the orchestrator needs from the remote source.
///
/// All three operations run under the source's administrative/read identity;
/// the replication identity is only ever handed to the local instance inside
/// a [`ReplicationLinkConfig`].
pub trait SourceClient {
    /// Returns the source's current binlog coordinate.
    ///
    /// Runs on its own short-lived connection. An empty status result maps to
    /// [`BootstrapError::SourceLoggingDisabled`].
    fn current_log_coordinate(
        &self,
    ) -> impl Future<Output = Result<SourceLogCoordinate, BootstrapError>> + Send;

    /// Dumps the given schema into `artifact` under a single consistent
    /// snapshot and returns the number of bytes written.
    ///
    /// The snapshot opens when the dump starts; callers must capture the log
    /// coordinate *before* invoking this.
    fn dump_schema(
        &self,
        schema: &str,
        artifact: &Path,
    ) -> impl Future<Output = Result<u64, BootstrapError>> + Send;

    /// Lists the binlog files the source currently retains.
    fn retained_log_files(&self) -> impl Future<Output = Result<Vec<String>, BootstrapError>> + Send;
}

/// Operations the orchestrator needs from the local replica instance.
pub trait ReplicaClient {
    /// Probes the instance with a trivial query.
    fn ping(&self) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Returns the number of replication links configured on the instance.
    ///
    /// Zero means the instance has never been bootstrapped (or its data
    /// directory was wiped); anything else short-circuits the seeding cycle.
    fn configured_link_count(&self) -> impl Future<Output = Result<u64, BootstrapError>> + Send;

    /// Creates the schema if it does not exist yet.
    fn ensure_schema(&self, schema: &str)
    -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Loads a seed artifact into the given schema.
    ///
    /// Failure is fatal and must not be retried: a partial load leaves the
    /// instance in an undefined state that must never be promoted to
    /// replicating.
    fn load_seed_artifact(
        &self,
        schema: &str,
        artifact: &Path,
    ) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Clears any stale replication configuration.
    fn reset_replication(&self) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Writes the replication link configuration.
    fn configure_link(
        &self,
        link: &ReplicationLinkConfig,
    ) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Starts the replication threads.
    fn start_replication(&self) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Puts the instance into read-only and super-read-only mode.
    ///
    /// Safe to repeat; the orchestrator calls this on every run.
    fn ensure_read_only(&self) -> impl Future<Output = Result<(), BootstrapError>> + Send;

    /// Returns replication thread health, or `None` when the instance reports
    /// no replication status at all.
    fn health(&self) -> impl Future<Output = Result<Option<ReplicaHealth>, BootstrapError>> + Send;
}
