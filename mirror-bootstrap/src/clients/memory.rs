//! In-memory implementations of the client seams.
//!
//! [`MemorySource`] models a single-writer source with a monotone change log;
//! [`MemoryReplica`] models the local instance. Both expose inspection and
//! fault-injection hooks so the orchestration logic can be exercised without
//! real database instances, including the interleavings that matter for the
//! coordinate-before-dump ordering guarantee.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::clients::{ReplicaClient, ReplicaHealth, ReplicationLinkConfig, SourceClient};
use crate::coordinate::SourceLogCoordinate;
use crate::error::BootstrapError;

/// The single binlog file the in-memory source writes to.
const BINLOG_FILE: &str = "binlog.000001";

#[derive(Debug, Default)]
struct SourceInner {
    /// Append-only change log; the log position is the entry count.
    log: Vec<(String, String)>,
    /// Writes applied between the status query and the dump snapshot, to
    /// exercise the ordering guarantee.
    writes_before_dump: Vec<(String, String)>,
    logging_disabled: bool,
    produce_empty_dump: bool,
    binlog_purged: bool,
    dump_count: u32,
}

impl SourceInner {
    fn materialized(&self) -> BTreeMap<String, String> {
        let mut rows = BTreeMap::new();
        for (key, value) in &self.log {
            rows.insert(key.clone(), value.clone());
        }

        rows
    }
}

/// In-memory [`SourceClient`].
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    inner: Arc<Mutex<SourceInner>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a row write to the change log.
    pub async fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.log.push((key.into(), value.into()));
    }

    /// Registers a write that lands after the status query but before the
    /// dump snapshot opens.
    pub async fn inject_write_before_dump(
        &self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) {
        let mut inner = self.inner.lock().await;
        inner.writes_before_dump.push((key.into(), value.into()));
    }

    /// Makes the status query return nothing, as a source without binary
    /// logging would.
    pub async fn disable_logging(&self) {
        self.inner.lock().await.logging_disabled = true;
    }

    /// Makes the next dump produce a zero-byte artifact while still exiting
    /// successfully.
    pub async fn produce_empty_dump(&self) {
        self.inner.lock().await.produce_empty_dump = true;
    }

    /// Simulates the captured binlog file falling out of the retention
    /// window.
    pub async fn purge_binlog(&self) {
        self.inner.lock().await.binlog_purged = true;
    }

    /// Number of dumps taken so far.
    pub async fn dump_count(&self) -> u32 {
        self.inner.lock().await.dump_count
    }

    /// All log entries at or after the given position.
    pub async fn log_entries_from(&self, position: u64) -> Vec<(String, String)> {
        let inner = self.inner.lock().await;
        inner.log.iter().skip(position as usize).cloned().collect()
    }

    /// The source's current materialized row set.
    pub async fn materialized(&self) -> BTreeMap<String, String> {
        self.inner.lock().await.materialized()
    }
}

impl SourceClient for MemorySource {
    async fn current_log_coordinate(&self) -> Result<SourceLogCoordinate, BootstrapError> {
        let inner = self.inner.lock().await;
        if inner.logging_disabled {
            return Err(BootstrapError::SourceLoggingDisabled);
        }

        Ok(SourceLogCoordinate::new(BINLOG_FILE, inner.log.len() as u64)?)
    }

    async fn dump_schema(&self, _schema: &str, artifact: &Path) -> Result<u64, BootstrapError> {
        let mut inner = self.inner.lock().await;
        inner.dump_count += 1;

        // Writes injected between the status query and the snapshot land
        // in the log now, so the snapshot below includes them.
        let pending = std::mem::take(&mut inner.writes_before_dump);
        inner.log.extend(pending);

        if inner.produce_empty_dump {
            std::fs::write(artifact, b"")?;
            return Ok(0);
        }

        let mut contents = String::new();
        for (key, value) in inner.materialized() {
            contents.push_str(&key);
            contents.push('=');
            contents.push_str(&value);
            contents.push('\n');
        }
        std::fs::write(artifact, contents.as_bytes())?;

        Ok(contents.len() as u64)
    }

    async fn retained_log_files(&self) -> Result<Vec<String>, BootstrapError> {
        let inner = self.inner.lock().await;
        if inner.binlog_purged {
            return Ok(vec!["binlog.000002".to_string()]);
        }

        Ok(vec![BINLOG_FILE.to_string()])
    }
}

#[derive(Debug, Default)]
struct ReplicaInner {
    ready_after_attempts: u32,
    ping_attempts: u32,
    schemas: Vec<String>,
    rows: BTreeMap<String, String>,
    link: Option<ReplicationLinkConfig>,
    replication_running: bool,
    read_only: bool,
    super_read_only: bool,
    load_calls: u32,
    configure_calls: u32,
    reset_calls: u32,
    loaded_artifacts: Vec<PathBuf>,
}

/// In-memory [`ReplicaClient`].
#[derive(Debug, Clone, Default)]
pub struct MemoryReplica {
    inner: Arc<Mutex<ReplicaInner>>,
}

impl MemoryReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the first `attempts` pings fail, as an instance that is still
    /// starting up would.
    pub async fn ready_after(&self, attempts: u32) {
        self.inner.lock().await.ready_after_attempts = attempts;
    }

    /// Number of readiness probes observed.
    pub async fn ping_attempts(&self) -> u32 {
        self.inner.lock().await.ping_attempts
    }

    /// Clears the read-only flags, as a restart without persisted settings
    /// would.
    pub async fn clear_read_only(&self) {
        let mut inner = self.inner.lock().await;
        inner.read_only = false;
        inner.super_read_only = false;
    }

    pub async fn is_read_only(&self) -> bool {
        self.inner.lock().await.read_only
    }

    pub async fn is_super_read_only(&self) -> bool {
        self.inner.lock().await.super_read_only
    }

    pub async fn schemas(&self) -> Vec<String> {
        self.inner.lock().await.schemas.clone()
    }

    pub async fn rows(&self) -> BTreeMap<String, String> {
        self.inner.lock().await.rows.clone()
    }

    pub async fn load_calls(&self) -> u32 {
        self.inner.lock().await.load_calls
    }

    pub async fn configure_calls(&self) -> u32 {
        self.inner.lock().await.configure_calls
    }

    pub async fn reset_calls(&self) -> u32 {
        self.inner.lock().await.reset_calls
    }

    pub async fn loaded_artifacts(&self) -> Vec<PathBuf> {
        self.inner.lock().await.loaded_artifacts.clone()
    }

    /// The configured link, if any.
    pub async fn link(&self) -> Option<ReplicationLinkConfig> {
        self.inner.lock().await.link.clone()
    }

    /// Applies log entries to the row set, overwriting existing keys.
    ///
    /// Row writes are idempotent at this layer, mirroring how re-applying an
    /// already-included binlog entry behaves on the real engine.
    pub async fn apply_log(&self, entries: Vec<(String, String)>) {
        let mut inner = self.inner.lock().await;
        for (key, value) in entries {
            inner.rows.insert(key, value);
        }
    }
}

impl ReplicaClient for MemoryReplica {
    async fn ping(&self) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        inner.ping_attempts += 1;
        if inner.ping_attempts <= inner.ready_after_attempts {
            return Err(BootstrapError::Database(sqlx::Error::PoolTimedOut));
        }

        Ok(())
    }

    async fn configured_link_count(&self) -> Result<u64, BootstrapError> {
        let inner = self.inner.lock().await;

        Ok(inner.link.is_some() as u64)
    }

    async fn ensure_schema(&self, schema: &str) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        if !inner.schemas.iter().any(|s| s == schema) {
            inner.schemas.push(schema.to_string());
        }

        Ok(())
    }

    async fn load_seed_artifact(
        &self,
        _schema: &str,
        artifact: &Path,
    ) -> Result<(), BootstrapError> {
        let contents = std::fs::read_to_string(artifact)?;

        let mut inner = self.inner.lock().await;
        inner.load_calls += 1;
        inner.loaded_artifacts.push(artifact.to_path_buf());
        for line in contents.lines() {
            if let Some((key, value)) = line.split_once('=') {
                inner.rows.insert(key.to_string(), value.to_string());
            }
        }

        Ok(())
    }

    async fn reset_replication(&self) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        inner.reset_calls += 1;
        inner.link = None;
        inner.replication_running = false;

        Ok(())
    }

    async fn configure_link(&self, link: &ReplicationLinkConfig) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        inner.configure_calls += 1;
        inner.link = Some(link.clone());

        Ok(())
    }

    async fn start_replication(&self) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        if inner.link.is_none() {
            return Err(BootstrapError::LinkNotConfigured);
        }
        inner.replication_running = true;

        Ok(())
    }

    async fn ensure_read_only(&self) -> Result<(), BootstrapError> {
        let mut inner = self.inner.lock().await;
        inner.read_only = true;
        inner.super_read_only = true;

        Ok(())
    }

    async fn health(&self) -> Result<Option<ReplicaHealth>, BootstrapError> {
        let inner = self.inner.lock().await;
        if inner.link.is_none() {
            return Ok(None);
        }

        Ok(Some(ReplicaHealth {
            io_thread_running: inner.replication_running,
            sql_thread_running: inner.replication_running,
            last_io_error: None,
            last_sql_error: None,
            seconds_behind_source: inner.replication_running.then_some(0),
        }))
    }
}
