use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::coordinate::CoordinateError;

/// Errors that can occur during a bootstrap run.
///
/// Every variant except the connectivity errors swallowed by the readiness
/// gate is fatal: the orchestrator aborts the whole process and leaves
/// recovery to the next restart cycle.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("database error during bootstrap: {0}")]
    Database(#[from] sqlx::Error),

    #[error("an io error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("timed out connecting to {target} after {timeout:?}")]
    ConnectTimeout { target: String, timeout: Duration },

    /// The source status query returned no rows. This usually means binary
    /// logging is disabled on the source, which operator action must fix.
    #[error("source status returned no log coordinate; binary logging appears disabled on the source")]
    SourceLoggingDisabled,

    #[error("invalid source log coordinate: {0}")]
    Coordinate(#[from] CoordinateError),

    #[error("seed dump failed: {0}")]
    DumpFailed(String),

    /// A dump tool can exit successfully and still produce nothing, e.g. on a
    /// permissions problem. An empty artifact must never be loaded.
    #[error("seed artifact at {} is empty", .path.display())]
    EmptySeedArtifact { path: PathBuf },

    /// The captured binlog file fell out of the source's retention window
    /// while the dump was running. The whole cycle must be restarted.
    #[error("captured binlog file {file} is no longer retained by the source")]
    CoordinateNotRetained { file: String },

    #[error("seed load failed: {0}")]
    LoadFailed(String),

    #[error("replication link is not configured")]
    LinkNotConfigured,
}
