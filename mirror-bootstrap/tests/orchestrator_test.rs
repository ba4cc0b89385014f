use mirror_bootstrap::clients::memory::{MemoryReplica, MemorySource};
use mirror_bootstrap::error::BootstrapError;
use mirror_bootstrap::identity::ReplicaIdentity;
use mirror_bootstrap::orchestrator::{Orchestrator, OrchestratorSettings};
use mirror_bootstrap::state::ReplicaState;
use mirror_telemetry::init_test_tracing;
use std::time::Duration;
use tempfile::TempDir;

fn settings(dirs: &TempDir) -> OrchestratorSettings {
    OrchestratorSettings {
        source_host: "source.internal".to_string(),
        source_port: 3306,
        replication_username: "repl".to_string(),
        replication_password: "repl-pass".to_string().into(),
        source_schema: "app".to_string(),
        local_schema: "app".to_string(),
        use_encrypted_transport: true,
        dump_dir: dirs.path().join("dumps"),
        state_dir: dirs.path().join("state"),
        poll_interval: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn test_fresh_bootstrap_end_to_end() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    source.insert("2", "beta").await;
    let replica = MemoryReplica::new();

    let settings = settings(&dirs);
    let artifact_path = settings.seed_artifact_path();
    let state_dir = settings.state_dir.clone();
    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings);

    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.initial_state, ReplicaState::Fresh);
    assert!(report.seeded);
    assert!(report.health.unwrap().is_healthy());

    // Seeded data matches the source, schema exists, flags are set.
    assert_eq!(replica.schemas().await, vec!["app".to_string()]);
    assert_eq!(replica.rows().await, source.materialized().await);
    assert!(replica.is_read_only().await);
    assert!(replica.is_super_read_only().await);

    // The link points at the captured coordinate in explicit position mode.
    let link = replica.link().await.unwrap();
    assert!(!link.auto_position);
    assert!(link.use_encrypted_transport);
    assert_eq!(link.username, "repl");
    assert_eq!(link.log_coordinate.file, "binlog.000001");
    assert_eq!(link.log_coordinate.position, 2);

    // Artifact and identity token were persisted; the load consumed the
    // artifact the dump produced.
    assert!(std::fs::metadata(&artifact_path).unwrap().len() > 0);
    assert_eq!(replica.loaded_artifacts().await, vec![artifact_path]);
    assert!(ReplicaIdentity::load(&state_dir).unwrap().is_some());
}

#[tokio::test]
async fn test_second_run_performs_no_seeding() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));

    let first = orchestrator.run().await.unwrap();
    assert!(first.seeded);
    let first_link = replica.link().await.unwrap();

    // New source writes between the runs must not trigger re-seeding.
    source.insert("2", "beta").await;

    let second = orchestrator.run().await.unwrap();
    assert_eq!(second.initial_state, ReplicaState::Configured);
    assert!(!second.seeded);

    assert_eq!(source.dump_count().await, 1);
    assert_eq!(replica.load_calls().await, 1);
    assert_eq!(replica.configure_calls().await, 1);
    assert_eq!(replica.reset_calls().await, 1);

    // The link configuration is untouched.
    let second_link = replica.link().await.unwrap();
    assert_eq!(second_link.log_coordinate, first_link.log_coordinate);
}

#[tokio::test]
async fn test_coordinate_never_ahead_of_dump_snapshot() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    source.insert("2", "beta").await;
    // This write lands after the status query but before the dump snapshot
    // opens, i.e. in the window the two-step protocol has to tolerate.
    source.inject_write_before_dump("3", "gamma").await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    orchestrator.run().await.unwrap();

    // The captured coordinate trails the snapshot: it predates the injected
    // write even though the snapshot already contains it.
    let link = replica.link().await.unwrap();
    assert_eq!(link.log_coordinate.position, 2);
    let snapshot = replica.rows().await;
    assert_eq!(snapshot.get("3").map(String::as_str), Some("gamma"));

    // Replaying the log from the captured coordinate re-applies the injected
    // write idempotently; the result is never a strict subset of the
    // snapshot.
    let entries = source.log_entries_from(link.log_coordinate.position).await;
    replica.apply_log(entries).await;
    let replayed = replica.rows().await;
    assert_eq!(replayed, source.materialized().await);
    assert!(snapshot.iter().all(|(k, v)| replayed.get(k) == Some(v)));
}

#[tokio::test]
async fn test_empty_dump_aborts_before_load() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    source.produce_empty_dump().await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    let error = orchestrator.run().await.unwrap_err();

    assert!(matches!(error, BootstrapError::EmptySeedArtifact { .. }));
    assert_eq!(replica.load_calls().await, 0);
    assert_eq!(replica.configure_calls().await, 0);
    assert!(replica.link().await.is_none());
}

#[tokio::test]
async fn test_disabled_logging_aborts_before_dump() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.disable_logging().await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    let error = orchestrator.run().await.unwrap_err();

    assert!(matches!(error, BootstrapError::SourceLoggingDisabled));
    assert_eq!(source.dump_count().await, 0);
    assert_eq!(replica.load_calls().await, 0);
}

#[tokio::test]
async fn test_purged_binlog_aborts_before_link_configuration() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    source.purge_binlog().await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    let error = orchestrator.run().await.unwrap_err();

    assert!(matches!(error, BootstrapError::CoordinateNotRetained { .. }));
    assert_eq!(replica.load_calls().await, 0);
    assert_eq!(replica.configure_calls().await, 0);
}

#[tokio::test]
async fn test_read_only_reenforced_on_configured_path() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    let replica = MemoryReplica::new();

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    orchestrator.run().await.unwrap();

    // Simulate a restart that dropped the runtime-only flags.
    replica.clear_read_only().await;
    assert!(!replica.is_read_only().await);

    let report = orchestrator.run().await.unwrap();
    assert!(!report.seeded);
    assert!(replica.is_read_only().await);
    assert!(replica.is_super_read_only().await);
}

#[tokio::test]
async fn test_volume_loss_recovers_with_fresh_cycle() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;

    let replica = MemoryReplica::new();
    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    orchestrator.run().await.unwrap();

    // The data directory is wiped: a brand-new instance comes up empty.
    let wiped_replica = MemoryReplica::new();
    source.insert("2", "beta").await;

    let orchestrator = Orchestrator::new(source.clone(), wiped_replica.clone(), settings(&dirs));
    let report = orchestrator.run().await.unwrap();

    assert_eq!(report.initial_state, ReplicaState::Fresh);
    assert!(report.seeded);
    assert!(report.health.unwrap().is_healthy());
    assert_eq!(source.dump_count().await, 2);
    assert_eq!(wiped_replica.rows().await, source.materialized().await);
    assert!(wiped_replica.is_read_only().await);
}

#[tokio::test(start_paused = true)]
async fn test_readiness_gate_retries_until_ready() {
    init_test_tracing();

    let dirs = TempDir::new().unwrap();
    let source = MemorySource::new();
    source.insert("1", "alpha").await;
    let replica = MemoryReplica::new();
    replica.ready_after(3).await;

    let orchestrator = Orchestrator::new(source.clone(), replica.clone(), settings(&dirs));
    let report = orchestrator.run().await.unwrap();

    assert!(report.seeded);
    assert_eq!(replica.ping_attempts().await, 4);
}
