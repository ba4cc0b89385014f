//! Bootstrap and recovery orchestration for a MySQL replica that mirrors a
//! remote, administratively-inaccessible source over binlog replication.
//!
//! The orchestrator runs once per container lifecycle. It waits for the local
//! instance to accept connections, derives the replica state from the
//! instance's own replication metadata, and either performs a full
//! seed-and-configure cycle (fresh instance) or merely re-asserts read-only
//! mode and reports replication thread health (already configured).
//!
//! The seeding cycle captures the source's binlog coordinate *before* opening
//! the dump snapshot, so the recorded position is never ahead of the seeded
//! data; replaying the binlog from it can only re-apply rows the snapshot
//! already contains.

pub mod clients;
pub mod coordinate;
pub mod error;
pub mod identity;
pub mod orchestrator;
pub mod state;
