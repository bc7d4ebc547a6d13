// # guardsync-core
//
// Core library for one-way configuration sync between appliance instances.
//
// One "origin" instance is the source of truth. Every "replica" is driven
// to match it: filter lists, DNS rewrites, clients, DHCP, access lists and
// related settings. The origin always wins; nothing flows back.
//
// ## Architecture Overview
//
// - **ApplianceClient**: Trait for reading and writing one instance's resources
// - **Merge**: Generic key-based diff producing adds, updates and deletes
// - **SyncAction**: One step per resource type, selected by feature flags
// - **SyncEngine**: Runs the actions against every replica under a run guard
// - **StatusStore**: Per-instance outcome of the last pass
//
// ## Design Principles
//
// 1. **Idempotency**: A replica already in sync receives no writes
// 2. **Snapshot Once**: The origin is read once per pass, never written
// 3. **Isolation**: One replica failing never stops the others
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod actions;
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod registry;
pub mod snapshot;
pub mod status;
pub mod traits;
pub mod version;

// Re-export core types for convenience
pub use config::{Features, InstanceConfig, SyncConfig};
pub use engine::{PassOutcome, PassReport, ReplicaReport, SyncEngine, SyncEvent};
pub use error::{Error, Result};
pub use registry::{SyncAction, build_actions};
pub use snapshot::OriginSnapshot;
pub use status::{InstanceStatus, SyncState, SyncStatus};
pub use traits::{ApplianceClient, ClientFactory};
