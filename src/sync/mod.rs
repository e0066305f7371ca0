//! Local-cache synchronization core: reconciles the remote paginated catalog
//! with the local store, on demand and on a recurring background cadence,
//! with at most one cycle in flight at any time.

mod engine;
mod scheduler;
mod state;

pub use engine::{PageSyncOutcome, SyncEngine};
pub use scheduler::{Notifier, SyncScheduler};
pub use state::{CycleGuard, SyncState};
