//! Synchronization between the presentation layer and the note store.
//!
//! [`SyncService::start`] spawns the service and hands back a [`SyncHandle`].
//! The handle accepts loads, saves and deletes, and a background timer runs
//! a reconciliation pass every [`SyncOptions::reconcile_interval`].

mod reconcile;
mod service;
mod tombstone_set;
mod working_set;


pub use reconcile::{ReconcileReport, reconcile};
pub use service::{SyncHandle, SyncService};
pub use tombstone_set::TombstoneSet;
pub use working_set::WorkingSet;

use crate::domain::NoteId;
use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Default period between reconciliation passes.
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("note {0} has been deleted")]
    Deleted(NoteId),

    #[error("sync service is not running")]
    Closed,

    #[error("sync worker failed: {0}")]
    Worker(String),
}

/// Notifications broadcast to subscribers of a [`SyncHandle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Both the row delete and the tombstone write have committed.
    NoteDeleted(NoteId),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub reconcile_interval: Duration,
    /// Buffered events per subscriber before the slowest one starts lagging.
    pub event_capacity: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            reconcile_interval: DEFAULT_RECONCILE_INTERVAL,
            event_capacity: 64,
        }
    }
}
