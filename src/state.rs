//! Shared relay state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the room hub that fans scene frames out to connected clients, the
//! snapshot store, and the per-client channel capacity. The relay keeps no
//! scene graph of its own; clients are the only owners of board state.

use std::sync::Arc;

use crate::services::persistence::SnapshotStore;
use crate::transport::RoomHub;

/// Shared application state. Clone is required by Axum; every field is
/// cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub hub: RoomHub,
    pub snapshots: Arc<dyn SnapshotStore>,
    /// Capacity of each client's outbound frame channel.
    pub channel_capacity: usize,
}

impl AppState {
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotStore>, channel_capacity: usize) -> Self {
        Self { hub: RoomHub::new(), snapshots, channel_capacity: channel_capacity.max(1) }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
