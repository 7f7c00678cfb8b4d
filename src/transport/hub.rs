//! In-process room hub and the transport that talks to it.
//!
//! The relay server and in-process clients share [`RoomHub`]: each room maps
//! client ids to bounded channels, and a broadcast clones the frame into every
//! member's channel except the sender's. A member whose channel is full
//! misses that frame.

#[cfg(test)]
#[path = "hub_test.rs"]
mod hub_test;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Transport, TransportError};
use crate::frame::Frame;

/// Connected members of one room: `client_id` -> sender for outgoing frames.
type Members = HashMap<Uuid, mpsc::Sender<Frame>>;

// =============================================================================
// ROOM HUB
// =============================================================================

#[derive(Clone, Default)]
pub struct RoomHub {
    rooms: Arc<RwLock<HashMap<String, Members>>>,
}

impl RoomHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `client_id` in `room`. Returns the member count after joining.
    pub async fn join(&self, room: &str, client_id: Uuid, tx: mpsc::Sender<Frame>) -> usize {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room.to_owned()).or_default();
        members.insert(client_id, tx);
        info!(%room, %client_id, members = members.len(), "hub: client joined room");
        members.len()
    }

    /// Remove `client_id` from `room`, evicting the room once it is empty.
    pub async fn part(&self, room: &str, client_id: Uuid) {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room) else {
            return;
        };
        members.remove(&client_id);
        info!(%room, %client_id, remaining = members.len(), "hub: client left room");
        if members.is_empty() {
            rooms.remove(room);
            debug!(%room, "hub: evicted empty room");
        }
    }

    /// Best-effort fan-out to every member of `room` except `exclude`.
    /// Returns how many members accepted the frame.
    pub async fn broadcast(&self, room: &str, frame: &Frame, exclude: Option<Uuid>) -> usize {
        let rooms = self.rooms.read().await;
        let Some(members) = rooms.get(room) else {
            return 0;
        };

        let mut delivered = 0;
        for (client_id, tx) in members {
            if exclude == Some(*client_id) {
                continue;
            }
            if tx.try_send(frame.clone()).is_ok() {
                delivered += 1;
            } else {
                debug!(%room, %client_id, syscall = %frame.syscall, "hub: dropped frame for slow client");
            }
        }
        delivered
    }

    /// Number of members currently in `room`.
    pub async fn members(&self, room: &str) -> usize {
        self.rooms.read().await.get(room).map_or(0, HashMap::len)
    }
}

// =============================================================================
// HUB TRANSPORT
// =============================================================================

/// A client attached directly to a [`RoomHub`] in the same process.
pub struct HubTransport {
    hub: RoomHub,
    client_id: Uuid,
    room: Option<String>,
    tx: mpsc::Sender<Frame>,
    rx: mpsc::Receiver<Frame>,
}

impl HubTransport {
    /// A detached client whose inbound channel holds up to `capacity` frames.
    #[must_use]
    pub fn new(hub: RoomHub, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self { hub, client_id: Uuid::new_v4(), room: None, tx, rx }
    }

    #[must_use]
    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }
}

#[async_trait]
impl Transport for HubTransport {
    async fn join_room(&mut self, room: &str) -> Result<(), TransportError> {
        if let Some(old) = self.room.take() {
            self.hub.part(&old, self.client_id).await;
        }
        self.hub.join(room, self.client_id, self.tx.clone()).await;
        self.room = Some(room.to_owned());
        Ok(())
    }

    async fn emit(&mut self, frame: Frame) -> Result<(), TransportError> {
        let Some(room) = self.room.as_deref() else {
            return Err(TransportError::NotJoined);
        };
        let frame = frame.with_room(room).with_from(self.client_id.to_string());
        self.hub.broadcast(room, &frame, Some(self.client_id)).await;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Frame> {
        self.rx.recv().await
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if let Some(room) = self.room.take() {
            self.hub.part(&room, self.client_id).await;
        }
        self.rx.close();
        Ok(())
    }
}
