//! Transport: room-scoped publish/subscribe delivery of frames.
//!
//! DESIGN
//! ======
//! A client joins one room, emits frames to it, and receives the frames other
//! members emit. Delivery is best-effort and ordered per sender; nothing is
//! echoed back to the sender. Subscriptions are a single inbound stream read
//! with [`Transport::recv`]; the board dispatcher matches on event name.
//!
//! Two implementations ship with the crate: [`HubTransport`] talks to an
//! in-process [`RoomHub`] and [`WsTransport`] talks to the relay server over
//! a websocket.

pub mod hub;
pub mod ws;

pub use hub::{HubTransport, RoomHub};
pub use ws::WsTransport;

use async_trait::async_trait;

use crate::frame::{ErrorCode, Frame};

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("not joined to a room")]
    NotJoined,
    #[error("connection closed")]
    Closed,
    #[error("timed out waiting for the relay")]
    Timeout,
    #[error("relay rejected {syscall}: {message}")]
    Rejected { syscall: String, message: String },
    #[error("frame encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("websocket error: {0}")]
    Ws(Box<tokio_tungstenite::tungstenite::Error>),
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Ws(Box::new(e))
    }
}

impl ErrorCode for TransportError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotJoined => "E_NOT_JOINED",
            Self::Closed => "E_CLOSED",
            Self::Timeout => "E_TIMEOUT",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Encode(_) => "E_ENCODE",
            Self::Ws(_) => "E_WEBSOCKET",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Closed | Self::Timeout | Self::Ws(_))
    }
}

/// Room-scoped frame delivery used by the client loop.
#[async_trait]
pub trait Transport: Send {
    /// Join `room`, leaving any room joined before.
    async fn join_room(&mut self, room: &str) -> Result<(), TransportError>;

    /// Send a frame to every other member of the joined room.
    async fn emit(&mut self, frame: Frame) -> Result<(), TransportError>;

    /// Next frame from another member. `None` once the transport is closed.
    async fn recv(&mut self) -> Option<Frame>;

    /// Leave the room and close the transport.
    async fn disconnect(&mut self) -> Result<(), TransportError>;
}
