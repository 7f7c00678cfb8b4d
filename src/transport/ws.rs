//! Websocket transport: speaks JSON text frames to the relay server.
//!
//! LIFECYCLE
//! =========
//! 1. Connect to `/api/ws` and wait for `session:connected`
//! 2. `room:join` and wait for the matching done/error reply
//! 3. Emit `scene:*` frames; receive peers' frames
//! 4. `room:part` and close on disconnect
//!
//! Frames that arrive while waiting for a reply are queued and handed out by
//! the next [`Transport::recv`] calls in arrival order.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{info, warn};

use super::{Transport, TransportError};
use crate::frame::{Data, FRAME_MESSAGE, Frame, Status};

/// How long to wait for the relay to answer a handshake or membership request.
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    client_id: Option<String>,
    room: Option<String>,
    pending: VecDeque<Frame>,
}

impl WsTransport {
    /// Connect to a relay at `url` (for example `ws://127.0.0.1:3000/api/ws`).
    ///
    /// # Errors
    ///
    /// Returns a websocket error if the handshake fails, `Closed` if the relay
    /// hangs up before greeting, or `Timeout` if it never greets.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        let (stream, _) = connect_async(url).await?;
        let mut transport = Self { stream, client_id: None, room: None, pending: VecDeque::new() };

        let greeting = transport.wait_for(|f| f.syscall == "session:connected").await?;
        transport.client_id = greeting.str_field("client_id").map(str::to_owned);
        info!(%url, client_id = ?transport.client_id, "ws transport: connected");
        Ok(transport)
    }

    /// Client id assigned by the relay.
    #[must_use]
    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    async fn send_frame(&mut self, frame: &Frame) -> Result<(), TransportError> {
        let json = serde_json::to_string(frame)?;
        self.stream.send(Message::Text(json.into())).await?;
        Ok(())
    }

    /// Next frame from the socket, skipping anything that is not a JSON frame.
    async fn next_frame(&mut self) -> Result<Frame, TransportError> {
        loop {
            let Some(msg) = self.stream.next().await else {
                return Err(TransportError::Closed);
            };
            match msg? {
                Message::Text(text) => match serde_json::from_str::<Frame>(text.as_str()) {
                    Ok(frame) => return Ok(frame),
                    Err(e) => warn!(error = %e, "ws transport: invalid inbound frame"),
                },
                Message::Close(_) => return Err(TransportError::Closed),
                _ => {}
            }
        }
    }

    /// Read until a frame matches `pred`, queueing everything else.
    async fn wait_for(&mut self, pred: impl Fn(&Frame) -> bool + Send + Sync) -> Result<Frame, TransportError> {
        let fut = async {
            loop {
                let frame = self.next_frame().await?;
                if pred(&frame) {
                    return Ok(frame);
                }
                self.pending.push_back(frame);
            }
        };
        tokio::time::timeout(REPLY_TIMEOUT, fut).await.map_err(|_| TransportError::Timeout)?
    }

    /// Send a request and wait for its terminal reply.
    async fn request(&mut self, request: Frame) -> Result<Frame, TransportError> {
        let request_id = request.id;
        self.send_frame(&request).await?;
        let reply = self.wait_for(|f| f.parent_id == Some(request_id)).await?;
        if reply.status == Status::Error {
            return Err(TransportError::Rejected {
                syscall: reply.syscall.clone(),
                message: reply.str_field(FRAME_MESSAGE).unwrap_or("-").to_owned(),
            });
        }
        Ok(reply)
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn join_room(&mut self, room: &str) -> Result<(), TransportError> {
        self.request(Frame::request("room:join", Data::new()).with_room(room)).await?;
        self.room = Some(room.to_owned());
        Ok(())
    }

    async fn emit(&mut self, frame: Frame) -> Result<(), TransportError> {
        let Some(room) = self.room.clone() else {
            return Err(TransportError::NotJoined);
        };
        self.send_frame(&frame.with_room(room)).await
    }

    async fn recv(&mut self) -> Option<Frame> {
        if let Some(frame) = self.pending.pop_front() {
            return Some(frame);
        }
        match self.next_frame().await {
            Ok(frame) => Some(frame),
            Err(TransportError::Closed) => None,
            Err(e) => {
                warn!(error = %e, "ws transport: receive failed");
                None
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        if let Some(room) = self.room.take() {
            self.send_frame(&Frame::request("room:part", Data::new()).with_room(room)).await?;
        }
        self.stream.close(None).await?;
        Ok(())
    }
}
