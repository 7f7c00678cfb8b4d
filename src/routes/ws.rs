//! WebSocket handler: the room relay.
//!
//! DESIGN
//! ======
//! On upgrade, generates a client ID and enters a `select!` loop:
//! - Incoming client frames: parse and dispatch by syscall prefix
//! - Frames relayed from room peers: forward to the client
//!
//! Handlers validate and return an `Outcome`; the dispatch layer owns every
//! outbound concern (reply to sender, relay to peers). Scene events are
//! validated against the protocol and relayed verbatim. The relay never
//! applies them, so it holds no scene state.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade, send `session:connected` with `client_id`
//! 2. `room:join` places the client in a room
//! 3. `scene:*` frames are relayed to every other member of that room
//! 4. `board:save` archives a snapshot
//! 5. Close: broadcast `room:part`, leave the hub

#[cfg(test)]
#[path = "ws_test.rs"]
mod ws_test;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::SAVE_SYSCALL;
use crate::frame::{Data, ErrorCode, FRAME_CODE, FRAME_MESSAGE, Frame, Status};
use crate::protocol;
use crate::scene::BoardSnapshot;
use crate::state::AppState;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("join a room first")]
    NotJoined,
    #[error("{0} required")]
    MissingField(&'static str),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(#[source] serde_json::Error),
    #[error("unknown syscall: {0}")]
    UnknownSyscall(String),
}

impl ErrorCode for RelayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotJoined => "E_NOT_JOINED",
            Self::MissingField(_) => "E_MISSING_FIELD",
            Self::InvalidSnapshot(_) => "E_INVALID_SNAPSHOT",
            Self::UnknownSyscall(_) => "E_UNKNOWN_SYSCALL",
        }
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// What a handler asks the dispatch layer to do. Handlers never send frames
/// directly.
#[derive(Debug)]
enum Outcome {
    /// Relay the request unchanged to every room peer except the sender. No
    /// reply to the sender.
    RelayExcludeSender,
    /// Send done+data to the sender only.
    Reply(Data),
    /// Send an empty done to the sender only.
    Done,
    /// Reply to the sender with one payload, broadcast different data to peers.
    ReplyAndBroadcast { reply: Data, broadcast: Data },
}

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();

    // Frames relayed from room peers.
    let (client_tx, mut client_rx) = mpsc::channel::<Frame>(state.channel_capacity);

    let welcome = Frame::request("session:connected", Data::new()).with_data("client_id", client_id.to_string());
    if send_frame(&mut socket, &welcome).await.is_err() {
        return;
    }

    info!(%client_id, "ws: client connected");

    let mut current_room: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(&state, &mut current_room, client_id, &client_tx, text.as_str()).await;
                        if send_all(&mut socket, &replies).await.is_err() {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(room) = current_room {
        leave_room(&state, &room, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

/// Tell the room's peers that `client_id` left, then drop its membership.
async fn leave_room(state: &AppState, room: &str, client_id: Uuid) {
    let part = Frame::request("room:part", Data::new())
        .with_room(room)
        .with_data("client_id", client_id.to_string());
    state.hub.broadcast(room, &part, Some(client_id)).await;
    state.hub.part(room, client_id).await;
}

// =============================================================================
// FRAME DISPATCH
// =============================================================================

/// Parse and process one inbound text frame and return frames for the sender.
///
/// Kept apart from the socket so tests can drive dispatch end-to-end with
/// plain channels.
async fn process_inbound_text(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    text: &str,
) -> Vec<Frame> {
    let mut req: Frame = match serde_json::from_str(text) {
        Ok(r) => r,
        Err(e) => {
            warn!(%client_id, error = %e, "ws: invalid inbound frame");
            let err = Frame::request("gateway:error", Data::new()).with_data(FRAME_MESSAGE, format!("invalid json: {e}"));
            return vec![err];
        }
    };

    req.from = Some(client_id.to_string());

    if protocol::is_scene_syscall(&req.syscall) {
        debug!(%client_id, syscall = %req.syscall, "ws: recv scene frame");
    } else {
        info!(%client_id, id = %req.id, syscall = %req.syscall, status = ?req.status, "ws: recv frame");
    }

    let result = match req.prefix() {
        "room" => handle_room(state, current_room, client_id, client_tx, &req).await,
        "scene" => handle_scene(current_room.as_deref(), &req),
        "board" => handle_board(state, current_room.as_deref(), &req).await,
        _ => Err(req.error_from(&RelayError::UnknownSyscall(req.syscall.clone()))),
    };

    let room = current_room.clone();
    match result {
        Ok(Outcome::RelayExcludeSender) => {
            if let Some(room) = room {
                let relayed = req.with_room(room.clone());
                state.hub.broadcast(&room, &relayed, Some(client_id)).await;
            }
            Vec::new()
        }
        Ok(Outcome::Reply(data)) => vec![req.done_with(data)],
        Ok(Outcome::Done) => vec![req.done()],
        Ok(Outcome::ReplyAndBroadcast { reply, broadcast }) => {
            let mut sender_frame = req.done_with(reply);
            if let Some(room) = room {
                sender_frame.room_id = Some(room.clone());
                let notif = Frame::request(&req.syscall, broadcast).with_room(room.clone());
                state.hub.broadcast(&room, &notif, Some(client_id)).await;
            }
            vec![sender_frame]
        }
        Err(err_frame) => vec![err_frame],
    }
}

// =============================================================================
// ROOM HANDLERS
// =============================================================================

async fn handle_room(
    state: &AppState,
    current_room: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<Frame>,
    req: &Frame,
) -> Result<Outcome, Frame> {
    match req.op() {
        "join" => {
            let Some(room) = req.room_id.clone().or_else(|| req.str_field("room_id").map(str::to_owned)) else {
                return Err(req.error_from(&RelayError::MissingField("room_id")));
            };

            if let Some(old) = current_room.take() {
                leave_room(state, &old, client_id).await;
            }

            let members = state.hub.join(&room, client_id, client_tx.clone()).await;
            info!(%client_id, %room, members, "ws: joined room");
            *current_room = Some(room.clone());

            let mut reply = Data::new();
            reply.insert("room_id".into(), serde_json::json!(room));
            reply.insert("client_id".into(), serde_json::json!(client_id));
            reply.insert("members".into(), serde_json::json!(members));

            let mut broadcast = Data::new();
            broadcast.insert("client_id".into(), serde_json::json!(client_id));

            Ok(Outcome::ReplyAndBroadcast { reply, broadcast })
        }
        "part" => {
            if let Some(old) = current_room.take() {
                leave_room(state, &old, client_id).await;
            }
            Ok(Outcome::Done)
        }
        _ => Err(req.error_from(&RelayError::UnknownSyscall(req.syscall.clone()))),
    }
}

// =============================================================================
// SCENE HANDLERS
// =============================================================================

fn handle_scene(current_room: Option<&str>, req: &Frame) -> Result<Outcome, Frame> {
    if current_room.is_none() {
        return Err(req.error_from(&RelayError::NotJoined));
    }
    match protocol::from_frame(req) {
        Ok(_) => Ok(Outcome::RelayExcludeSender),
        Err(e) => {
            warn!(syscall = %req.syscall, code = e.error_code(), error = %e, "ws: rejected scene frame");
            Err(req.error_from(&e))
        }
    }
}

// =============================================================================
// BOARD HANDLERS
// =============================================================================

async fn handle_board(state: &AppState, current_room: Option<&str>, req: &Frame) -> Result<Outcome, Frame> {
    if req.syscall != SAVE_SYSCALL {
        return Err(req.error_from(&RelayError::UnknownSyscall(req.syscall.clone())));
    }
    let Some(room) = current_room else {
        return Err(req.error_from(&RelayError::NotJoined));
    };
    let Some(raw) = req.data.get("snapshot") else {
        return Err(req.error_from(&RelayError::MissingField("snapshot")));
    };
    let snapshot: BoardSnapshot = match serde_json::from_value(raw.clone()) {
        Ok(s) => s,
        Err(e) => return Err(req.error_from(&RelayError::InvalidSnapshot(e))),
    };

    match state.snapshots.save(room, &snapshot).await {
        Ok(id) => {
            let mut data = Data::new();
            data.insert("snapshot_id".into(), serde_json::json!(id));
            Ok(Outcome::Reply(data))
        }
        Err(e) => Err(req.error_from(&e)),
    }
}

// =============================================================================
// OUTBOUND
// =============================================================================

async fn send_all(socket: &mut WebSocket, frames: &[Frame]) -> Result<(), axum::Error> {
    for frame in frames {
        send_frame(socket, frame).await?;
    }
    Ok(())
}

async fn send_frame(socket: &mut WebSocket, frame: &Frame) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(frame) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Ok(());
        }
    };
    if frame.status == Status::Error {
        let code = frame.str_field(FRAME_CODE).unwrap_or("-");
        let message = frame.str_field(FRAME_MESSAGE).unwrap_or("-");
        warn!(id = %frame.id, syscall = %frame.syscall, code, message, "ws: send frame status=Error");
    } else if !protocol::is_scene_syscall(&frame.syscall) {
        info!(id = %frame.id, syscall = %frame.syscall, status = ?frame.status, "ws: send frame");
    }
    socket.send(Message::Text(json.into())).await
}
