//! Client event loop: one board, one transport, one mutation at a time.
//!
//! LIFECYCLE
//! =========
//! 1. Join the board's room
//! 2. `select!` over inbound peer frames and local commands; each is fed to
//!    [`Board::dispatch`] to completion before the next is read
//! 3. Publish whatever the outcome asks for
//! 4. When the command channel closes or the transport ends, leave the room
//!    and hand the board back
//!
//! Inbound frames are polled first so that peer changes already delivered
//! are applied before later local commands.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::board::{Board, Command, Input, Outcome};
use crate::frame::{Data, ErrorCode, Frame};
use crate::protocol::{self, ProtocolError};
use crate::transport::{Transport, TransportError};

/// Syscall clients use to hand a board snapshot to the relay for storage.
pub const SAVE_SYSCALL: &str = "board:save";

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ErrorCode for ClientError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.retryable(),
            Self::Protocol(_) => false,
        }
    }
}

/// Drive `board` until `commands` closes or the transport ends.
///
/// # Errors
///
/// Returns an error if joining, publishing, or leaving fails on the transport.
pub async fn run_client<T: Transport>(
    mut transport: T,
    mut board: Board,
    mut commands: mpsc::Receiver<Command>,
) -> Result<Board, ClientError> {
    transport.join_room(board.room()).await?;
    info!(room = %board.room(), "client: joined room");

    loop {
        tokio::select! {
            biased;
            frame = transport.recv() => {
                let Some(frame) = frame else { break };
                if !protocol::is_scene_syscall(&frame.syscall) {
                    debug!(syscall = %frame.syscall, "client: ignoring non-scene frame");
                    continue;
                }
                board.receive(&frame);
            }
            command = commands.recv() => {
                let Some(command) = command else { break };
                let outcome = board.dispatch(Input::Local(command));
                publish(&mut transport, board.room(), outcome).await?;
            }
        }
    }

    transport.disconnect().await?;
    info!(room = %board.room(), nodes = board.scene().len(), "client: left room");
    Ok(board)
}

/// Emit what a dispatch outcome asks for.
async fn publish<T: Transport>(transport: &mut T, room: &str, outcome: Outcome) -> Result<(), ClientError> {
    match outcome {
        Outcome::Quiet => {}
        Outcome::Publish(event) => {
            transport.emit(protocol::to_frame(&event, room)?).await?;
        }
        Outcome::PublishAndArchive { event, snapshot } => {
            transport.emit(protocol::to_frame(&event, room)?).await?;
            let snapshot = snapshot.to_value().map_err(ProtocolError::Encode)?;
            let save = Frame::request(SAVE_SYSCALL, Data::new()).with_room(room).with_data("snapshot", snapshot);
            transport.emit(save).await?;
        }
    }
    Ok(())
}
