//! REST route for archiving a board snapshot.

#[cfg(test)]
#[path = "snapshots_test.rs"]
mod snapshots_test;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Serialize;
use tracing::error;
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::scene::BoardSnapshot;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SnapshotSaved {
    pub id: Uuid,
    pub room_id: String,
}

/// `POST /api/rooms/{room}/snapshot`: store the posted snapshot for `room`.
///
/// # Errors
///
/// Returns `500` if the snapshot store fails. Bodies that do not parse as a
/// snapshot are rejected by the extractor before this runs.
pub async fn save_snapshot(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(snapshot): Json<BoardSnapshot>,
) -> Result<(StatusCode, Json<SnapshotSaved>), StatusCode> {
    match state.snapshots.save(&room, &snapshot).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(SnapshotSaved { id, room_id: room }))),
        Err(e) => {
            error!(%room, code = e.error_code(), error = %e, "snapshot save failed");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
