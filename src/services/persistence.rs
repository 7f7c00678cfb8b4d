//! Persistence service: archives board snapshots handed over on clear.
//!
//! DESIGN
//! ======
//! Storage sits behind the [`SnapshotStore`] trait so the relay can run with
//! Postgres ([`PgSnapshotStore`]) or entirely in memory
//! ([`MemorySnapshotStore`], used when no database is configured and in
//! tests). Only the write path exists; nothing reads snapshots back.

#[cfg(test)]
#[path = "persistence_test.rs"]
mod persistence_test;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::frame::ErrorCode;
use crate::scene::BoardSnapshot;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("snapshot encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ErrorCode for PersistenceError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "E_DATABASE",
            Self::Encode(_) => "E_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Database(_))
    }
}

/// Accepts board snapshots for storage.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Store `snapshot` for `room`. Returns the new snapshot's id.
    async fn save(&self, room: &str, snapshot: &BoardSnapshot) -> Result<Uuid, PersistenceError>;
}

// =============================================================================
// POSTGRES
// =============================================================================

pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn save(&self, room: &str, snapshot: &BoardSnapshot) -> Result<Uuid, PersistenceError> {
        let id = Uuid::new_v4();
        let data = snapshot.to_value()?;
        sqlx::query(
            "INSERT INTO board_snapshots (id, room_id, node_count, line_count, snapshot) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(room)
        .bind(count(snapshot.nodes.len() + snapshot.editing.len()))
        .bind(count(snapshot.lines.len()))
        .bind(data)
        .execute(&self.pool)
        .await?;

        info!(%id, %room, "persistence: stored snapshot");
        Ok(id)
    }
}

/// Row counts stored as Postgres `INTEGER`.
fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

// =============================================================================
// IN MEMORY
// =============================================================================

/// A snapshot kept by [`MemorySnapshotStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub id: Uuid,
    pub room: String,
    pub snapshot: serde_json::Value,
}

#[derive(Clone, Default)]
pub struct MemorySnapshotStore {
    saved: Arc<RwLock<Vec<StoredSnapshot>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every snapshot stored so far, oldest first.
    pub async fn saved(&self) -> Vec<StoredSnapshot> {
        self.saved.read().await.clone()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, room: &str, snapshot: &BoardSnapshot) -> Result<Uuid, PersistenceError> {
        let stored = StoredSnapshot { id: Uuid::new_v4(), room: room.to_owned(), snapshot: snapshot.to_value()? };
        let id = stored.id;
        self.saved.write().await.push(stored);
        info!(%id, %room, "persistence: stored snapshot in memory");
        Ok(id)
    }
}
