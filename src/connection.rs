//! Connection manager: connect mode, the selection buffer, and line anchoring.
//!
//! A connection is formed from exactly two picks made while connect mode is
//! on. The line is drawn between the two node centers; the first pick owns
//! `(x1, y1)` and the second owns `(x2, y2)`. After any move, [`reanchor`]
//! recomputes each owned endpoint from the node's current center.

#[cfg(test)]
#[path = "connection_test.rs"]
mod connection_test;

use tracing::debug;
use uuid::Uuid;

use crate::consts::SELECTION_CAPACITY;
use crate::frame::ErrorCode;
use crate::node::{BackRef, Endpoint, LineId, NodeId};
use crate::scene::{Line, SceneGraph};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("connect needs exactly two picks, have {0}")]
    IncompleteSelection(usize),
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
}

impl ErrorCode for ConnectError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::IncompleteSelection(_) => "E_INCOMPLETE_SELECTION",
            Self::NodeNotFound(_) => "E_NODE_NOT_FOUND",
        }
    }
}

/// Ordered staging list of nodes picked in connect mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionBuffer {
    picks: Vec<NodeId>,
}

impl SelectionBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self { picks: Vec::with_capacity(SELECTION_CAPACITY) }
    }

    /// Add a pick. Returns false when the buffer is full or already holds `id`.
    pub fn push(&mut self, id: NodeId) -> bool {
        if self.is_full() || self.picks.contains(&id) {
            return false;
        }
        self.picks.push(id);
        true
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.picks.len() >= SELECTION_CAPACITY
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.picks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    #[must_use]
    pub fn picks(&self) -> &[NodeId] {
        &self.picks
    }

    pub fn clear(&mut self) {
        self.picks.clear();
    }
}

/// Client-local connect mode and its selection buffer.
#[derive(Debug, Clone, Default)]
pub struct ConnectMode {
    active: bool,
    buffer: SelectionBuffer,
}

impl ConnectMode {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn connect mode on with an empty buffer.
    pub fn enter(&mut self) {
        self.buffer.clear();
        self.active = true;
    }

    /// Turn connect mode off and drop any picks.
    pub fn exit(&mut self) {
        self.buffer.clear();
        self.active = false;
    }

    /// Flip connect mode. Returns the new state.
    pub fn toggle(&mut self) -> bool {
        if self.active {
            self.exit();
        } else {
            self.enter();
        }
        self.active
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Record a pick. Returns true once the buffer holds a full pair.
    pub fn pick(&mut self, id: NodeId) -> bool {
        self.buffer.push(id);
        self.buffer.is_full()
    }

    #[must_use]
    pub fn buffer(&self) -> &SelectionBuffer {
        &self.buffer
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Draw a line between the two buffered nodes and record both back-references.
///
/// On success the buffer is consumed and connect mode exits. On failure
/// nothing is mutated, including the buffer.
///
/// # Errors
///
/// `IncompleteSelection` unless exactly two picks are buffered;
/// `NodeNotFound` if either pick is no longer in the scene. A node that is
/// ungrouped for editing still counts and keeps the back-reference through
/// its regroup.
pub fn connect(scene: &mut SceneGraph, mode: &mut ConnectMode) -> Result<LineId, ConnectError> {
    let &[first, second] = mode.buffer.picks() else {
        return Err(ConnectError::IncompleteSelection(mode.buffer.len()));
    };
    let a = scene.any_node(first).ok_or(ConnectError::NodeNotFound(first))?.center();
    let b = scene.any_node(second).ok_or(ConnectError::NodeNotFound(second))?.center();

    let line_id = Uuid::new_v4();
    scene.add_line(Line::between(line_id, a, b));
    if let Some(node) = scene.any_node_mut(first) {
        node.connections.push(BackRef { endpoint: Endpoint::P1, line: line_id, peer: second });
    }
    if let Some(node) = scene.any_node_mut(second) {
        node.connections.push(BackRef { endpoint: Endpoint::P2, line: line_id, peer: first });
    }
    mode.exit();
    scene.request_render();

    debug!(%first, %second, line = %line_id, "connected nodes");
    Ok(line_id)
}

/// Move every line endpoint owned by `id` to the node's current center.
/// Returns the number of endpoints updated.
pub fn reanchor(scene: &mut SceneGraph, id: NodeId) -> usize {
    let Some(node) = scene.any_node(id) else {
        return 0;
    };
    let center = node.center();
    let owned: Vec<(Endpoint, LineId)> = node.connections.iter().map(|r| (r.endpoint, r.line)).collect();

    let mut updated = 0;
    for (endpoint, line_id) in owned {
        if let Some(line) = scene.line_mut(line_id) {
            line.set_endpoint(endpoint, center);
            updated += 1;
        }
    }
    updated
}
