//! Diagram nodes and the back-references that make up connections.
//!
//! A connection between two nodes is one line in the scene graph plus two
//! [`BackRef`]s, one stored on each endpoint node. A back-reference names the
//! line endpoint its node owns and the peer node on the other side. Peers are
//! referenced by identifier only; the scene graph is the sole owner of nodes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geometry::{self, Point, Size, Transform};
use crate::shape::{Label, Shape, ShapeKind};

/// Stable node identifier, assigned once at creation.
pub type NodeId = Uuid;

/// Identifier of a connection line.
pub type LineId = Uuid;

/// Which end of a line a back-reference owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    /// Owns `(x1, y1)`.
    P1,
    /// Owns `(x2, y2)`.
    P2,
}

/// One side of a connection, stored on the node that owns `endpoint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackRef {
    pub endpoint: Endpoint,
    pub line: LineId,
    pub peer: NodeId,
}

/// Render state of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderState {
    /// Shape and label move together as one unit.
    #[default]
    Grouped,
    /// Shape and label are detached so the label can be edited.
    UngroupedEditing,
}

/// A shape and its label treated as one positioned, connectable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub shape: Shape,
    pub label: Label,
    pub transform: Transform,
    /// Cleared while the node is ungrouped for editing.
    pub editable: bool,
    pub connections: Vec<BackRef>,
    pub state: RenderState,
}

impl Node {
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    #[must_use]
    pub fn size(&self) -> Size {
        self.shape.geometry.size()
    }

    /// Anchor point for every line attached to this node.
    #[must_use]
    pub fn center(&self) -> Point {
        geometry::center(self.size(), &self.transform)
    }

    #[must_use]
    pub fn top_right(&self) -> Point {
        geometry::top_right(self.size(), &self.transform)
    }

    /// Back-references pointing at `peer`.
    pub fn refs_to(&self, peer: NodeId) -> impl Iterator<Item = &BackRef> {
        self.connections.iter().filter(move |r| r.peer == peer)
    }

    /// Drop every back-reference pointing at `peer`. Returns how many were removed.
    pub fn detach_peer(&mut self, peer: NodeId) -> usize {
        let before = self.connections.len();
        self.connections.retain(|r| r.peer != peer);
        before - self.connections.len()
    }
}
