//! Scene graph: the per-client store of nodes, lines, and transient UI state.
//!
//! Grouped nodes live in `nodes` in stacking order. Nodes that have been
//! ungrouped for editing move to `detached`, where their shape and label are
//! independent members of the scene until they are regrouped. Lines are kept
//! beneath every node. The renderer reads from this store; it never mutates it.
//!
//! Lookup by identifier is a linear scan, which is fine for boards of tens to
//! low hundreds of nodes.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use serde::{Deserialize, Serialize};

use crate::consts::{AFFORDANCE_OFFSET_PX, AFFORDANCE_SIZE_PX, DEFAULT_BACKGROUND, LINE_OPACITY, LINE_STROKE, LINE_STROKE_WIDTH};
use crate::geometry::{Point, Size};
use crate::node::{Endpoint, LineId, Node, NodeId, RenderState};

// =============================================================================
// LINES
// =============================================================================

/// The visual line of a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: LineId,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub stroke: String,
    pub stroke_width: f64,
    pub opacity: f64,
}

impl Line {
    /// A default-styled line from `a` to `b`.
    #[must_use]
    pub fn between(id: LineId, a: Point, b: Point) -> Self {
        Self {
            id,
            x1: a.x,
            y1: a.y,
            x2: b.x,
            y2: b.y,
            stroke: LINE_STROKE.to_owned(),
            stroke_width: LINE_STROKE_WIDTH,
            opacity: LINE_OPACITY,
        }
    }

    #[must_use]
    pub fn endpoint(&self, which: Endpoint) -> Point {
        match which {
            Endpoint::P1 => Point::new(self.x1, self.y1),
            Endpoint::P2 => Point::new(self.x2, self.y2),
        }
    }

    pub fn set_endpoint(&mut self, which: Endpoint, at: Point) {
        match which {
            Endpoint::P1 => {
                self.x1 = at.x;
                self.y1 = at.y;
            }
            Endpoint::P2 => {
                self.x2 = at.x;
                self.y2 = at.y;
            }
        }
    }
}

// =============================================================================
// TRANSIENT UI STATE
// =============================================================================

/// What currently holds the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Active {
    /// A grouped node.
    Node(NodeId),
    /// The detached label of a node being edited locally.
    Label(NodeId),
}

/// The delete control shown next to a selected node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeleteAffordance {
    pub node: NodeId,
    /// Top-left of the control.
    pub anchor: Point,
    pub size: Size,
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Portable serialized form of a whole board.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub nodes: Vec<Node>,
    /// Nodes that were ungrouped for editing when the snapshot was taken.
    #[serde(default)]
    pub editing: Vec<Node>,
    pub lines: Vec<Line>,
    pub background: Option<String>,
}

impl BoardSnapshot {
    /// Serialize to a JSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns a serde error if a float is not representable in JSON.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// =============================================================================
// SCENE GRAPH
// =============================================================================

/// In-memory scene graph owned by exactly one client.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: Vec<Node>,
    detached: Vec<Node>,
    lines: Vec<Line>,
    background: Option<String>,
    active: Option<Active>,
    affordance: Option<DeleteAffordance>,
    render_requests: u64,
}

impl SceneGraph {
    /// An empty scene with no background.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Nodes ---

    /// Append a grouped node on top of the stacking order.
    pub fn insert_node(&mut self, node: Node) {
        self.nodes.push(node);
    }

    /// Remove a grouped node by id.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        Some(self.nodes.remove(index))
    }

    /// Grouped node by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Grouped nodes in stacking order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    // --- Detached (ungrouped) nodes ---

    /// Park a node outside the grouped set. It is always marked as
    /// ungrouped for editing.
    pub(crate) fn insert_detached(&mut self, mut node: Node) {
        node.state = RenderState::UngroupedEditing;
        self.detached.push(node);
    }

    pub fn remove_detached(&mut self, id: NodeId) -> Option<Node> {
        let index = self.detached.iter().position(|n| n.id == id)?;
        Some(self.detached.remove(index))
    }

    #[must_use]
    pub fn detached(&self, id: NodeId) -> Option<&Node> {
        self.detached.iter().find(|n| n.id == id)
    }

    pub fn detached_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.detached.iter_mut().find(|n| n.id == id)
    }

    /// Nodes currently ungrouped for editing.
    #[must_use]
    pub fn detached_nodes(&self) -> &[Node] {
        &self.detached
    }

    /// A node in either state.
    #[must_use]
    pub fn any_node(&self, id: NodeId) -> Option<&Node> {
        self.node(id).or_else(|| self.detached(id))
    }

    /// A node in either state, mutably.
    pub fn any_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if let Some(index) = self.nodes.iter().position(|n| n.id == id) {
            return self.nodes.get_mut(index);
        }
        self.detached.iter_mut().find(|n| n.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.any_node(id).is_some()
    }

    // --- Lines ---

    /// Add a line beneath everything already in the scene.
    pub fn add_line(&mut self, line: Line) {
        self.lines.insert(0, line);
    }

    /// Remove a line. Returns false if it was already gone.
    pub fn remove_line(&mut self, id: LineId) -> bool {
        let Some(index) = self.lines.iter().position(|l| l.id == id) else {
            return false;
        };
        self.lines.remove(index);
        true
    }

    #[must_use]
    pub fn line(&self, id: LineId) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub fn line_mut(&mut self, id: LineId) -> Option<&mut Line> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    #[must_use]
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    // --- Background ---

    pub fn load_default_background(&mut self) {
        self.background = Some(DEFAULT_BACKGROUND.to_owned());
        self.request_render();
    }

    #[must_use]
    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    // --- Selection ---

    pub fn set_active(&mut self, active: Active) {
        self.active = Some(active);
    }

    pub fn clear_active(&mut self) {
        self.active = None;
    }

    #[must_use]
    pub fn active(&self) -> Option<Active> {
        self.active
    }

    // --- Delete affordance ---

    /// Show the delete control next to grouped node `id`, replacing any
    /// existing one. No-op if the node is not grouped.
    pub fn show_affordance(&mut self, id: NodeId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let anchor = node.top_right().offset(-AFFORDANCE_OFFSET_PX, -AFFORDANCE_OFFSET_PX);
        self.affordance = Some(DeleteAffordance { node: id, anchor, size: Size::new(AFFORDANCE_SIZE_PX, AFFORDANCE_SIZE_PX) });
    }

    pub fn dismiss_affordance(&mut self) {
        self.affordance = None;
    }

    #[must_use]
    pub fn affordance(&self) -> Option<DeleteAffordance> {
        self.affordance
    }

    // --- Rendering ---

    /// Ask the renderer for a full redraw.
    pub fn request_render(&mut self) {
        self.render_requests += 1;
    }

    /// Redraws requested since the scene was created.
    #[must_use]
    pub fn render_requests(&self) -> u64 {
        self.render_requests
    }

    // --- Whole-graph operations ---

    /// Remove every node, line, selection, and the background.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.detached.clear();
        self.lines.clear();
        self.background = None;
        self.active = None;
        self.affordance = None;
        self.request_render();
    }

    /// Serialize the whole graph.
    #[must_use]
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            nodes: self.nodes.clone(),
            editing: self.detached.clone(),
            lines: self.lines.clone(),
            background: self.background.clone(),
        }
    }

    /// Number of nodes in either state.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len() + self.detached.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.detached.is_empty()
    }
}
