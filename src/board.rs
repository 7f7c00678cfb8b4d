//! Board: the per-client dispatcher that owns one scene graph.
//!
//! ARCHITECTURE
//! ============
//! A client has exactly one [`Board`]. Local user interaction arrives as a
//! [`Command`], peer changes arrive as an [`Event`]; both enter through
//! [`Board::dispatch`], which mutates the scene graph and returns an
//! [`Outcome`] telling the caller what (if anything) to publish. Only local
//! commands ever publish, so replaying a peer's event never echoes.
//!
//! DESIGN
//! ======
//! - One mutation at a time: `dispatch` takes `&mut self` and never awaits.
//! - In-flight edits are tracked per node as [`EditToken`]s. `modifiedObject`
//!   parks a token, `regrouping` for the same id consumes it.
//! - Failures never escape `dispatch`. Lookup misses and malformed input are
//!   logged with their error code and discarded; deleting an absent node is
//!   a silent no-op.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::connection::{self, ConnectError, ConnectMode};
use crate::consts::DOUBLE_PRESS_WINDOW_MS;
use crate::factory::{self, NodeSpec};
use crate::frame::{ErrorCode, Frame};
use crate::geometry::{Point, Size, Transform};
use crate::input::{NodeEvent, PressDetector};
use crate::lifecycle::{self, EditToken, LifecycleError};
use crate::node::NodeId;
use crate::protocol::{self, Event, ProtocolError};
use crate::scene::{Active, BoardSnapshot, SceneGraph};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("no edit in flight for node {0}")]
    NotEditing(NodeId),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl ErrorCode for BoardError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E_NODE_NOT_FOUND",
            Self::NotEditing(_) => "E_NOT_EDITING",
            Self::Lifecycle(e) => e.error_code(),
            Self::Connect(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
        }
    }
}

/// A user interaction on this client.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddNode(NodeSpec),
    Select { id: NodeId },
    /// A pointer press on a node. Two presses inside the window edit the
    /// node, or pick it while connect mode is on.
    Press { id: NodeId, at_ms: i64 },
    Notify { id: NodeId, event: NodeEvent },
    /// A move, scale, or rotate gesture settled on `transform`.
    Transform { id: NodeId, transform: Transform },
    /// Finish editing a node's label.
    CommitText { id: NodeId, text: String },
    ChangeColor { id: NodeId, color: String },
    Delete { id: NodeId },
    ToggleConnectMode,
    PointerDownEmpty,
    Clear,
}

/// Anything that can mutate the board.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Local(Command),
    Remote(Event),
}

/// What the caller must do after a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing leaves this client.
    Quiet,
    /// Relay the event to the rest of the room.
    Publish(Event),
    /// Relay the event and hand the pre-clear snapshot to persistence.
    PublishAndArchive { event: Event, snapshot: BoardSnapshot },
}

impl Outcome {
    /// The event to relay, if any.
    #[must_use]
    pub fn event(&self) -> Option<&Event> {
        match self {
            Self::Quiet => None,
            Self::Publish(event) | Self::PublishAndArchive { event, .. } => Some(event),
        }
    }
}

// =============================================================================
// BOARD
// =============================================================================

#[derive(Debug)]
pub struct Board {
    room: String,
    scene: SceneGraph,
    connect: ConnectMode,
    presses: HashMap<NodeId, PressDetector>,
    edits: HashMap<NodeId, EditToken>,
    press_window_ms: i64,
}

impl Board {
    /// A board for `room` with the default background loaded.
    pub fn new(room: impl Into<String>) -> Self {
        Self::with_press_window(room, DOUBLE_PRESS_WINDOW_MS)
    }

    pub fn with_press_window(room: impl Into<String>, press_window_ms: i64) -> Self {
        let mut scene = SceneGraph::new();
        scene.load_default_background();
        Self {
            room: room.into(),
            scene,
            connect: ConnectMode::new(),
            presses: HashMap::new(),
            edits: HashMap::new(),
            press_window_ms,
        }
    }

    #[must_use]
    pub fn room(&self) -> &str {
        &self.room
    }

    #[must_use]
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    #[must_use]
    pub fn connect_mode(&self) -> &ConnectMode {
        &self.connect
    }

    /// Whether this client holds an edit token for `id`.
    #[must_use]
    pub fn is_editing(&self, id: NodeId) -> bool {
        self.edits.contains_key(&id)
    }

    // --- Entry points ---

    /// Apply one input. Never fails; discarded input yields [`Outcome::Quiet`].
    pub fn dispatch(&mut self, input: Input) -> Outcome {
        match input {
            Input::Local(command) => match self.apply_local(command) {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(room = %self.room, code = e.error_code(), error = %e, "board: discarded command");
                    Outcome::Quiet
                }
            },
            Input::Remote(event) => {
                let name = event.name();
                if let Err(e) = self.apply_remote(event) {
                    warn!(room = %self.room, event = name, code = e.error_code(), error = %e, "board: discarded event");
                }
                Outcome::Quiet
            }
        }
    }

    /// Decode an inbound frame and replay it.
    pub fn receive(&mut self, frame: &Frame) -> Outcome {
        match protocol::from_frame(frame) {
            Ok(event) => self.dispatch(Input::Remote(event)),
            Err(e) => {
                warn!(room = %self.room, syscall = %frame.syscall, code = e.error_code(), error = %e, "board: rejected frame");
                Outcome::Quiet
            }
        }
    }

    // --- Local commands ---

    fn apply_local(&mut self, command: Command) -> Result<Outcome, BoardError> {
        match command {
            Command::AddNode(spec) => {
                let event = Event::added_object(&spec);
                factory::create_node(&mut self.scene, spec);
                Ok(Outcome::Publish(event))
            }
            Command::Select { id } => {
                if self.scene.node(id).is_none() {
                    return Err(BoardError::NodeNotFound(id));
                }
                self.scene.set_active(Active::Node(id));
                self.scene.show_affordance(id);
                Ok(Outcome::Quiet)
            }
            Command::Press { id, at_ms } => self.press(id, at_ms),
            Command::Notify { id, event } => {
                lifecycle::observe(&mut self.scene, id, event);
                Ok(Outcome::Quiet)
            }
            Command::Transform { id, transform } => {
                lifecycle::apply_transform(&mut self.scene, id, transform)?;
                Ok(Outcome::Publish(Event::group_altered(id, &transform)))
            }
            Command::CommitText { id, text } => {
                let token = self.edits.remove(&id).ok_or(BoardError::NotEditing(id))?;
                lifecycle::regroup(&mut self.scene, token, Some(text.clone()))?;
                Ok(Outcome::Publish(Event::Regrouping { id, text }))
            }
            Command::ChangeColor { id, color } => {
                lifecycle::recolor(&mut self.scene, id, &color)?;
                Ok(Outcome::Publish(Event::ColorChange { id, color }))
            }
            Command::Delete { id } => {
                if self.delete(id) {
                    Ok(Outcome::Publish(Event::DeleteGroup { id }))
                } else {
                    Ok(Outcome::Quiet)
                }
            }
            Command::ToggleConnectMode => {
                let on = self.connect.toggle();
                debug!(room = %self.room, on, "board: connect mode toggled");
                Ok(Outcome::Quiet)
            }
            Command::PointerDownEmpty => {
                lifecycle::pointer_down_empty(&mut self.scene);
                Ok(Outcome::Quiet)
            }
            Command::Clear => {
                let snapshot = self.scene.snapshot();
                self.wipe();
                Ok(Outcome::PublishAndArchive { event: Event::ClearCanvas, snapshot })
            }
        }
    }

    /// A press on a grouped node. The second press inside the window either
    /// picks the node for connect mode or ungroups it for editing.
    fn press(&mut self, id: NodeId, at_ms: i64) -> Result<Outcome, BoardError> {
        if self.scene.node(id).is_none() {
            return Err(BoardError::NodeNotFound(id));
        }
        let window = self.press_window_ms;
        let fired = self.presses.entry(id).or_insert_with(|| PressDetector::new(window)).press(at_ms);
        if !fired {
            return Ok(Outcome::Quiet);
        }

        if self.connect.is_active() {
            if !self.connect.pick(id) {
                return Ok(Outcome::Quiet);
            }
            let &[first, second] = self.connect.buffer().picks() else {
                return Ok(Outcome::Quiet);
            };
            if let Err(e) = connection::connect(&mut self.scene, &mut self.connect) {
                self.connect.exit();
                return Err(e.into());
            }
            return Ok(Outcome::Publish(Event::DrawingLines { first, second }));
        }

        let token = lifecycle::ungroup(&mut self.scene, id)?;
        lifecycle::begin_text_edit(&mut self.scene, &token);
        self.edits.insert(id, token);
        Ok(Outcome::Publish(Event::ModifiedObject { id }))
    }

    // --- Remote events ---

    fn apply_remote(&mut self, event: Event) -> Result<(), BoardError> {
        match event {
            Event::AddedObject { id, kind, color, left, top, image } => {
                if self.scene.contains(id) {
                    debug!(%id, "board: node already exists");
                    return Ok(());
                }
                let mut spec = NodeSpec::new(kind, color).with_id(id).at(Point::new(left, top));
                if let Some(image) = image {
                    spec = spec.with_image(image.src, Size::new(image.natural_width, image.natural_height));
                }
                factory::create_node(&mut self.scene, spec);
            }
            Event::GroupAltered { id, left, top, scale_x, scale_y, angle } => {
                let transform = Transform { left, top, scale_x, scale_y, angle };
                self.scene.dismiss_affordance();
                lifecycle::apply_transform(&mut self.scene, id, transform)?;
            }
            Event::ModifiedObject { id } => {
                let token = lifecycle::ungroup(&mut self.scene, id)?;
                self.edits.insert(id, token);
            }
            Event::Regrouping { id, text } => {
                let token = self.edits.remove(&id).ok_or(BoardError::NotEditing(id))?;
                lifecycle::regroup(&mut self.scene, token, Some(text))?;
            }
            Event::ColorChange { id, color } => {
                lifecycle::recolor(&mut self.scene, id, &color)?;
            }
            Event::DeleteGroup { id } => {
                self.delete(id);
            }
            Event::DrawingLines { first, second } => {
                let mut scratch = ConnectMode::new();
                scratch.enter();
                scratch.pick(first);
                scratch.pick(second);
                connection::connect(&mut self.scene, &mut scratch)?;
            }
            Event::ClearCanvas => self.wipe(),
        }
        Ok(())
    }

    // --- Shared helpers ---

    /// Cascading delete plus cleanup of per-node client state. Returns false
    /// when the node was already gone.
    fn delete(&mut self, id: NodeId) -> bool {
        self.edits.remove(&id);
        self.presses.remove(&id);
        if lifecycle::delete(&mut self.scene, id).is_none() {
            debug!(%id, "board: delete of absent node ignored");
            return false;
        }
        true
    }

    /// Empty the scene and reload the default background.
    fn wipe(&mut self) {
        self.scene.clear();
        self.scene.load_default_background();
        self.edits.clear();
        self.presses.clear();
        self.connect.exit();
        debug!(room = %self.room, "board: cleared");
    }
}
