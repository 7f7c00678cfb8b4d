//! Replication protocol: the named scene events peers exchange and their
//! frame encoding.
//!
//! DESIGN
//! ======
//! Each structural change a client makes locally is published as exactly one
//! [`Event`], keyed by the stable identifier of the node it touches. Peers
//! replay the event through the same lifecycle and connection operations the
//! originator used. On the wire an event is a `scene:<eventName>` request
//! frame whose flat `data` map holds the event's fields.
//!
//! Decoding never panics: a frame that is not a scene event, names an unknown
//! event, or lacks required fields is rejected with a typed [`ProtocolError`].

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use serde::{Deserialize, Serialize};

use crate::factory::NodeSpec;
use crate::frame::{Data, ErrorCode, Frame};
use crate::geometry::Transform;
use crate::node::NodeId;
use crate::shape::ShapeKind;

/// Syscall prefix shared by every scene event.
pub const SCENE_PREFIX: &str = "scene";

/// Tag key used while (de)serializing an event's payload.
const EVENT_TAG: &str = "event";

/// Every event name the protocol understands.
pub const EVENT_NAMES: [&str; 8] = [
    "addedObject",
    "groupAltered",
    "modifiedObject",
    "regrouping",
    "colorChange",
    "deleteGroup",
    "drawingLines",
    "clearCanvas",
];

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("not a scene event: {0}")]
    NotSceneEvent(String),
    #[error("unknown scene event: {0}")]
    UnknownEvent(String),
    #[error("malformed {event} payload: {source}")]
    Malformed {
        event: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ErrorCode for ProtocolError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotSceneEvent(_) => "E_NOT_SCENE_EVENT",
            Self::UnknownEvent(_) => "E_UNKNOWN_EVENT",
            Self::Malformed { .. } => "E_MALFORMED_EVENT",
            Self::Encode(_) => "E_ENCODE",
        }
    }
}

/// A structural change relayed between peers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// A node was created with the given identifier, with its top-left
    /// corner at (`left`, `top`).
    AddedObject {
        id: NodeId,
        kind: ShapeKind,
        color: String,
        left: f64,
        top: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<ImageSource>,
    },
    /// A node's transform settled after a move, scale, or rotate.
    GroupAltered {
        id: NodeId,
        left: f64,
        top: f64,
        scale_x: f64,
        scale_y: f64,
        #[serde(default)]
        angle: f64,
    },
    /// A node was ungrouped so its label can be edited.
    ModifiedObject { id: NodeId },
    /// The edit of node `id` finished with the given label text.
    Regrouping { id: NodeId, text: String },
    ColorChange { id: NodeId, color: String },
    DeleteGroup { id: NodeId },
    /// A connection was drawn from `first` (owns p1) to `second` (owns p2).
    DrawingLines { first: NodeId, second: NodeId },
    ClearCanvas,
}

/// Source and natural pixel size of an image node. Peers need both to build
/// the same geometry the originator did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSource {
    pub src: String,
    pub natural_width: f64,
    pub natural_height: f64,
}

// =============================================================================
// ACCESSORS
// =============================================================================

impl Event {
    /// Wire name of the event.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddedObject { .. } => "addedObject",
            Self::GroupAltered { .. } => "groupAltered",
            Self::ModifiedObject { .. } => "modifiedObject",
            Self::Regrouping { .. } => "regrouping",
            Self::ColorChange { .. } => "colorChange",
            Self::DeleteGroup { .. } => "deleteGroup",
            Self::DrawingLines { .. } => "drawingLines",
            Self::ClearCanvas => "clearCanvas",
        }
    }

    /// Announce the creation of the node described by `spec`.
    #[must_use]
    pub fn added_object(spec: &NodeSpec) -> Self {
        let image = spec.image.as_ref().map(|(src, natural)| ImageSource {
            src: src.clone(),
            natural_width: natural.width,
            natural_height: natural.height,
        });
        Self::AddedObject {
            id: spec.id,
            kind: spec.kind,
            color: spec.color.clone(),
            left: spec.position.x,
            top: spec.position.y,
            image,
        }
    }

    /// Build a `groupAltered` event from a node's transform.
    #[must_use]
    pub fn group_altered(id: NodeId, t: &Transform) -> Self {
        Self::GroupAltered { id, left: t.left, top: t.top, scale_x: t.scale_x, scale_y: t.scale_y, angle: t.angle }
    }
}

// =============================================================================
// FRAME ENCODING
// =============================================================================

/// Whether `syscall` names a scene event.
#[must_use]
pub fn is_scene_syscall(syscall: &str) -> bool {
    syscall.split_once(':').is_some_and(|(prefix, _)| prefix == SCENE_PREFIX)
}

/// Wrap an event in a request frame addressed to `room`.
///
/// # Errors
///
/// Returns `Encode` if the payload cannot be represented as JSON (for
/// example a non-finite coordinate).
pub fn to_frame(event: &Event, room: &str) -> Result<Frame, ProtocolError> {
    let data: Data = match serde_json::to_value(event).map_err(ProtocolError::Encode)? {
        serde_json::Value::Object(fields) => fields.into_iter().filter(|(k, _)| k != EVENT_TAG).collect(),
        _ => Data::new(),
    };
    Ok(Frame::request(format!("{SCENE_PREFIX}:{}", event.name()), data).with_room(room))
}

/// Decode a scene event from a frame.
///
/// # Errors
///
/// `NotSceneEvent` for any other syscall prefix, `UnknownEvent` for an
/// unrecognised event name, `Malformed` when required fields are missing or
/// have the wrong type.
pub fn from_frame(frame: &Frame) -> Result<Event, ProtocolError> {
    if frame.prefix() != SCENE_PREFIX || !frame.syscall.contains(':') {
        return Err(ProtocolError::NotSceneEvent(frame.syscall.clone()));
    }
    let name = frame.op();
    if !EVENT_NAMES.contains(&name) {
        return Err(ProtocolError::UnknownEvent(name.to_owned()));
    }

    let mut fields: serde_json::Map<String, serde_json::Value> =
        frame.data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    fields.insert(EVENT_TAG.to_owned(), serde_json::Value::String(name.to_owned()));

    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|source| ProtocolError::Malformed { event: name.to_owned(), source })
}
