//! Node lifecycle: grouping, ungrouping for edits, regrouping, and deletion.
//!
//! STATE MACHINE
//! =============
//! `Grouped --ungroup--> UngroupedEditing --regroup--> Grouped`, with delete
//! reachable from either state. [`ungroup`] hands back an [`EditToken`] that
//! [`regroup`] consumes, so a regroup can only ever follow the ungroup of the
//! same node. Identity, transform, and connections survive the round trip.
//!
//! DELETE
//! ======
//! Deleting a node first strips the matching back-reference from every peer
//! it is connected to, then removes each shared line, then the node itself.
//! Deleting a node that is already gone is a no-op.

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;

use tracing::debug;

use crate::connection;
use crate::frame::ErrorCode;
use crate::geometry::Transform;
use crate::input::NodeEvent;
use crate::node::{BackRef, Node, NodeId, RenderState};
use crate::scene::{Active, SceneGraph};
use crate::shape::{Label, Shape};

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("node {0} is already ungrouped for editing")]
    AlreadyEditing(NodeId),
    #[error("node {0} is not ungrouped for editing")]
    NotEditing(NodeId),
}

impl ErrorCode for LifecycleError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NodeNotFound(_) => "E_NODE_NOT_FOUND",
            Self::AlreadyEditing(_) => "E_ALREADY_EDITING",
            Self::NotEditing(_) => "E_NOT_EDITING",
        }
    }
}

/// Proof that a node is ungrouped for editing. Consumed by [`regroup`].
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct EditToken {
    node: NodeId,
}

impl EditToken {
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}

/// What a cascading delete removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteReport {
    pub node: NodeId,
    pub lines_removed: usize,
    /// Back-references stripped from peers.
    pub refs_removed: usize,
}

// =============================================================================
// GROUP / UNGROUP / REGROUP
// =============================================================================

/// Combine `shape` and `label` into a grouped node at `transform`, carrying
/// `connections` over unchanged. The node becomes active and shows its
/// delete affordance.
pub fn group(
    scene: &mut SceneGraph,
    id: NodeId,
    shape: Shape,
    mut label: Label,
    transform: Transform,
    connections: Vec<BackRef>,
) -> NodeId {
    label.exit_editing();
    let node = Node { id, shape, label, transform, editable: true, connections, state: RenderState::Grouped };

    scene.dismiss_affordance();
    scene.insert_node(node);
    scene.set_active(Active::Node(id));
    scene.show_affordance(id);
    scene.request_render();
    id
}

/// Detach a grouped node's shape and label so the label can be edited.
///
/// # Errors
///
/// `AlreadyEditing` if the node is already ungrouped; `NodeNotFound` if it
/// is not in the scene at all.
pub fn ungroup(scene: &mut SceneGraph, id: NodeId) -> Result<EditToken, LifecycleError> {
    let Some(mut node) = scene.remove_node(id) else {
        if scene.detached(id).is_some() {
            return Err(LifecycleError::AlreadyEditing(id));
        }
        return Err(LifecycleError::NodeNotFound(id));
    };
    node.editable = false;
    node.label.editable = true;

    if scene.active() == Some(Active::Node(id)) {
        scene.clear_active();
    }
    scene.dismiss_affordance();
    scene.insert_detached(node);
    scene.request_render();

    debug!(%id, "ungrouped node for editing");
    Ok(EditToken { node: id })
}

/// Put the text cursor in the detached label of a node this client is editing.
pub fn begin_text_edit(scene: &mut SceneGraph, token: &EditToken) {
    let Some(node) = scene.detached_mut(token.node) else {
        return;
    };
    node.label.enter_editing();
    scene.set_active(Active::Label(token.node));
}

/// Re-wrap the node detached by `token`, optionally replacing its label text.
///
/// # Errors
///
/// `NotEditing` if the detached node vanished (for example it was deleted
/// while being edited).
pub fn regroup(scene: &mut SceneGraph, token: EditToken, text: Option<String>) -> Result<NodeId, LifecycleError> {
    let Node { id, shape, mut label, transform, connections, .. } =
        scene.remove_detached(token.node).ok_or(LifecycleError::NotEditing(token.node))?;
    if let Some(text) = text {
        label.text = text;
    }
    group(scene, id, shape, label, transform, connections);
    debug!(%id, "regrouped node");
    Ok(id)
}

/// Change a grouped node's fill by ungrouping, recoloring, and regrouping.
///
/// # Errors
///
/// Same as [`ungroup`].
pub fn recolor(scene: &mut SceneGraph, id: NodeId, color: &str) -> Result<(), LifecycleError> {
    let token = ungroup(scene, id)?;
    if let Some(node) = scene.detached_mut(id) {
        color.clone_into(&mut node.shape.fill);
    }
    regroup(scene, token, None)?;
    Ok(())
}

// =============================================================================
// TRANSFORMS AND NOTIFICATIONS
// =============================================================================

/// Set a grouped node's transform and re-anchor its lines.
///
/// # Errors
///
/// `NodeNotFound` if the node is not grouped in this scene.
pub fn apply_transform(scene: &mut SceneGraph, id: NodeId, transform: Transform) -> Result<(), LifecycleError> {
    let node = scene.node_mut(id).ok_or(LifecycleError::NodeNotFound(id))?;
    node.transform = transform;
    connection::reanchor(scene, id);
    scene.request_render();
    Ok(())
}

/// React to a canvas notification on a grouped node.
pub fn observe(scene: &mut SceneGraph, id: NodeId, event: NodeEvent) {
    match event {
        NodeEvent::Selected | NodeEvent::Modified => scene.show_affordance(id),
        NodeEvent::Scaling | NodeEvent::Rotating | NodeEvent::Removed => scene.dismiss_affordance(),
        NodeEvent::Moving => {
            scene.dismiss_affordance();
            if connection::reanchor(scene, id) > 0 {
                scene.request_render();
            }
        }
    }
}

/// A press landed on empty canvas: the selection drops and so does the affordance.
pub fn pointer_down_empty(scene: &mut SceneGraph) {
    scene.clear_active();
    scene.dismiss_affordance();
}

// =============================================================================
// DELETE
// =============================================================================

/// Delete a node and every connection touching it.
///
/// Returns `None` when the node is already absent.
pub fn delete(scene: &mut SceneGraph, id: NodeId) -> Option<DeleteReport> {
    let node = scene.remove_node(id).or_else(|| scene.remove_detached(id))?;

    let mut report = DeleteReport { node: id, lines_removed: 0, refs_removed: 0 };
    for back_ref in &node.connections {
        if let Some(peer) = scene.any_node_mut(back_ref.peer) {
            report.refs_removed += peer.detach_peer(id);
        }
        if scene.remove_line(back_ref.line) {
            report.lines_removed += 1;
        }
    }

    if matches!(scene.active(), Some(Active::Node(a) | Active::Label(a)) if a == id) {
        scene.clear_active();
    }
    scene.dismiss_affordance();
    scene.request_render();

    debug!(%id, lines = report.lines_removed, refs = report.refs_removed, "deleted node");
    Some(report)
}
