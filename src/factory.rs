//! Node factory: builds a shape and an empty label with default geometry and
//! hands them to [`lifecycle::group`].
//!
//! The factory never talks to the network. Whoever calls it is responsible
//! for announcing the new node's kind and identifier to peers.

#[cfg(test)]
#[path = "factory_test.rs"]
mod factory_test;

use tracing::debug;
use uuid::Uuid;

use crate::consts::DEFAULT_ORIGIN;
use crate::geometry::{Point, Size, Transform};
use crate::lifecycle;
use crate::node::NodeId;
use crate::scene::SceneGraph;
use crate::shape::{Geometry, Label, Shape, ShapeKind};

/// Everything needed to build one node.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSpec {
    pub id: NodeId,
    pub kind: ShapeKind,
    pub color: String,
    pub position: Point,
    /// Source and natural size for image nodes.
    pub image: Option<(String, Size)>,
}

impl NodeSpec {
    /// A spec with a fresh identifier at the default origin.
    #[must_use]
    pub fn new(kind: ShapeKind, color: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), kind, color: color.into(), position: DEFAULT_ORIGIN, image: None }
    }

    /// Reuse an identifier assigned elsewhere (replaying a peer's creation).
    #[must_use]
    pub fn with_id(mut self, id: NodeId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    #[must_use]
    pub fn with_image(mut self, src: impl Into<String>, natural: Size) -> Self {
        self.image = Some((src.into(), natural));
        self
    }

    fn geometry(&self) -> Geometry {
        match (self.kind, &self.image) {
            (ShapeKind::Image, Some((src, natural))) => Geometry::image(src.clone(), *natural),
            (kind, _) => Geometry::default_for(kind),
        }
    }
}

/// Build a node from `spec`, add it to the scene grouped, and make it active.
pub fn create_node(scene: &mut SceneGraph, spec: NodeSpec) -> NodeId {
    let shape = Shape::new(spec.geometry(), spec.color);
    let id = lifecycle::group(
        scene,
        spec.id,
        shape,
        Label::empty(),
        Transform::at(spec.position),
        Vec::new(),
    );
    debug!(%id, kind = spec.kind.as_str(), "created node");
    id
}
