//! Shape primitives and text labels that make up a diagram node.
//!
//! A node's visual is one [`Shape`] (a tagged [`Geometry`] plus a fill) and
//! one [`Label`]. Dispatch on the kind of shape always goes through the tag;
//! nothing probes for the presence of fields.

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    ELLIPSE_RX, ELLIPSE_RY, IMAGE_FALLBACK_HEIGHT, IMAGE_FALLBACK_WIDTH, IMAGE_TARGET_WIDTH, RECT_CORNER_RADIUS,
    RECT_HEIGHT, RECT_WIDTH,
};
use crate::geometry::Size;

/// The kind of shape a node is built from. Wire names match the event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[serde(rename = "rect")]
    Rectangle,
    Ellipse,
    Image,
}

impl ShapeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rectangle => "rect",
            Self::Ellipse => "ellipse",
            Self::Image => "image",
        }
    }
}

/// Kind-specific geometry of a shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    /// Rounded rectangle.
    #[serde(rename = "rect")]
    Rectangle { width: f64, height: f64, corner_radius: f64 },
    /// Ellipse described by its two radii.
    Ellipse { rx: f64, ry: f64 },
    /// Bitmap scaled uniformly by `scale`.
    Image { src: String, natural_width: f64, natural_height: f64, scale: f64 },
}

impl Geometry {
    /// Default geometry for `kind`. Images get the fallback natural size.
    #[must_use]
    pub fn default_for(kind: ShapeKind) -> Self {
        match kind {
            ShapeKind::Rectangle => Self::Rectangle {
                width: RECT_WIDTH,
                height: RECT_HEIGHT,
                corner_radius: RECT_CORNER_RADIUS,
            },
            ShapeKind::Ellipse => Self::Ellipse { rx: ELLIPSE_RX, ry: ELLIPSE_RY },
            ShapeKind::Image => {
                Self::image(String::new(), Size::new(IMAGE_FALLBACK_WIDTH, IMAGE_FALLBACK_HEIGHT))
            }
        }
    }

    /// Image geometry scaled so the rendered width is [`IMAGE_TARGET_WIDTH`].
    #[must_use]
    pub fn image(src: String, natural: Size) -> Self {
        let natural = if natural.width > 0.0 && natural.height > 0.0 {
            natural
        } else {
            Size::new(IMAGE_FALLBACK_WIDTH, IMAGE_FALLBACK_HEIGHT)
        };
        Self::Image {
            src,
            natural_width: natural.width,
            natural_height: natural.height,
            scale: IMAGE_TARGET_WIDTH / natural.width,
        }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Ellipse { .. } => ShapeKind::Ellipse,
            Self::Image { .. } => ShapeKind::Image,
        }
    }

    /// Unscaled bounding size of the shape.
    #[must_use]
    pub fn size(&self) -> Size {
        match self {
            Self::Rectangle { width, height, .. } => Size::new(*width, *height),
            Self::Ellipse { rx, ry } => Size::new(rx * 2.0, ry * 2.0),
            Self::Image { natural_width, natural_height, scale, .. } => {
                Size::new(natural_width * scale, natural_height * scale)
            }
        }
    }
}

/// A filled shape primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub geometry: Geometry,
    /// CSS fill color.
    pub fill: String,
}

impl Shape {
    #[must_use]
    pub fn new(geometry: Geometry, fill: impl Into<String>) -> Self {
        Self { geometry, fill: fill.into() }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }
}

/// Text label rendered centered over the shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub text: String,
    /// Whether the label may be moved and edited while detached.
    pub editable: bool,
    /// Whether a local text cursor is currently inside the label.
    pub editing: bool,
}

impl Label {
    /// An empty, editable label.
    #[must_use]
    pub fn empty() -> Self {
        Self { text: String::new(), editable: true, editing: false }
    }

    pub fn enter_editing(&mut self) {
        self.editable = true;
        self.editing = true;
    }

    pub fn exit_editing(&mut self) {
        self.editing = false;
    }
}

impl Default for Label {
    fn default() -> Self {
        Self::empty()
    }
}
