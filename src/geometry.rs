//! Geometry helpers: points, sizes, unit transforms, and anchor points.
//!
//! All functions here are pure. A unit's position is its top-left origin;
//! scale stretches it away from that origin and rotation (degrees, clockwise
//! in screen space) pivots around it. Anchors used by the rest of the crate
//! are derived from these three inputs only, so recomputing an anchor never
//! accumulates drift.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::{Deserialize, Serialize};

/// A point in canvas coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy }
    }
}

/// Unscaled width and height of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Placement of a unit on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// Left edge of the unit origin.
    pub left: f64,
    /// Top edge of the unit origin.
    pub top: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Clockwise rotation in degrees around the origin.
    pub angle: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self { left: 0.0, top: 0.0, scale_x: 1.0, scale_y: 1.0, angle: 0.0 }
    }
}

impl Transform {
    /// Unscaled, unrotated placement at `origin`.
    #[must_use]
    pub fn at(origin: Point) -> Self {
        Self { left: origin.x, top: origin.y, ..Self::default() }
    }

    #[must_use]
    pub fn origin(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// Map a point in the unit's local (scaled) frame to canvas coordinates.
    fn project(&self, local_x: f64, local_y: f64) -> Point {
        let (sin, cos) = self.angle.to_radians().sin_cos();
        Point::new(
            self.left + local_x * cos - local_y * sin,
            self.top + local_x * sin + local_y * cos,
        )
    }
}

/// Center point of a unit of `size` placed by `transform`.
#[must_use]
pub fn center(size: Size, transform: &Transform) -> Point {
    transform.project(size.width * transform.scale_x / 2.0, size.height * transform.scale_y / 2.0)
}

/// Upper-right corner of a unit of `size` placed by `transform`.
#[must_use]
pub fn top_right(size: Size, transform: &Transform) -> Point {
    transform.project(size.width * transform.scale_x, 0.0)
}

/// The four corners in order: top-left, top-right, bottom-right, bottom-left.
#[must_use]
pub fn bounding_corners(size: Size, transform: &Transform) -> [Point; 4] {
    let w = size.width * transform.scale_x;
    let h = size.height * transform.scale_y;
    [
        transform.project(0.0, 0.0),
        transform.project(w, 0.0),
        transform.project(w, h),
        transform.project(0.0, h),
    ]
}
