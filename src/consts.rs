//! Shared constants for node geometry, gestures and styling.

use crate::geometry::Point;

// ── Node defaults ───────────────────────────────────────────────

/// Where new nodes land when no position is given.
pub const DEFAULT_ORIGIN: Point = Point::new(100.0, 100.0);

/// Default rectangle width in canvas units.
pub const RECT_WIDTH: f64 = 200.0;

/// Default rectangle height in canvas units.
pub const RECT_HEIGHT: f64 = 100.0;

/// Corner radius applied to rectangles.
pub const RECT_CORNER_RADIUS: f64 = 10.0;

/// Default ellipse horizontal radius.
pub const ELLIPSE_RX: f64 = 100.0;

/// Default ellipse vertical radius.
pub const ELLIPSE_RY: f64 = 50.0;

/// Images are scaled so their rendered width equals this value.
pub const IMAGE_TARGET_WIDTH: f64 = 300.0;

/// Natural size assumed for images whose pixels are not known yet.
pub const IMAGE_FALLBACK_WIDTH: f64 = 300.0;
pub const IMAGE_FALLBACK_HEIGHT: f64 = 200.0;

// ── Gestures ────────────────────────────────────────────────────

/// Two presses closer together than this count as a double press.
pub const DOUBLE_PRESS_WINDOW_MS: i64 = 500;

/// Picks needed in connect mode before a line is drawn.
pub const SELECTION_CAPACITY: usize = 2;

// ── Delete affordance ───────────────────────────────────────────

/// Offset from the node's top-right corner to the affordance's top-left.
pub const AFFORDANCE_OFFSET_PX: f64 = 10.0;

/// Side length of the square delete control.
pub const AFFORDANCE_SIZE_PX: f64 = 20.0;

// ── Lines and background ────────────────────────────────────────

pub const LINE_STROKE: &str = "black";
pub const LINE_STROKE_WIDTH: f64 = 2.0;
pub const LINE_OPACITY: f64 = 0.6;

/// Background asset loaded after a clear.
pub const DEFAULT_BACKGROUND: &str = "assets";
