//! Pointer input: the two-press coincidence detector and node notifications.
//!
//! The canvas does not report double presses on grouped composite units, so
//! a double press is detected here: the first press arms the detector for
//! [`DOUBLE_PRESS_WINDOW_MS`], and a second press inside that window fires it
//! and disarms it. An armed detector expires on its own; nothing cancels it.
//!
//! Timestamps are milliseconds on any monotonic clock chosen by the caller.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::consts::DOUBLE_PRESS_WINDOW_MS;

/// Notifications the canvas raises on a grouped node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeEvent {
    Selected,
    /// A move, scale, or rotate gesture finished.
    Modified,
    Scaling,
    Moving,
    Rotating,
    Removed,
}

/// Detects two presses on the same target within a short window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressDetector {
    armed_at: Option<i64>,
    window_ms: i64,
}

impl Default for PressDetector {
    fn default() -> Self {
        Self::new(DOUBLE_PRESS_WINDOW_MS)
    }
}

impl PressDetector {
    #[must_use]
    pub fn new(window_ms: i64) -> Self {
        Self { armed_at: None, window_ms }
    }

    /// Register a press at `at_ms`. Returns true when it completes a double press.
    pub fn press(&mut self, at_ms: i64) -> bool {
        if self.is_armed(at_ms) {
            self.armed_at = None;
            return true;
        }
        self.armed_at = Some(at_ms);
        false
    }

    /// Whether a press at `now_ms` would fire.
    #[must_use]
    pub fn is_armed(&self, now_ms: i64) -> bool {
        match self.armed_at {
            Some(armed_at) => {
                let elapsed = now_ms - armed_at;
                (0..self.window_ms).contains(&elapsed)
            }
            None => false,
        }
    }

    #[must_use]
    pub fn window_ms(&self) -> i64 {
        self.window_ms
    }
}
