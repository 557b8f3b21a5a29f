//! # linedot-core
//!
//! Core domain types for the line-dot chart visual.
//! Host data-view shapes, settings, formatting strategies and the
//! view-model builder that turns a data view into plottable points.

pub mod columns;
pub mod dataview;
pub mod error;
pub mod format;
pub mod point;
pub mod settings;
pub mod value;
pub mod view_model;

pub use columns::*;
pub use dataview::*;
pub use error::{ChartError, Result};
pub use format::*;
pub use point::*;
pub use settings::*;
pub use value::{PrimitiveValue, ValueType, parse_date};
pub use view_model::*;

use serde::{Deserialize, Serialize};

// ============================================================================
// CORE VALUE TYPES
// ============================================================================

/// Size of the host-allotted drawing area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Grow to at least the given size on each side
    pub fn at_least(self, min_width: f64, min_height: f64) -> Self {
        Self {
            width: self.width.max(min_width),
            height: self.height.max(min_height),
        }
    }
}

// ============================================================================
// COLOR CONSTANTS
// ============================================================================

pub mod colors {
    pub const LINE: &str = "#66d4cc";
    pub const DOT: &str = "#005c55";
    pub const AXIS: &str = "#000000";
    pub const COUNTER: &str = "#000000";
    pub const PLAY_FILL: &str = "#ffffff";
    pub const PLAY_STROKE: &str = "#808080";
    pub const PLAY_INNER: &str = "#000000";

    /// Opacity in `[0, 1]` from a 0-100 percentage
    pub fn percent_to_opacity(percent: f64) -> f64 {
        (percent / 100.0).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_minimum() {
        let vp = Viewport::new(100.0, 400.0).at_least(150.0, 150.0);
        assert_eq!(vp, Viewport::new(150.0, 400.0));
    }

    #[test]
    fn test_percent_to_opacity() {
        assert_eq!(colors::percent_to_opacity(100.0), 1.0);
        assert_eq!(colors::percent_to_opacity(40.0), 0.4);
        assert_eq!(colors::percent_to_opacity(140.0), 1.0);
    }
}
