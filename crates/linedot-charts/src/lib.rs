//! # linedot-charts
//!
//! D3-style SVG charting for the line-dot visual, built with Leptos.
//!
//! ## Architecture
//!
//! Uses Strategy pattern for:
//! - Scale computation (linear, point)
//! - Path generation (line)
//! - Axis tick labelling
//!
//! ## Modules
//!
//! - `chartkit` - Core primitives: scales, paths, SVG helpers, text fitting
//! - `axis` - Axis domains, ticks and labels for a view model
//! - `animation` - Playback state machine and time-sampled tween plans
//! - `scene` - Render-ready description of one frame
//! - `line_dot` - The Leptos SVG component drawing a scene

pub mod animation;
pub mod axis;
pub mod chartkit;
pub mod line_dot;
pub mod scene;

pub use animation::*;
pub use axis::*;
pub use chartkit::*;
pub use line_dot::*;
pub use scene::*;

// Re-export colors from linedot-core for convenience
pub use linedot_core::colors;

use linedot_core::Viewport;

/// Smallest viewport the chart lays itself out in
pub const MIN_VIEWPORT: f64 = 150.0;
/// Space reserved below and right of the plot for the legend
pub const LEGEND_SIZE: f64 = 50.0;
/// Space reserved for the vertical axes
pub const AXIS_SIZE: f64 = 30.0;

/// Chart margin configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartMargin {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl ChartMargin {
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self { top, right, bottom, left }
    }

    /// Line-dot chart margins (extra room on the right for the second axis)
    pub const fn line_dot() -> Self {
        Self::new(10.0, 30.0, 10.0, 10.0)
    }
}

impl Default for ChartMargin {
    fn default() -> Self {
        Self::line_dot()
    }
}

/// Chart dimensions with margin handling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartDimensions {
    pub width: f64,
    pub height: f64,
    pub margin: ChartMargin,
}

impl ChartDimensions {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            margin: ChartMargin::default(),
        }
    }

    /// Inner width (excluding margins)
    pub fn inner_width(&self) -> f64 {
        (self.width - self.margin.left - self.margin.right).max(0.0)
    }

    /// Inner height (excluding margins)
    pub fn inner_height(&self) -> f64 {
        (self.height - self.margin.top - self.margin.bottom).max(0.0)
    }

    /// SVG transform for inner chart area
    pub fn inner_transform(&self) -> String {
        format!("translate({}, {})", self.margin.left, self.margin.top)
    }

    /// ViewBox string for SVG
    pub fn viewbox(&self) -> String {
        format!("0 0 {} {}", self.width, self.height)
    }
}

/// Outer and inner viewports for one render cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualLayout {
    pub viewport: Viewport,
    pub dims: ChartDimensions,
}

impl VisualLayout {
    pub fn new(viewport: Viewport) -> Self {
        let viewport = viewport.at_least(MIN_VIEWPORT, MIN_VIEWPORT);
        Self {
            viewport,
            dims: ChartDimensions::new(viewport.width, viewport.height),
        }
    }

    pub fn inner(&self) -> Viewport {
        Viewport::new(self.dims.inner_width(), self.dims.inner_height())
    }

    /// Width available to the plot once the legend and axis gutters are taken
    pub fn plot_width(&self) -> f64 {
        (self.dims.inner_width() - LEGEND_SIZE - AXIS_SIZE).max(0.0)
    }

    pub fn plot_height(&self) -> f64 {
        (self.dims.inner_height() - LEGEND_SIZE).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_enforces_minimum_viewport() {
        let layout = VisualLayout::new(Viewport::new(40.0, 90.0));
        assert_eq!(layout.viewport, Viewport::new(150.0, 150.0));
        assert_eq!(layout.inner(), Viewport::new(110.0, 130.0));
        assert_eq!(layout.plot_width(), 30.0);
        assert_eq!(layout.plot_height(), 80.0);
    }

    #[test]
    fn test_plot_area() {
        let layout = VisualLayout::new(Viewport::new(800.0, 400.0));
        assert_eq!(layout.plot_width(), 760.0 - 80.0);
        assert_eq!(layout.plot_height(), 380.0 - 50.0);
        assert_eq!(layout.dims.inner_transform(), "translate(10, 10)");
    }
}
