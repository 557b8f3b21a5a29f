//! Render-ready description of the chart
//!
//! A [`ChartScene`] is composed once per update from the view model, axes
//! and the first animation frame. Later frames only touch the parts that
//! move (dot scales, clip rect, counter text) through
//! [`ChartScene::apply_frame`].

use crate::{
    AnimationFrame, ChartAxes, ClipRect,
    chartkit::{ellipsis, line_path, pt_to_px, translate, translate_and_scale},
};
use linedot_core::{Settings, ViewModel, colors::percent_to_opacity};

pub const COUNTER_RIGHT_MARGIN: f64 = 85.0;
pub const COUNTER_Y: f64 = 30.0;
pub const COUNTER_MAX_WIDTH: f64 = 350.0;
pub const COUNTER_SPAN_PADDING: f64 = 60.0;

pub const PLAY_BUTTON_X: f64 = 40.0;
pub const PLAY_BUTTON_Y: f64 = 20.0;
pub const PLAY_BUTTON_DIAMETER: f64 = 34.0;
/// Triangle shared by the play and stop glyphs
pub const PLAY_GLYPH_PATH: &str = "M0 2l10 6-10 6z";

#[derive(Debug, Clone, PartialEq)]
pub struct DotScene {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub radius: f64,
    pub scale: f64,
    pub fill: String,
    pub stroke: Option<String>,
    pub stroke_width: Option<f64>,
    pub stroke_opacity: Option<f64>,
    pub opacity: f64,
    pub selected: bool,
}

impl DotScene {
    pub fn transform(&self) -> String {
        translate_and_scale(self.x, self.y, self.scale)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineScene {
    pub path: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub clip: Option<ClipRect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterScene {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub color: String,
    pub font_px: f64,
    pub max_width: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayButtonScene {
    pub radius: f64,
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub inner_color: String,
    pub opacity: f64,
    pub circle_visible: bool,
    pub play_visible: bool,
    pub stop_visible: bool,
}

impl PlayButtonScene {
    pub fn from_settings(settings: &Settings) -> Option<Self> {
        let button = &settings.play_button;
        if !button.show {
            return None;
        }

        let animated = settings.misc.is_animated;
        let stopped = settings.misc.is_stopped;

        Some(Self {
            radius: PLAY_BUTTON_DIAMETER / 2.0,
            fill: button.fill.clone(),
            stroke: button.stroke.clone(),
            stroke_width: button.stroke_width,
            inner_color: button.inner_color.clone(),
            opacity: percent_to_opacity(button.opacity),
            circle_visible: animated,
            play_visible: animated && stopped,
            stop_visible: animated && !stopped,
        })
    }

    pub fn transform(&self) -> String {
        translate(PLAY_BUTTON_X, PLAY_BUTTON_Y)
    }
}

/// The parts of a scene that stay fixed for one generation. Frames and
/// selection changes never alter it, so the DOM built from it can persist.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneShape {
    pub generation: u64,
    pub axes: ChartAxes,
    /// Path data and whether it is clipped
    pub line: Option<(String, bool)>,
    pub dots: usize,
    pub counter: bool,
    pub play_button: Option<PlayButtonScene>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartScene {
    pub generation: u64,
    pub axes: ChartAxes,
    pub line: Option<LineScene>,
    pub dots: Vec<DotScene>,
    pub counter: Option<CounterScene>,
    pub play_button: Option<PlayButtonScene>,
}

impl ChartScene {
    /// `opacities` holds the selection-adjusted opacity of every point
    pub fn compose(
        model: &ViewModel,
        settings: &Settings,
        axes: ChartAxes,
        frame: &AnimationFrame,
        opacities: &[f64],
    ) -> Self {
        let positions: Vec<(f64, f64)> = model
            .dot_points
            .iter()
            .map(|p| axes.position(p.date_value.value, p.value))
            .collect();

        let line = frame.line_visible.then(|| LineScene {
            path: line_path(&positions),
            stroke: settings.line.fill.clone(),
            stroke_width: settings.line.line_thickness,
            clip: frame.clip,
        });

        let dot = &settings.dot;
        let dots = if frame.points_visible {
            model
                .dot_points
                .iter()
                .zip(&positions)
                .enumerate()
                .map(|(index, (point, &(x, y)))| DotScene {
                    index,
                    x,
                    y,
                    radius: dot.dot_size_min + point.dot * (dot.dot_size_max - dot.dot_size_min),
                    scale: frame.scales.get(index).copied().unwrap_or(1.0),
                    fill: dot.color.clone(),
                    stroke: dot.stroke.clone(),
                    stroke_width: dot.stroke_width,
                    stroke_opacity: dot.stroke_opacity,
                    opacity: opacities.get(index).copied().unwrap_or(point.opacity),
                    selected: point.selected,
                })
                .collect()
        } else {
            Vec::new()
        };

        let counter = frame.counter.as_ref().map(|text| {
            let font_px = pt_to_px(settings.counter.text_size);
            let max_width = COUNTER_MAX_WIDTH.min(axes.x_span() - COUNTER_SPAN_PADDING);
            CounterScene {
                x: axes.layout.inner().width - COUNTER_RIGHT_MARGIN,
                y: COUNTER_Y,
                text: ellipsis(text, font_px, max_width),
                color: settings.counter.color.clone(),
                font_px,
                max_width,
            }
        });

        Self {
            generation: frame.generation,
            axes,
            line,
            dots,
            counter,
            play_button: PlayButtonScene::from_settings(settings),
        }
    }

    /// Move the animated parts to a later frame of the same generation
    pub fn apply_frame(&mut self, frame: &AnimationFrame) {
        if frame.generation != self.generation {
            tracing::debug!(
                frame = frame.generation,
                scene = self.generation,
                "ignoring frame from another generation"
            );
            return;
        }

        if let Some(line) = self.line.as_mut() {
            line.clip = frame.clip;
        }

        for dot in &mut self.dots {
            dot.scale = frame.scales.get(dot.index).copied().unwrap_or(1.0);
        }

        if let (Some(counter), Some(text)) = (self.counter.as_mut(), frame.counter.as_ref()) {
            counter.text = ellipsis(text, counter.font_px, counter.max_width);
        }
    }

    /// Refresh dot opacities after a selection change
    pub fn apply_opacities(&mut self, opacities: &[f64], selected: &[bool]) {
        for dot in &mut self.dots {
            if let Some(&opacity) = opacities.get(dot.index) {
                dot.opacity = opacity;
            }
            if let Some(&flag) = selected.get(dot.index) {
                dot.selected = flag;
            }
        }
    }

    pub fn shape(&self) -> SceneShape {
        SceneShape {
            generation: self.generation,
            axes: self.axes.clone(),
            line: self.line.as_ref().map(|l| (l.path.clone(), l.clip.is_some())),
            dots: self.dots.len(),
            counter: self.counter.is_some(),
            play_button: self.play_button.clone(),
        }
    }

    /// Index of the dot drawn under a plot-area position, if any
    pub fn dot_at(&self, x: f64, y: f64) -> Option<usize> {
        self.dots
            .iter()
            .rev()
            .find(|d| {
                let r = d.radius * d.scale;
                (d.x - x).powi(2) + (d.y - y).powi(2) <= r * r
            })
            .map(|d| d.index)
    }
}
