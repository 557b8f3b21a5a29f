//! Playback state machine and time-sampled tween plans
//!
//! A render cycle produces an [`AnimationPlan`]: the clip-path reveal of the
//! line plus a two-phase scale tween per dot (linear grow to an overshoot,
//! then an elastic settle). Plans carry no timers; the caller samples them
//! with [`AnimationPlan::frame_at`] on its own clock. Every cycle runs under a
//! new generation from [`AnimationDirector::begin_cycle`], so stale players
//! can tell they have been superseded.

use crate::{ChartAxes, Scale};
use linedot_core::{MiscSettings, Settings, ViewModel};

pub const MILLIS_PER_SECOND: f64 = 1000.0;
/// Length of each dot tween phase
pub const POINT_TIME_MS: f64 = 300.0;
/// Dot scale at the end of the first phase
pub const POINT_OVERSHOOT_SCALE: f64 = 3.4;
/// Divisor applied to the second-phase delay
pub const POINT_DELAY_COEFFICIENT: f64 = 1000.0;

// ============================================================================
// STATE MACHINE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationState {
    /// Everything drawn in its final state
    Disabled,
    /// Blank chart waiting for play
    Stopped,
    Playing,
}

impl AnimationState {
    pub fn from_flags(is_animated: bool, is_stopped: bool) -> Self {
        match (is_animated, is_stopped) {
            (false, _) => Self::Disabled,
            (true, true) => Self::Stopped,
            (true, false) => Self::Playing,
        }
    }

    pub fn from_settings(misc: &MiscSettings) -> Self {
        Self::from_flags(misc.is_animated, misc.is_stopped)
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

// ============================================================================
// EASING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// Decaying sine overshoot, matching the usual `elasticOut` curve
    ElasticOut { amplitude: f64, period: f64 },
}

impl Easing {
    pub const ELASTIC: Self = Self::ElasticOut {
        amplitude: 1.0,
        period: 0.3,
    };

    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::ElasticOut { amplitude, period } => elastic_out(t, amplitude, period),
        }
    }
}

fn elastic_out(t: f64, amplitude: f64, period: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let a = amplitude.max(1.0);
    let p = period / tau;
    let s = (1.0 / a).asin() * p;
    1.0 - a * tpmt(t) * ((t + s) / p).sin()
}

/// `2^(-10t)` rescaled to hit exactly 1 at 0 and 0 at 1
fn tpmt(t: f64) -> f64 {
    ((-10.0 * t).exp2() - 0.0009765625) * 1.0009775171065494
}

// ============================================================================
// TWEENS
// ============================================================================

/// Clip rect motion for the line reveal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectAnimation {
    pub start_x: f64,
    pub end_x: f64,
    pub end_width: f64,
}

/// Reveal from `first` towards `second`, whichever side of it that is
pub fn rect_animation_settings(first: f64, second: f64) -> RectAnimation {
    if second - first < 0.0 {
        RectAnimation {
            start_x: first,
            end_x: second,
            end_width: first - second,
        }
    } else {
        RectAnimation {
            start_x: first,
            end_x: first,
            end_width: second - first,
        }
    }
}

/// Milliseconds before point `index` starts growing
pub fn point_delay(positions: &[f64], index: usize, duration_s: f64, state: AnimationState) -> f64 {
    if positions.is_empty() || index == 0 || index >= positions.len() || !state.is_playing() {
        return 0.0;
    }

    let first = positions[0];
    let last = positions[positions.len() - 1];
    if last == first {
        return 0.0;
    }

    duration_s * MILLIS_PER_SECOND * (positions[index] - first) / (last - first)
}

/// Timeline of one dot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointTween {
    pub grow_start: f64,
    pub grow_end: f64,
    pub settle_start: f64,
    pub settle_end: f64,
}

impl PointTween {
    pub fn new(delay: f64) -> Self {
        let grow_end = delay + POINT_TIME_MS;
        let settle_start = grow_end + (delay + POINT_TIME_MS) / POINT_DELAY_COEFFICIENT;
        Self {
            grow_start: delay,
            grow_end,
            settle_start,
            settle_end: settle_start + POINT_TIME_MS,
        }
    }

    pub fn scale_at(&self, ms: f64) -> f64 {
        if ms < self.grow_start {
            0.0
        } else if ms < self.grow_end {
            POINT_OVERSHOOT_SCALE * Easing::Linear.apply((ms - self.grow_start) / POINT_TIME_MS)
        } else if ms < self.settle_start {
            POINT_OVERSHOOT_SCALE
        } else if ms < self.settle_end {
            let eased = Easing::ELASTIC.apply((ms - self.settle_start) / POINT_TIME_MS);
            POINT_OVERSHOOT_SCALE + (1.0 - POINT_OVERSHOOT_SCALE) * eased
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f64,
    pub width: f64,
    pub height: f64,
}

/// One sampled instant of a plan
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame {
    pub generation: u64,
    pub line_visible: bool,
    pub points_visible: bool,
    /// `None` draws the line unclipped
    pub clip: Option<ClipRect>,
    pub scales: Vec<f64>,
    /// `None` removes the counter text
    pub counter: Option<String>,
    pub finished: bool,
}

// ============================================================================
// PLAN
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationPlan {
    pub generation: u64,
    pub state: AnimationState,
    pub duration_ms: f64,
    pub rect: Option<RectAnimation>,
    pub clip_height: f64,
    pub points: Vec<PointTween>,
    pub counter_texts: Vec<String>,
}

impl AnimationPlan {
    /// Last instant at which anything still moves
    pub fn end_ms(&self) -> f64 {
        if !self.state.is_playing() {
            return 0.0;
        }
        self.points
            .iter()
            .map(|p| p.settle_end)
            .fold(self.duration_ms, f64::max)
    }

    pub fn frame_at(&self, ms: f64) -> AnimationFrame {
        let count = self.points.len();
        match self.state {
            AnimationState::Disabled => AnimationFrame {
                generation: self.generation,
                line_visible: true,
                points_visible: true,
                clip: None,
                scales: vec![1.0; count],
                counter: None,
                finished: true,
            },
            AnimationState::Stopped => AnimationFrame {
                generation: self.generation,
                line_visible: false,
                points_visible: false,
                clip: None,
                scales: Vec::new(),
                counter: None,
                finished: true,
            },
            AnimationState::Playing => AnimationFrame {
                generation: self.generation,
                line_visible: true,
                points_visible: true,
                clip: self.rect.map(|rect| self.clip_at(rect, ms)),
                scales: self.points.iter().map(|p| p.scale_at(ms)).collect(),
                counter: self.counter_at(ms),
                finished: ms >= self.end_ms(),
            },
        }
    }

    fn clip_at(&self, rect: RectAnimation, ms: f64) -> ClipRect {
        let progress = if self.duration_ms > 0.0 {
            Easing::Linear.apply(ms / self.duration_ms)
        } else {
            1.0
        };
        ClipRect {
            x: rect.start_x + (rect.end_x - rect.start_x) * progress,
            width: rect.end_width * progress,
            height: self.clip_height,
        }
    }

    /// Text of the most recently started point
    fn counter_at(&self, ms: f64) -> Option<String> {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.grow_start <= ms)
            .max_by(|(ia, a), (ib, b)| a.grow_start.total_cmp(&b.grow_start).then(ia.cmp(ib)))
            .and_then(|(i, _)| self.counter_texts.get(i).cloned())
    }
}

// ============================================================================
// DIRECTOR
// ============================================================================

/// Owns the generation counter; one generation is live at a time
#[derive(Debug, Clone, Default)]
pub struct AnimationDirector {
    generation: u64,
}

impl AnimationDirector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Supersede whatever is running and open a new generation
    pub fn begin_cycle(&mut self) -> u64 {
        self.generation += 1;
        tracing::debug!(generation = self.generation, "animation cycle started");
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_live(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn plan(&self, model: &ViewModel, settings: &Settings, axes: &ChartAxes) -> AnimationPlan {
        let state = AnimationState::from_settings(&settings.misc);
        let duration_ms = settings.misc.duration * MILLIS_PER_SECOND;

        let positions: Vec<f64> = model.date_values.iter().map(|d| d.value).collect();

        let rect = match (positions.first(), positions.last()) {
            (Some(&first), Some(&last)) if state.is_playing() => Some(rect_animation_settings(
                axes.x_scale.scale(first),
                axes.x_scale.scale(last),
            )),
            _ => None,
        };

        let points = (0..positions.len())
            .map(|i| PointTween::new(point_delay(&positions, i, settings.misc.duration, state)))
            .collect();

        let counter_texts = if settings.counter.show {
            let title = settings.counter.title_text();
            (0..positions.len())
                .map(|i| format!("{} {}", title, model.counter_text(i)))
                .collect()
        } else {
            vec![String::new(); positions.len()]
        };

        AnimationPlan {
            generation: self.generation,
            state,
            duration_ms,
            rect,
            clip_height: axes.layout.inner().height,
            points,
            counter_texts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AxisCalculator;
    use linedot_core::{
        CategoryIdFactory, ColumnMetadata, DataColumn, DataView, DefaultFormatterFactory,
        PrimitiveValue, Role, ViewModelBuilder, Viewport,
    };
    use proptest::prelude::*;

    fn playing_settings() -> Settings {
        let mut settings = Settings::default();
        settings.misc.is_stopped = false;
        settings.misc.duration = 1.0;
        settings.counter.counter_title = "Step".into();
        settings
    }

    fn plan_for(settings: &Settings, positions: &[f64]) -> AnimationPlan {
        let view = DataView::categorical(
            vec![DataColumn::new(
                ColumnMetadata::new("X", Role::Date),
                positions.iter().copied().map(PrimitiveValue::from).collect(),
            )],
            vec![DataColumn::new(
                ColumnMetadata::new("Y", Role::Values),
                positions.iter().map(|p| PrimitiveValue::from(p * 2.0)).collect(),
            )],
        );
        let model = ViewModelBuilder::build(&view, settings, &CategoryIdFactory, &DefaultFormatterFactory)
            .unwrap()
            .unwrap();
        let axes = AxisCalculator::compute(&model, settings, Viewport::new(600.0, 400.0));
        let mut director = AnimationDirector::new();
        director.begin_cycle();
        director.plan(&model, settings, &axes)
    }

    #[test]
    fn test_state_from_flags() {
        assert_eq!(AnimationState::from_flags(false, true), AnimationState::Disabled);
        assert_eq!(AnimationState::from_flags(true, true), AnimationState::Stopped);
        assert_eq!(AnimationState::from_flags(true, false), AnimationState::Playing);
    }

    #[test]
    fn test_rect_animation_settings() {
        let forward = rect_animation_settings(10.0, 100.0);
        assert_eq!((forward.start_x, forward.end_x, forward.end_width), (10.0, 10.0, 90.0));

        let reverse = rect_animation_settings(100.0, 10.0);
        assert_eq!((reverse.start_x, reverse.end_x, reverse.end_width), (100.0, 10.0, 90.0));
    }

    #[test]
    fn test_point_delay() {
        let positions = [0.0, 5.0, 10.0];
        let playing = AnimationState::Playing;
        assert_eq!(point_delay(&positions, 0, 20.0, playing), 0.0);
        assert_eq!(point_delay(&positions, 1, 20.0, playing), 10_000.0);
        assert_eq!(point_delay(&positions, 2, 20.0, playing), 20_000.0);
        assert_eq!(point_delay(&positions, 2, 20.0, AnimationState::Stopped), 0.0);
        assert_eq!(point_delay(&positions, 2, 20.0, AnimationState::Disabled), 0.0);
        assert_eq!(point_delay(&[3.0, 3.0], 1, 20.0, playing), 0.0);
        assert_eq!(point_delay(&[], 0, 20.0, playing), 0.0);
    }

    #[test]
    fn test_elastic_endpoints() {
        assert!(Easing::ELASTIC.apply(0.0).abs() < 1e-9);
        assert!((Easing::ELASTIC.apply(1.0) - 1.0).abs() < 1e-9);
        assert!(Easing::ELASTIC.apply(0.2) > 1.0);
    }

    #[test]
    fn test_point_tween_phases() {
        let tween = PointTween::new(1000.0);
        assert_eq!(tween.scale_at(500.0), 0.0);
        assert_eq!(tween.scale_at(1000.0), 0.0);
        assert!((tween.scale_at(1150.0) - 1.7).abs() < 1e-9);
        assert_eq!(tween.grow_end, 1300.0);
        assert!((tween.settle_start - 1301.3).abs() < 1e-9);
        assert_eq!(tween.scale_at(1300.5), POINT_OVERSHOOT_SCALE);
        assert_eq!(tween.scale_at(5000.0), 1.0);
    }

    #[test]
    fn test_playing_plan_reveals_and_finishes() {
        let plan = plan_for(&playing_settings(), &[1.0, 2.0, 3.0]);
        assert_eq!(plan.state, AnimationState::Playing);

        let start = plan.frame_at(0.0);
        let clip = start.clip.unwrap();
        assert_eq!(clip.width, 0.0);
        assert!(start.scales.iter().all(|&s| s == 0.0));
        assert_eq!(start.counter.as_deref(), Some("Step 1"));
        assert!(!start.finished);

        let middle = plan.frame_at(600.0);
        assert_eq!(middle.counter.as_deref(), Some("Step 2"));

        let end = plan.frame_at(plan.end_ms());
        assert!(end.finished);
        assert!(end.scales.iter().all(|&s| s == 1.0));
        assert_eq!(end.counter.as_deref(), Some("Step 3"));
        assert!(end.clip.unwrap().width > 0.0);
    }

    #[test]
    fn test_disabled_plan_draws_final_state() {
        let mut settings = playing_settings();
        settings.misc.is_animated = false;
        let frame = plan_for(&settings, &[1.0, 2.0]).frame_at(0.0);
        assert!(frame.clip.is_none());
        assert_eq!(frame.scales, vec![1.0, 1.0]);
        assert!(frame.counter.is_none());
        assert!(frame.finished);
    }

    #[test]
    fn test_stopped_plan_is_blank() {
        let mut settings = playing_settings();
        settings.misc.is_stopped = true;
        let frame = plan_for(&settings, &[1.0, 2.0]).frame_at(0.0);
        assert!(!frame.line_visible);
        assert!(!frame.points_visible);
        assert!(frame.scales.is_empty());
        assert!(frame.counter.is_none());
    }

    #[test]
    fn test_hidden_counter_is_empty_text() {
        let mut settings = playing_settings();
        settings.counter.show = false;
        let frame = plan_for(&settings, &[1.0, 2.0]).frame_at(0.0);
        assert_eq!(frame.counter.as_deref(), Some(""));
    }

    #[test]
    fn test_generations_are_monotonic() {
        let mut director = AnimationDirector::new();
        let first = director.begin_cycle();
        let second = director.begin_cycle();
        assert!(second > first);
        assert!(director.is_live(second));
        assert!(!director.is_live(first));
    }

    proptest! {
        #[test]
        fn prop_rect_covers_span(a in -1000.0f64..1000.0, b in -1000.0f64..1000.0) {
            let rect = rect_animation_settings(a, b);
            prop_assert!(rect.end_width >= 0.0);
            prop_assert_eq!(rect.start_x, a);
            prop_assert!((rect.end_x - a.min(b)).abs() < 1e-9);
            prop_assert!((rect.end_x + rect.end_width - a.max(b)).abs() < 1e-9);
        }
    }
}
