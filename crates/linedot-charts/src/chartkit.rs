//! # chartkit
//!
//! Core chart primitives: scales, path builders, tick generators and SVG
//! helpers. Implements Strategy pattern for flexible scale and path behaviors.

use chrono::{DateTime, Datelike, Months, TimeZone, Utc};
use std::fmt::Write;

// ============================================================================
// STRATEGY PATTERN: Scale Trait
// ============================================================================

/// Strategy trait for scales (maps domain values to range values)
pub trait Scale: Send + Sync {
    /// Scale a value from domain to range
    fn scale(&self, value: f64) -> f64;

    /// Inverse scale (range to domain)
    fn invert(&self, value: f64) -> f64;

    /// Generate tick values
    fn ticks(&self, count: usize) -> Vec<f64>;

    /// Output range as `(start, end)`
    fn range_bounds(&self) -> (f64, f64);
}

// ============================================================================
// LINEAR SCALE
// ============================================================================

/// Linear scale (D3-style continuous scale)
#[derive(Debug, Clone, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
    clamp: bool,
}

impl LinearScale {
    pub fn new() -> Self {
        Self {
            domain: (0.0, 1.0),
            range: (0.0, 1.0),
            clamp: false,
        }
    }

    pub fn domain(mut self, min: f64, max: f64) -> Self {
        self.domain = (min, max);
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }

    pub fn clamp(mut self, clamp: bool) -> Self {
        self.clamp = clamp;
        self
    }

    /// Generate "nice" tick values (rounded to clean numbers)
    pub fn nice_ticks(&self, count: usize) -> Vec<f64> {
        let (min, max) = self.domain;
        let range = max - min;

        if range == 0.0 || count == 0 || !range.is_finite() {
            return vec![min];
        }

        let rough_step = range / count as f64;
        let magnitude = 10.0_f64.powf(rough_step.log10().floor());
        let residual = rough_step / magnitude;

        let nice_step = if residual <= 1.0 {
            magnitude
        } else if residual <= 2.0 {
            2.0 * magnitude
        } else if residual <= 5.0 {
            5.0 * magnitude
        } else {
            10.0 * magnitude
        };

        // Decimal places needed to print the step without float noise
        let precision = (-nice_step.log10().floor()).max(0.0) as i32;
        let first = (min / nice_step).ceil() as i64;
        let last = (max / nice_step).floor() as i64;

        (first..=last)
            .map(|k| round_to(k as f64 * nice_step, precision))
            .collect()
    }
}

impl Default for LinearScale {
    fn default() -> Self {
        Self::new()
    }
}

impl Scale for LinearScale {
    fn scale(&self, value: f64) -> f64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if (d_max - d_min).abs() < f64::EPSILON {
            return (r_min + r_max) / 2.0;
        }

        let mut normalized = (value - d_min) / (d_max - d_min);

        if self.clamp {
            normalized = normalized.clamp(0.0, 1.0);
        }

        r_min + normalized * (r_max - r_min)
    }

    fn invert(&self, value: f64) -> f64 {
        let (d_min, d_max) = self.domain;
        let (r_min, r_max) = self.range;

        if (r_max - r_min).abs() < f64::EPSILON {
            return (d_min + d_max) / 2.0;
        }

        let normalized = (value - r_min) / (r_max - r_min);
        d_min + normalized * (d_max - d_min)
    }

    fn ticks(&self, count: usize) -> Vec<f64> {
        self.nice_ticks(count)
    }

    fn range_bounds(&self) -> (f64, f64) {
        self.range
    }
}

fn round_to(value: f64, precision: i32) -> f64 {
    let factor = 10.0_f64.powi(precision);
    (value * factor).round() / factor
}

// ============================================================================
// POINT SCALE (ordinal categories)
// ============================================================================

/// Evenly spaced positions for ordinal rows; a single row sits in the middle
#[derive(Debug, Clone, PartialEq)]
pub struct PointScale {
    count: usize,
    range: (f64, f64),
}

impl PointScale {
    pub fn new(count: usize) -> Self {
        Self {
            count,
            range: (0.0, 1.0),
        }
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.range = (min, max);
        self
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Distance between neighbouring positions
    pub fn step(&self) -> f64 {
        let (r_min, r_max) = self.range;
        if self.count > 1 {
            (r_max - r_min) / (self.count - 1) as f64
        } else {
            0.0
        }
    }
}

impl Scale for PointScale {
    fn scale(&self, index: f64) -> f64 {
        let (r_min, r_max) = self.range;
        if self.count <= 1 {
            return (r_min + r_max) / 2.0;
        }
        r_min + index * self.step()
    }

    fn invert(&self, value: f64) -> f64 {
        let step = self.step();
        if step == 0.0 {
            return 0.0;
        }
        ((value - self.range.0) / step)
            .round()
            .clamp(0.0, self.count.saturating_sub(1) as f64)
    }

    fn ticks(&self, _count: usize) -> Vec<f64> {
        (0..self.count).map(|i| i as f64).collect()
    }

    fn range_bounds(&self) -> (f64, f64) {
        self.range
    }
}

// ============================================================================
// TIME TICKS
// ============================================================================

const SECOND: f64 = 1_000.0;
const MINUTE: f64 = 60.0 * SECOND;
const HOUR: f64 = 60.0 * MINUTE;
const DAY: f64 = 24.0 * HOUR;
const WEEK: f64 = 7.0 * DAY;
const MONTH: f64 = 30.0 * DAY;
const YEAR: f64 = 365.0 * DAY;

/// Calendar interval between date-time ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeInterval {
    Seconds(u32),
    Minutes(u32),
    Hours(u32),
    Days(u32),
    Weeks(u32),
    Months(u32),
    Years(u32),
}

const TIME_INTERVALS: &[TimeInterval] = &[
    TimeInterval::Seconds(1),
    TimeInterval::Seconds(5),
    TimeInterval::Seconds(15),
    TimeInterval::Seconds(30),
    TimeInterval::Minutes(1),
    TimeInterval::Minutes(5),
    TimeInterval::Minutes(15),
    TimeInterval::Minutes(30),
    TimeInterval::Hours(1),
    TimeInterval::Hours(3),
    TimeInterval::Hours(6),
    TimeInterval::Hours(12),
    TimeInterval::Days(1),
    TimeInterval::Days(2),
    TimeInterval::Weeks(1),
    TimeInterval::Months(1),
    TimeInterval::Months(3),
    TimeInterval::Years(1),
];

impl TimeInterval {
    /// Nominal length in milliseconds
    pub fn approx_millis(&self) -> f64 {
        match *self {
            Self::Seconds(n) => n as f64 * SECOND,
            Self::Minutes(n) => n as f64 * MINUTE,
            Self::Hours(n) => n as f64 * HOUR,
            Self::Days(n) => n as f64 * DAY,
            Self::Weeks(n) => n as f64 * WEEK,
            Self::Months(n) => n as f64 * MONTH,
            Self::Years(n) => n as f64 * YEAR,
        }
    }

    /// The interval whose length is closest to `span / count`
    pub fn for_span(span_ms: f64, count: usize) -> Self {
        let target = span_ms / count.max(1) as f64;

        if target > YEAR {
            let years = nice_number(target / YEAR).max(1.0) as u32;
            return Self::Years(years);
        }

        TIME_INTERVALS
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (a.approx_millis() / target).ln().abs();
                let db = (b.approx_millis() / target).ln().abs();
                da.total_cmp(&db)
            })
            .unwrap_or(Self::Days(1))
    }
}

fn nice_number(value: f64) -> f64 {
    let magnitude = 10.0_f64.powf(value.log10().floor());
    let residual = value / magnitude;
    let nice = if residual <= 1.0 {
        1.0
    } else if residual <= 2.0 {
        2.0
    } else if residual <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

/// Calendar-aligned tick positions (epoch millis) within `[min, max]`
pub fn time_ticks(min: f64, max: f64, count: usize) -> Vec<f64> {
    if !(max > min) || count == 0 {
        return vec![min];
    }

    match TimeInterval::for_span(max - min, count) {
        TimeInterval::Months(n) => calendar_ticks(min, max, |d| month_floor(d, n), Months::new(n)),
        TimeInterval::Years(n) => calendar_ticks(
            min,
            max,
            |d| year_floor(d, n),
            Months::new(n.saturating_mul(12)),
        ),
        TimeInterval::Weeks(n) => {
            // 1970-01-04 was the first Sunday after the epoch
            fixed_ticks(min, max, n as f64 * WEEK, 3.0 * DAY, count)
        }
        fixed => fixed_ticks(min, max, fixed.approx_millis(), 0.0, count),
    }
}

/// Stops once the step is lost to float precision or the count runs far
/// past what was asked for
fn fixed_ticks(min: f64, max: f64, step: f64, offset: f64, count: usize) -> Vec<f64> {
    let limit = count.saturating_mul(4).saturating_add(2);
    let first = ((min - offset) / step).ceil() * step + offset;

    let mut ticks = Vec::new();
    let mut tick = first;
    while tick <= max {
        if ticks.len() >= limit {
            return vec![min];
        }
        ticks.push(tick);
        let next = tick + step;
        if next <= tick {
            break;
        }
        tick = next;
    }
    ticks
}

fn calendar_ticks(
    min: f64,
    max: f64,
    floor: impl Fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
    step: Months,
) -> Vec<f64> {
    let Some(start) = Utc.timestamp_millis_opt(min as i64).single().and_then(&floor) else {
        return vec![min];
    };

    let mut ticks = Vec::new();
    let mut tick = Some(start);
    while let Some(current) = tick {
        let ms = current.timestamp_millis() as f64;
        if ms > max {
            break;
        }
        if ms >= min {
            ticks.push(ms);
        }
        tick = current.checked_add_months(step);
    }
    ticks
}

fn month_floor(date: DateTime<Utc>, every: u32) -> Option<DateTime<Utc>> {
    let month0 = date.month0() - date.month0() % every.max(1);
    Utc.with_ymd_and_hms(date.year(), month0 + 1, 1, 0, 0, 0).single()
}

fn year_floor(date: DateTime<Utc>, every: u32) -> Option<DateTime<Utc>> {
    let every = every.clamp(1, i32::MAX as u32) as i32;
    let year = date.year() - date.year().rem_euclid(every);
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single()
}

// ============================================================================
// STRATEGY PATTERN: Path Generator Trait
// ============================================================================

/// Strategy trait for path generation
pub trait PathGenerator: Send + Sync {
    fn generate(&self, points: &[(f64, f64)]) -> String;
}

/// Line path generator
#[derive(Debug, Clone, Default)]
pub struct LinePath;

impl PathGenerator for LinePath {
    fn generate(&self, points: &[(f64, f64)]) -> String {
        let Some((&(x, y), rest)) = points.split_first() else {
            return String::new();
        };

        rest.iter()
            .fold(PathBuilder::new().move_to(x, y), |path, &(x, y)| path.line_to(x, y))
            .build()
    }
}

/// Generate line path (non-closed)
pub fn line_path(points: &[(f64, f64)]) -> String {
    LinePath.generate(points)
}

// ============================================================================
// PATH BUILDER (fluent API)
// ============================================================================

/// SVG path builder with fluent API
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    commands: String,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self {
            commands: String::with_capacity(256),
        }
    }

    pub fn move_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(self.commands, "M{:.2},{:.2}", x, y);
        self
    }

    pub fn line_to(mut self, x: f64, y: f64) -> Self {
        let _ = write!(self.commands, "L{:.2},{:.2}", x, y);
        self
    }

    pub fn close(mut self) -> Self {
        self.commands.push('Z');
        self
    }

    pub fn build(self) -> String {
        self.commands
    }
}

// ============================================================================
// SVG HELPERS
// ============================================================================

pub fn translate(x: f64, y: f64) -> String {
    format!("translate({}, {})", x, y)
}

pub fn translate_and_scale(x: f64, y: f64, scale: f64) -> String {
    format!("translate({}, {}) scale({})", x, y, scale)
}

/// Typographic points to CSS pixels
pub fn pt_to_px(points: f64) -> f64 {
    points * 4.0 / 3.0
}

pub fn px(value: f64) -> String {
    format!("{}px", value)
}

// ============================================================================
// TEXT FITTING
// ============================================================================

const CHAR_WIDTH_RATIO: f64 = 0.6;
const ELLIPSIS: &str = "...";

/// Rough rendered width of a label
pub fn estimate_text_width(text: &str, font_px: f64) -> f64 {
    text.chars().count() as f64 * font_px * CHAR_WIDTH_RATIO
}

/// Shorten `text` with a trailing ellipsis until it fits `max_width`
pub fn ellipsis(text: &str, font_px: f64, max_width: f64) -> String {
    if estimate_text_width(text, font_px) <= max_width {
        return text.to_string();
    }

    let budget = max_width - estimate_text_width(ELLIPSIS, font_px);
    let keep = if font_px > 0.0 && budget > 0.0 {
        (budget / (font_px * CHAR_WIDTH_RATIO)).floor() as usize
    } else {
        0
    };

    let mut fitted: String = text.chars().take(keep).collect();
    fitted.push_str(ELLIPSIS);
    fitted
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scale() {
        let scale = LinearScale::new().domain(0.0, 100.0).range(0.0, 500.0);

        assert_eq!(scale.scale(0.0), 0.0);
        assert_eq!(scale.scale(50.0), 250.0);
        assert_eq!(scale.scale(100.0), 500.0);
    }

    #[test]
    fn test_linear_scale_invert() {
        let scale = LinearScale::new().domain(0.0, 100.0).range(0.0, 500.0);

        assert_eq!(scale.invert(250.0), 50.0);
    }

    #[test]
    fn test_linear_scale_clamp() {
        let scale = LinearScale::new().domain(0.0, 10.0).range(0.0, 100.0).clamp(true);
        assert_eq!(scale.scale(20.0), 100.0);
        assert_eq!(scale.scale(-5.0), 0.0);
    }

    #[test]
    fn test_inverted_range() {
        let scale = LinearScale::new().domain(0.0, 10.0).range(200.0, 0.0);
        assert_eq!(scale.scale(0.0), 200.0);
        assert_eq!(scale.scale(10.0), 0.0);
    }

    #[test]
    fn test_nice_ticks_have_no_float_noise() {
        let ticks = LinearScale::new().domain(0.0, 1.0).nice_ticks(5);
        assert!(ticks.contains(&0.6));
        assert_eq!(ticks.first(), Some(&0.0));
        assert_eq!(ticks.last(), Some(&1.0));
    }

    #[test]
    fn test_nice_ticks_stay_in_domain() {
        let ticks = LinearScale::new().domain(4.0, 6.0).nice_ticks(3);
        assert!(ticks.iter().all(|t| (4.0..=6.0).contains(t)));
        assert!(!ticks.is_empty());
    }

    #[test]
    fn test_point_scale() {
        let scale = PointScale::new(4).range(0.0, 300.0);
        assert_eq!(scale.scale(0.0), 0.0);
        assert_eq!(scale.scale(3.0), 300.0);
        assert_eq!(scale.step(), 100.0);
        assert_eq!(scale.ticks(10).len(), 4);
        assert_eq!(scale.invert(190.0), 2.0);
    }

    #[test]
    fn test_point_scale_single_row_is_centred() {
        let scale = PointScale::new(1).range(0.0, 300.0);
        assert_eq!(scale.scale(0.0), 150.0);
    }

    #[test]
    fn test_path_builder() {
        let path = PathBuilder::new()
            .move_to(0.0, 0.0)
            .line_to(100.0, 100.0)
            .close()
            .build();

        assert!(path.contains("M0.00,0.00"));
        assert!(path.contains("L100.00,100.00"));
        assert!(path.contains("Z"));
    }

    #[test]
    fn test_line_path_generator() {
        let path = LinePath.generate(&[(0.0, 0.0), (50.0, 50.0), (100.0, 0.0)]);

        assert!(path.starts_with("M0.00,0.00"));
        assert!(path.contains("L50.00,50.00"));
        assert_eq!(line_path(&[]), "");
    }

    #[test]
    fn test_time_interval_choice() {
        assert_eq!(TimeInterval::for_span(10.0 * DAY, 10), TimeInterval::Days(1));
        assert_eq!(TimeInterval::for_span(12.0 * MONTH, 4), TimeInterval::Months(3));
        assert_eq!(TimeInterval::for_span(20.0 * YEAR, 2), TimeInterval::Years(10));
    }

    #[test]
    fn test_monthly_ticks_fall_on_first_of_month() {
        let start = Utc.with_ymd_and_hms(2016, 1, 15, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2016, 7, 15, 0, 0, 0).unwrap();
        let ticks = time_ticks(start.timestamp_millis() as f64, end.timestamp_millis() as f64, 6);

        assert_eq!(ticks.len(), 6);
        for tick in ticks {
            let date = Utc.timestamp_millis_opt(tick as i64).unwrap();
            assert_eq!(date.day(), 1);
        }
    }

    #[test]
    fn test_daily_ticks_fall_on_midnight() {
        let start = Utc.with_ymd_and_hms(2016, 3, 1, 6, 0, 0).unwrap().timestamp_millis() as f64;
        let ticks = time_ticks(start, start + 5.0 * DAY, 5);
        assert_eq!(ticks.len(), 5);
        assert!(ticks.iter().all(|t| t % DAY == 0.0));
    }

    #[test]
    fn test_ticks_terminate_when_step_is_below_precision() {
        let ticks = time_ticks(1e25, 1e25 + 4e9, 5);
        assert!(ticks.len() <= 22);
        assert!(ticks.iter().all(|t| t.is_finite()));
    }

    #[test]
    fn test_huge_year_span_does_not_overflow() {
        let ticks = time_ticks(0.0, 1e300, 2);
        assert!(ticks.len() <= 1);
    }

    #[test]
    fn test_svg_helpers() {
        assert_eq!(translate_and_scale(10.0, 20.0, 3.4), "translate(10, 20) scale(3.4)");
        assert_eq!(pt_to_px(9.0), 12.0);
        assert_eq!(px(12.0), "12px");
    }

    #[test]
    fn test_ellipsis() {
        assert_eq!(ellipsis("Alpha", 10.0, 100.0), "Alpha");
        let cut = ellipsis("A very long category label", 10.0, 60.0);
        assert!(cut.ends_with("..."));
        assert!(estimate_text_width(&cut, 10.0) <= 60.0);
    }
}
