//! Axis domains, scales and tick labels for a view model

use crate::{
    LinearScale, PointScale, Scale, VisualLayout, chartkit::ellipsis, chartkit::pt_to_px,
    chartkit::time_ticks,
};
use linedot_core::{
    CategoryKind, PrimitiveValue, Settings, ViewModel, Viewport, value::date_from_millis,
    value::display_number,
};

/// Viewport width per forced x tick
pub const FORCED_TICK_SIZE: f64 = 150.0;
pub const X_LABEL_MAX_WIDTH: f64 = 160.0;
/// Inner width divided by this caps the x label width
pub const X_LABEL_TICK_SIZE: f64 = 3.2;
/// Extra room past the last date, as a share of the date extent
pub const DATE_MAX_CUTTER: f64 = 0.05;

// ============================================================================
// TICKS
// ============================================================================

/// What a tick-label callback hands back to the axis renderer
#[derive(Debug, Clone, PartialEq)]
pub enum TickValue {
    Number(f64),
    Text(String),
}

impl TickValue {
    pub fn label(&self) -> String {
        match self {
            Self::Number(n) => display_number(*n),
            Self::Text(s) => s.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Pixel position along the axis
    pub offset: f64,
    pub label: String,
}

/// One rendered axis
#[derive(Debug, Clone, PartialEq)]
pub struct AxisModel {
    pub visible: bool,
    pub ticks: Vec<Tick>,
    pub color: String,
    pub font_px: f64,
}

/// Horizontal scale: continuous for dates and numbers, points for text
#[derive(Debug, Clone, PartialEq)]
pub enum XScale {
    Linear(LinearScale),
    Point(PointScale),
}

impl Scale for XScale {
    fn scale(&self, value: f64) -> f64 {
        match self {
            Self::Linear(s) => s.scale(value),
            Self::Point(s) => s.scale(value),
        }
    }

    fn invert(&self, value: f64) -> f64 {
        match self {
            Self::Linear(s) => s.invert(value),
            Self::Point(s) => s.invert(value),
        }
    }

    fn ticks(&self, count: usize) -> Vec<f64> {
        match self {
            Self::Linear(s) => s.ticks(count),
            Self::Point(s) => s.ticks(count),
        }
    }

    fn range_bounds(&self) -> (f64, f64) {
        match self {
            Self::Linear(s) => s.range_bounds(),
            Self::Point(s) => s.range_bounds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartAxes {
    pub x: AxisModel,
    pub y: AxisModel,
    pub y2: AxisModel,
    pub x_scale: XScale,
    pub y_scale: LinearScale,
    pub x_label_max_width: f64,
    pub layout: VisualLayout,
}

impl ChartAxes {
    /// Pixel position of a point
    pub fn position(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x_scale.scale(x), self.y_scale.scale(y))
    }

    /// Width of the horizontal range in pixels
    pub fn x_span(&self) -> f64 {
        let (start, end) = self.x_scale.range_bounds();
        end - start
    }
}

// ============================================================================
// CALCULATOR
// ============================================================================

pub struct AxisCalculator;

impl AxisCalculator {
    pub fn compute(model: &ViewModel, settings: &Settings, viewport: Viewport) -> ChartAxes {
        let layout = VisualLayout::new(viewport);
        let plot_width = layout.plot_width();
        let plot_height = layout.plot_height();

        let x_font_px = pt_to_px(settings.x_axis.text_size);
        let y_font_px = pt_to_px(settings.y_axis.text_size);
        let x_label_max_width = X_LABEL_MAX_WIDTH.min(layout.inner().width / X_LABEL_TICK_SIZE);
        let forced_ticks = (layout.viewport.width / FORCED_TICK_SIZE).max(0.0) as usize;

        let (x_scale, x_values) = if model.is_ordinal {
            let scale = PointScale::new(model.date_values.len()).range(0.0, plot_width);
            let values = scale.ticks(forced_ticks);
            (XScale::Point(scale), values)
        } else {
            let (min, max) = x_domain(model);
            let scale = LinearScale::new().domain(min, max).range(0.0, plot_width).clamp(true);
            let values = match model.category_kind {
                CategoryKind::DateTime => time_ticks(min, max, forced_ticks),
                _ => scale.nice_ticks(forced_ticks),
            };
            (XScale::Linear(scale), values)
        };

        let x_ticks = x_values
            .into_iter()
            .map(|value| Tick {
                value,
                offset: x_scale.scale(value),
                label: ellipsis(&column_tick_label(model, value).label(), x_font_px, x_label_max_width),
            })
            .collect();

        let (y_min, y_max) = y_domain(model.y_min_value, model.y_max_value);
        let y_scale = LinearScale::new().domain(y_min, y_max).range(plot_height, 0.0);
        let y_values = y_scale.nice_ticks(y_tick_count(plot_height));

        let y_ticks = y_values
            .iter()
            .map(|&value| Tick {
                value,
                offset: y_scale.scale(value),
                label: value_tick_label(model, value).label(),
            })
            .collect();

        let y2_ticks = y_values
            .iter()
            .map(|&value| Tick {
                value,
                offset: y_scale.scale(value),
                label: model.data_value_formatter.format_number(value),
            })
            .collect();

        tracing::debug!(plot_width, plot_height, y_min, y_max, "computed axes");

        ChartAxes {
            x: AxisModel {
                visible: settings.x_axis.show,
                ticks: x_ticks,
                color: settings.x_axis.color.clone(),
                font_px: x_font_px,
            },
            y: AxisModel {
                visible: settings.y_axis.show,
                ticks: y_ticks,
                color: settings.y_axis.color.clone(),
                font_px: y_font_px,
            },
            y2: AxisModel {
                visible: settings.y_axis.show && settings.y_axis.is_duplicated,
                ticks: y2_ticks,
                color: settings.y_axis.color.clone(),
                font_px: y_font_px,
            },
            x_scale,
            y_scale,
            x_label_max_width,
            layout,
        }
    }
}

/// Date extent with a little room past the last point
pub fn x_domain(model: &ViewModel) -> (f64, f64) {
    let (min, max) = model
        .date_values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| (lo.min(d.value), hi.max(d.value)));

    if !min.is_finite() {
        return (0.0, 0.0);
    }

    (min, max + (max - min) * DATE_MAX_CUTTER)
}

/// Value domain; a flat series is widened so the axis has a span
pub fn y_domain(min: f64, max: f64) -> (f64, f64) {
    if max != min {
        return (min, max);
    }

    if min.floor() == min && min != 0.0 {
        (min - 1.0, max + 1.0)
    } else {
        (min - DATE_MAX_CUTTER, max + DATE_MAX_CUTTER)
    }
}

/// Number of y ticks that fit the plot height
pub fn y_tick_count(plot_height: f64) -> usize {
    if plot_height <= 150.0 {
        3
    } else if plot_height <= 300.0 {
        5
    } else {
        8
    }
}

/// Label for a category-axis tick
pub fn column_tick_label(model: &ViewModel, value: f64) -> TickValue {
    let formatter = &model.date_column_formatter;
    match model.category_kind {
        CategoryKind::DateTime => TickValue::Text(formatter.format(&date_from_millis(value).into())),
        CategoryKind::Ordinal => TickValue::Text(ordinal_label(model, value)),
        CategoryKind::Scalar => TickValue::Text(formatter.format_number(value)),
    }
}

/// Label for a value-axis tick; raw numbers are preferred over formatted text
pub fn value_tick_label(model: &ViewModel, value: f64) -> TickValue {
    let formatter = &model.data_value_formatter;
    let value_type = model.values_metadata_column.value_type;

    if value_type.is_some_and(|t| t.is_date_time()) {
        return TickValue::Text(formatter.format(&PrimitiveValue::Date(date_from_millis(value))));
    }
    if value_type == Some(linedot_core::ValueType::Text) {
        return TickValue::Text(ordinal_label(model, value));
    }

    let formatted = formatter.format_number(value);
    if formatted == display_number(value) {
        TickValue::Number(value)
    } else if formatted.parse::<f64>().is_err() {
        TickValue::Text(formatted)
    } else if value.fract() != 0.0 {
        TickValue::Number(value)
    } else {
        TickValue::Text(formatted)
    }
}

fn ordinal_label(model: &ViewModel, value: f64) -> String {
    if value < 0.0 || !value.is_finite() {
        return String::new();
    }
    model
        .date_values
        .get(value.round() as usize)
        .map(|d| d.label.clone())
        .unwrap_or_default()
}
