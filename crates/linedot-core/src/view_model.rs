//! View-model derivation
//!
//! Turns a host data view into the per-update plotting snapshot: one
//! [`LineDotPoint`] per category row, the value extent, formatters and the
//! counter classification.

use crate::{
    ChartError, ColumnMetadata, DateValue, FormatterFactory, LineDotPoint, PrimitiveValue,
    ResolvedColumns, Result, SelectionIdFactory, Settings, SharedFormatter, ValueType,
    categorical_values, value::date_from_millis,
};

/// Extra headroom above the largest value, leaving room for the counter
pub const COUNTER_SPACE: f64 = 0.10;

pub const DEFAULT_VALUE_FORMAT: &str = "#";

/// How category cells map onto the x axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    /// Evenly spaced, one position per row
    Ordinal,
    /// Epoch milliseconds on a time axis
    DateTime,
    /// Raw numbers on a linear axis
    Scalar,
}

impl CategoryKind {
    /// Declared type wins; otherwise infer from the first non-null cell
    pub fn classify(declared: Option<ValueType>, cells: &[PrimitiveValue]) -> Self {
        let value_type = declared.or_else(|| cells.iter().find_map(ValueType::infer));

        match value_type {
            Some(ValueType::DateTime) => Self::DateTime,
            Some(ValueType::Numeric | ValueType::Integer) => Self::Scalar,
            _ => Self::Ordinal,
        }
    }

    /// Axis position of a category cell
    fn position(&self, cell: &PrimitiveValue, row: usize) -> Result<f64> {
        match self {
            Self::Ordinal => Ok(row as f64),
            Self::DateTime => cell
                .as_millis_or_number()
                .ok_or(ChartError::InvalidCategory { row }),
            Self::Scalar => cell.as_f64().ok_or(ChartError::InvalidCategory { row }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnNames {
    pub category: String,
    pub values: String,
}

/// Immutable snapshot of one update
#[derive(Clone)]
pub struct ViewModel {
    pub column_names: ColumnNames,
    pub dot_points: Vec<LineDotPoint>,
    pub date_values: Vec<DateValue>,
    pub category_kind: CategoryKind,
    pub is_ordinal: bool,
    pub y_min_value: f64,
    /// Largest value plus counter headroom
    pub y_max_value: f64,
    pub sum_of_values: f64,
    pub has_highlights: bool,
    pub is_counter_date_time: bool,
    pub date_column_formatter: SharedFormatter,
    pub data_value_formatter: SharedFormatter,
    pub date_metadata_column: ColumnMetadata,
    pub values_metadata_column: ColumnMetadata,
}

impl std::fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewModel")
            .field("column_names", &self.column_names)
            .field("points", &self.dot_points.len())
            .field("category_kind", &self.category_kind)
            .field("y_min_value", &self.y_min_value)
            .field("y_max_value", &self.y_max_value)
            .field("has_highlights", &self.has_highlights)
            .field("is_counter_date_time", &self.is_counter_date_time)
            .finish_non_exhaustive()
    }
}

impl ViewModel {
    pub fn len(&self) -> usize {
        self.dot_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dot_points.is_empty()
    }

    /// The category of a row as a formattable cell
    pub fn category_cell(&self, index: usize) -> Option<PrimitiveValue> {
        let date_value = self.date_values.get(index)?;
        Some(match self.category_kind {
            CategoryKind::DateTime => PrimitiveValue::Date(date_from_millis(date_value.value)),
            CategoryKind::Scalar => PrimitiveValue::Number(date_value.value),
            CategoryKind::Ordinal => PrimitiveValue::Text(date_value.label.clone()),
        })
    }

    /// Counter text for a point: date-formatted, raw, or the 1-based index
    pub fn counter_text(&self, index: usize) -> String {
        let counter = self
            .dot_points
            .get(index)
            .and_then(|p| p.counter.as_ref())
            .filter(|c| c.is_truthy());

        match counter {
            Some(value) if self.is_counter_date_time => {
                self.date_column_formatter.format(&value.clone().coerce_date())
            }
            Some(value) => value.to_string(),
            None => (index + 1).to_string(),
        }
    }
}

// ============================================================================
// BUILDER
// ============================================================================

pub struct ViewModelBuilder;

impl ViewModelBuilder {
    /// `Ok(None)` when the data view has nothing to plot
    pub fn build(
        view: &crate::DataView,
        settings: &Settings,
        ids: &dyn SelectionIdFactory,
        formatters: &dyn FormatterFactory,
    ) -> Result<Option<ViewModel>> {
        let Some(columns) = ResolvedColumns::resolve(view) else {
            tracing::debug!("data view lacks a date or value column");
            return Ok(None);
        };
        let Some(projected) = categorical_values(view) else {
            return Ok(None);
        };

        let date_source = &columns.date.source;
        let values_source = &columns.values.source;

        let category_kind = CategoryKind::classify(date_source.value_type, &projected.date);
        let counter_cells = columns.counter_cells();

        let values: Vec<f64> = (0..projected.date.len())
            .map(|i| projected.values.get(i).and_then(PrimitiveValue::as_f64).unwrap_or(0.0))
            .collect();

        let (y_min, y_max) = values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let span = y_max - y_min;

        let highlights = columns.values.highlights.as_ref();
        let has_highlights = highlights.is_some();
        let opacity = settings.dot.percentile / 100.0;

        let mut date_values = Vec::with_capacity(values.len());
        let mut dot_points = Vec::with_capacity(values.len());
        let mut sum = 0.0;

        for (row, (cell, &value)) in projected.date.iter().zip(&values).enumerate() {
            let label = columns.date.values.get(row).map(|raw| raw.to_string()).unwrap_or_default();
            let date_value = DateValue::new(label, category_kind.position(cell, row)?);

            sum += value;

            let highlight = highlights
                .and_then(|h| h.get(row))
                .is_some_and(PrimitiveValue::is_truthy);

            dot_points.push(LineDotPoint {
                date_value: date_value.clone(),
                value,
                dot: if span != 0.0 { (value - y_min) / span } else { 0.0 },
                sum,
                selected: false,
                highlight,
                opacity,
                counter: counter_cells.as_ref().and_then(|c| c.get(row).cloned()),
                identity: ids.category_id(columns.date, row),
            });
            date_values.push(date_value);
        }

        let is_counter_date_time = counter_cells
            .as_ref()
            .and_then(|c| c.first())
            .is_some_and(PrimitiveValue::looks_like_date);

        let date_column_formatter =
            formatters.create(date_source.format.as_deref(), date_source.value_type);
        let data_value_formatter = formatters.create(
            Some(values_source.format.as_deref().unwrap_or(DEFAULT_VALUE_FORMAT)),
            values_source.value_type,
        );

        tracing::debug!(
            points = dot_points.len(),
            ?category_kind,
            y_min,
            y_max,
            "built view model"
        );

        Ok(Some(ViewModel {
            column_names: ColumnNames {
                category: date_source.display_name.clone(),
                values: values_source.display_name.clone(),
            },
            dot_points,
            date_values,
            category_kind,
            is_ordinal: category_kind == CategoryKind::Ordinal,
            y_min_value: y_min,
            y_max_value: y_max + span * COUNTER_SPACE,
            sum_of_values: sum + (sum - y_min) * COUNTER_SPACE,
            has_highlights,
            is_counter_date_time,
            date_column_formatter,
            data_value_formatter,
            date_metadata_column: date_source.clone(),
            values_metadata_column: values_source.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CategoryIdFactory, DataColumn, DataView, DefaultFormatterFactory, Role};

    fn view(categories: Vec<PrimitiveValue>, values: Vec<PrimitiveValue>) -> DataView {
        DataView::categorical(
            vec![DataColumn::new(ColumnMetadata::new("Date", Role::Date), categories)],
            vec![DataColumn::new(ColumnMetadata::new("Value", Role::Values), values)],
        )
    }

    fn build(view: &DataView) -> Option<ViewModel> {
        ViewModelBuilder::build(view, &Settings::default(), &CategoryIdFactory, &DefaultFormatterFactory)
            .unwrap()
    }

    fn numbers(values: &[f64]) -> Vec<PrimitiveValue> {
        values.iter().copied().map(PrimitiveValue::from).collect()
    }

    #[test]
    fn test_dot_is_normalized() {
        let model = build(&view(numbers(&[1.0, 2.0, 3.0]), numbers(&[0.0, 50.0, 100.0]))).unwrap();
        let dots: Vec<f64> = model.dot_points.iter().map(|p| p.dot).collect();
        assert_eq!(dots, vec![0.0, 0.5, 1.0]);
        assert_eq!(model.y_min_value, 0.0);
        assert_eq!(model.y_max_value, 110.0);
    }

    #[test]
    fn test_flat_series_has_zero_dots() {
        let model = build(&view(numbers(&[1.0, 2.0, 3.0]), numbers(&[7.0, 7.0, 7.0]))).unwrap();
        assert!(model.dot_points.iter().all(|p| p.dot == 0.0));
        assert_eq!(model.y_max_value, 7.0);
    }

    #[test]
    fn test_running_sum_and_spaced_total() {
        let model = build(&view(numbers(&[1.0, 2.0, 3.0]), numbers(&[1.0, 2.0, 3.0]))).unwrap();
        let sums: Vec<f64> = model.dot_points.iter().map(|p| p.sum).collect();
        assert_eq!(sums, vec![1.0, 3.0, 6.0]);
        assert!((model.sum_of_values - 6.5).abs() < 1e-9);
    }

    #[test]
    fn test_missing_values_default_to_zero() {
        let model = build(&view(
            numbers(&[1.0, 2.0, 3.0]),
            vec![PrimitiveValue::Null, 4.0.into()],
        ))
        .unwrap();
        let values: Vec<f64> = model.dot_points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 4.0, 0.0]);
        assert_eq!(model.y_min_value, 0.0);
        assert_eq!(model.date_values.len(), model.dot_points.len());
    }

    #[test]
    fn test_text_categories_are_ordinal() {
        let categories = ["Alpha", "Beta", "Omega", "Gamma"].map(PrimitiveValue::from).to_vec();
        let model = build(&view(categories, numbers(&[1.0, 2.0, 3.0, 4.0]))).unwrap();
        assert!(model.is_ordinal);
        let positions: Vec<f64> = model.date_values.iter().map(|d| d.value).collect();
        assert_eq!(positions, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(model.date_values[2].label, "Omega");
    }

    #[test]
    fn test_date_strings_become_date_time() {
        let categories = vec!["2016-01-01".into(), "2016-01-02".into()];
        let model = build(&view(categories, numbers(&[1.0, 2.0]))).unwrap();
        assert_eq!(model.category_kind, CategoryKind::DateTime);
        assert_eq!(model.date_values[1].value - model.date_values[0].value, 86_400_000.0);
    }

    #[test]
    fn test_declared_date_column_with_text_fails() {
        let mut view = view(vec!["2016-01-01".into(), "soon".into()], numbers(&[1.0, 2.0]));
        view.categorical.as_mut().unwrap().categories[0].source.value_type = Some(ValueType::DateTime);
        let err = ViewModelBuilder::build(&view, &Settings::default(), &CategoryIdFactory, &DefaultFormatterFactory)
            .unwrap_err();
        assert!(matches!(err, ChartError::InvalidCategory { row: 1 }));
    }

    #[test]
    fn test_highlights() {
        let mut view = view(numbers(&[1.0, 2.0]), numbers(&[1.0, 2.0]));
        view.categorical.as_mut().unwrap().values[0].highlights =
            Some(vec![PrimitiveValue::Null, 2.0.into()]);
        let model = build(&view).unwrap();
        assert!(model.has_highlights);
        assert!(!model.dot_points[0].highlight);
        assert!(model.dot_points[1].highlight);

        let plain = build(&self::view(numbers(&[1.0]), numbers(&[1.0]))).unwrap();
        assert!(!plain.has_highlights);
        assert!(!plain.dot_points[0].highlight);
    }

    #[test]
    fn test_counter_date_detection() {
        let mut view = view(numbers(&[1.0, 2.0]), numbers(&[1.0, 2.0]));
        view.categorical.as_mut().unwrap().values.push(DataColumn::new(
            ColumnMetadata::new("When", Role::Counter),
            vec!["2016-03-01".into(), "2016-03-02".into()],
        ));
        let model = build(&view).unwrap();
        assert!(model.is_counter_date_time);
        assert_eq!(model.counter_text(0), "3/1/2016");

        let mut view = self::view(numbers(&[1.0, 2.0]), numbers(&[1.0, 2.0]));
        view.categorical.as_mut().unwrap().values.push(DataColumn::new(
            ColumnMetadata::new("Year", Role::Counter),
            vec![PrimitiveValue::Null, 2016.0.into()],
        ));
        let model = build(&view).unwrap();
        assert!(!model.is_counter_date_time);
        assert_eq!(model.counter_text(0), "1");
        assert_eq!(model.counter_text(1), "2016");
    }

    #[test]
    fn test_counter_text_reads_last_counter_column() {
        let mut view = view(numbers(&[1.0, 2.0]), numbers(&[1.0, 2.0]));
        let values = &mut view.categorical.as_mut().unwrap().values;
        values.push(DataColumn::new(
            ColumnMetadata::new("C1", Role::Counter),
            numbers(&[100.0, 200.0]),
        ));
        values.push(DataColumn::new(
            ColumnMetadata::new("C2", Role::Counter),
            numbers(&[7.0, 8.0]),
        ));

        let model = build(&view).unwrap();
        assert_eq!(model.counter_text(0), "7");
        assert_eq!(model.counter_text(1), "8");
        assert!(!model.is_counter_date_time);
    }

    #[test]
    fn test_missing_values_column_builds_nothing() {
        let mut view = view(numbers(&[1.0]), numbers(&[1.0]));
        view.categorical.as_mut().unwrap().values.clear();
        assert!(build(&view).is_none());
    }

    #[test]
    fn test_value_formatter_defaults_to_integer() {
        let model = build(&view(numbers(&[1.0]), numbers(&[2.5]))).unwrap();
        assert_eq!(model.data_value_formatter.format_number(2.5), "3");
        assert_eq!(model.column_names.values, "Value");
    }

    #[test]
    fn test_opacity_from_percentile() {
        let mut settings = Settings::default();
        settings.dot.percentile = 40.0;
        let view = view(numbers(&[1.0]), numbers(&[1.0]));
        let model = ViewModelBuilder::build(&view, &settings, &CategoryIdFactory, &DefaultFormatterFactory)
            .unwrap()
            .unwrap();
        assert!((model.dot_points[0].opacity - 0.4).abs() < 1e-12);
    }
}
