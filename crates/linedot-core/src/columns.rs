//! Column resolution by data role

use crate::{DataColumn, DataView, PrimitiveValue, Role};

/// The columns a render cycle needs, located by role
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColumns<'a> {
    pub date: &'a DataColumn,
    pub values: &'a DataColumn,
    pub counter: Option<&'a DataColumn>,
}

impl<'a> ResolvedColumns<'a> {
    /// `None` means there is nothing to draw
    pub fn resolve(view: &'a DataView) -> Option<Self> {
        let categorical = view.categorical.as_ref()?;

        let date = categorical
            .categories
            .iter()
            .find(|c| c.source.has_role(Role::Date))?;
        let values = categorical
            .values
            .iter()
            .find(|c| c.source.has_role(Role::Values))?;

        if date.values.is_empty() || values.values.is_empty() {
            return None;
        }

        let counter = categorical
            .values
            .iter()
            .rev()
            .find(|c| c.source.has_role(Role::Counter));

        Some(Self {
            date,
            values,
            counter,
        })
    }

    /// Cells of the resolved counter column, date-like strings coerced
    pub fn counter_cells(&self) -> Option<Vec<PrimitiveValue>> {
        self.counter.map(coerced)
    }
}

fn coerced(column: &DataColumn) -> Vec<PrimitiveValue> {
    column.values.iter().cloned().map(PrimitiveValue::coerce_date).collect()
}

/// Cell values per role, with date-like strings coerced to dates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoricalValues {
    pub date: Vec<PrimitiveValue>,
    pub values: Vec<PrimitiveValue>,
    pub counter: Option<Vec<PrimitiveValue>>,
}

impl CategoricalValues {
    pub fn get(&self, role: Role) -> Option<&[PrimitiveValue]> {
        match role {
            Role::Date => Some(&self.date),
            Role::Values => Some(&self.values),
            Role::Counter => self.counter.as_deref(),
        }
    }
}

/// Project every role into plain value lists. Date and Values take the
/// first matching column, Counter the last.
pub fn categorical_values(view: &DataView) -> Option<CategoricalValues> {
    view.categorical.as_ref()?;

    let project = |role: Role| -> Option<Vec<PrimitiveValue>> {
        view.columns().find(|c| c.source.has_role(role)).map(coerced)
    };

    Some(CategoricalValues {
        date: project(Role::Date).unwrap_or_default(),
        values: project(Role::Values).unwrap_or_default(),
        counter: view
            .columns()
            .filter(|c| c.source.has_role(Role::Counter))
            .last()
            .map(coerced),
    })
}

/// Display names of the value columns, in order
pub fn series_names(view: &DataView) -> Vec<String> {
    view.categorical
        .iter()
        .flat_map(|c| c.values.iter())
        .filter(|c| c.source.has_role(Role::Values))
        .map(|c| c.source.display_name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ColumnMetadata;

    fn view() -> DataView {
        DataView::categorical(
            vec![DataColumn::new(
                ColumnMetadata::new("Date", Role::Date),
                vec!["2016-01-01".into(), "Alpha".into()],
            )],
            vec![
                DataColumn::new(
                    ColumnMetadata::new("Sales", Role::Values),
                    vec![1.0.into(), 2.0.into()],
                ),
                DataColumn::new(
                    ColumnMetadata::new("Year", Role::Counter),
                    vec![2015.0.into(), 2016.0.into()],
                ),
            ],
        )
    }

    #[test]
    fn test_resolve_finds_roles() {
        let view = view();
        let cols = ResolvedColumns::resolve(&view).unwrap();
        assert_eq!(cols.date.source.display_name, "Date");
        assert_eq!(cols.values.source.display_name, "Sales");
        assert_eq!(cols.counter.unwrap().source.display_name, "Year");
    }

    #[test]
    fn test_resolve_without_values_is_none() {
        let mut view = view();
        view.categorical.as_mut().unwrap().values.clear();
        assert!(ResolvedColumns::resolve(&view).is_none());
        assert!(ResolvedColumns::resolve(&DataView::default()).is_none());
    }

    #[test]
    fn test_resolve_with_empty_values_is_none() {
        let mut view = view();
        view.categorical.as_mut().unwrap().values[0].values.clear();
        assert!(ResolvedColumns::resolve(&view).is_none());
    }

    #[test]
    fn test_projection_coerces_dates() {
        let values = categorical_values(&view()).unwrap();
        assert!(matches!(values.date[0], PrimitiveValue::Date(_)));
        assert_eq!(values.date[1], PrimitiveValue::text("Alpha"));
        assert_eq!(values.get(Role::Counter).unwrap().len(), 2);
    }

    #[test]
    fn test_last_counter_column_wins() {
        let mut view = view();
        view.categorical.as_mut().unwrap().values.push(DataColumn::new(
            ColumnMetadata::new("Step", Role::Counter),
            vec![7.0.into(), 8.0.into()],
        ));

        let cols = ResolvedColumns::resolve(&view).unwrap();
        assert_eq!(cols.counter.unwrap().source.display_name, "Step");
        assert_eq!(
            cols.counter_cells().unwrap(),
            vec![PrimitiveValue::from(7.0), PrimitiveValue::from(8.0)]
        );

        let projected = categorical_values(&view).unwrap();
        assert_eq!(projected.counter, cols.counter_cells());
    }

    #[test]
    fn test_series_names() {
        assert_eq!(series_names(&view()), vec!["Sales".to_string()]);
    }
}
