//! Plot points and their selection identities

use crate::{DataColumn, PrimitiveValue};
use serde::{Deserialize, Serialize};

/// Category label plus its numeric position on the x axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateValue {
    pub label: String,
    pub value: f64,
}

impl DateValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Identity of one category row, compared by value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionId {
    pub key: String,
    pub row: usize,
}

impl SelectionId {
    pub fn new(key: impl Into<String>, row: usize) -> Self {
        Self {
            key: key.into(),
            row,
        }
    }
}

impl std::fmt::Display for SelectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.key, self.row)
    }
}

/// Anything that carries a selection flag and an identity
pub trait Selectable {
    fn identity(&self) -> &SelectionId;
    fn is_selected(&self) -> bool;
    fn set_selected(&mut self, selected: bool);
}

/// One rendered dot and the line vertex under it
#[derive(Debug, Clone, PartialEq)]
pub struct LineDotPoint {
    pub date_value: DateValue,
    pub value: f64,
    /// Normalized position of `value` within the value extent
    pub dot: f64,
    /// Running total up to and including this point
    pub sum: f64,
    pub selected: bool,
    pub highlight: bool,
    pub opacity: f64,
    pub counter: Option<PrimitiveValue>,
    pub identity: SelectionId,
}

impl Selectable for LineDotPoint {
    fn identity(&self) -> &SelectionId {
        &self.identity
    }

    fn is_selected(&self) -> bool {
        self.selected
    }

    fn set_selected(&mut self, selected: bool) {
        self.selected = selected;
    }
}

// ============================================================================
// STRATEGY PATTERN: Identity factories
// ============================================================================

/// Builds selection identities for category rows
pub trait SelectionIdFactory {
    fn category_id(&self, column: &DataColumn, row: usize) -> SelectionId;
}

/// Keys identities on the column's query name (or display name)
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryIdFactory;

impl SelectionIdFactory for CategoryIdFactory {
    fn category_id(&self, column: &DataColumn, row: usize) -> SelectionId {
        SelectionId::new(column.source.key(), row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ColumnMetadata, Role};

    #[test]
    fn test_category_ids_compare_by_value() {
        let column = DataColumn::new(
            ColumnMetadata::new("Date", Role::Date).with_query_name("Sales.Date"),
            vec![],
        );
        let a = CategoryIdFactory.category_id(&column, 3);
        let b = CategoryIdFactory.category_id(&column, 3);
        assert_eq!(a, b);
        assert_ne!(a, CategoryIdFactory.category_id(&column, 4));
        assert_eq!(a.to_string(), "Sales.Date#3");
    }
}
