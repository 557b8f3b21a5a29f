//! Host data-view shapes (categorical mapping only)

use crate::{PrimitiveValue, ValueType};
use serde::{Deserialize, Serialize};

/// Data roles a column can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Date,
    Values,
    Counter,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Date => "Date",
            Self::Values => "Values",
            Self::Counter => "Counter",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Role flags attached to a column's metadata
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnRoles {
    #[serde(rename = "Date")]
    pub date: bool,
    #[serde(rename = "Values")]
    pub values: bool,
    #[serde(rename = "Counter")]
    pub counter: bool,
}

impl ColumnRoles {
    pub fn has(&self, role: Role) -> bool {
        match role {
            Role::Date => self.date,
            Role::Values => self.values,
            Role::Counter => self.counter,
        }
    }

    pub fn only(role: Role) -> Self {
        let mut roles = Self::default();
        match role {
            Role::Date => roles.date = true,
            Role::Values => roles.values = true,
            Role::Counter => roles.counter = true,
        }
        roles
    }
}

/// Column metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnMetadata {
    pub display_name: String,
    pub query_name: Option<String>,
    pub format: Option<String>,
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,
    pub roles: Option<ColumnRoles>,
}

impl ColumnMetadata {
    pub fn new(display_name: impl Into<String>, role: Role) -> Self {
        Self {
            display_name: display_name.into(),
            roles: Some(ColumnRoles::only(role)),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, value_type: ValueType) -> Self {
        self.value_type = Some(value_type);
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.is_some_and(|r| r.has(role))
    }

    /// Stable key used for identities: query name, else display name
    pub fn key(&self) -> &str {
        self.query_name.as_deref().unwrap_or(&self.display_name)
    }
}

/// A column of cells with its metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataColumn {
    pub source: ColumnMetadata,
    pub values: Vec<PrimitiveValue>,
    /// Per-row cross-filter highlight values (value columns only)
    pub highlights: Option<Vec<PrimitiveValue>>,
}

impl DataColumn {
    pub fn new(source: ColumnMetadata, values: Vec<PrimitiveValue>) -> Self {
        Self {
            source,
            values,
            highlights: None,
        }
    }
}

/// Categorical section of a data view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Categorical {
    pub categories: Vec<DataColumn>,
    pub values: Vec<DataColumn>,
}

/// Data-view metadata; `objects` carries the raw persisted settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataViewMetadata {
    pub objects: Option<serde_json::Value>,
}

/// The tabular data delivered on every host update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataView {
    pub metadata: DataViewMetadata,
    pub categorical: Option<Categorical>,
}

impl DataView {
    pub fn from_json(json: &str) -> Result<Self, crate::ChartError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Convenience constructor: one category column plus value columns
    pub fn categorical(categories: Vec<DataColumn>, values: Vec<DataColumn>) -> Self {
        Self {
            metadata: DataViewMetadata::default(),
            categorical: Some(Categorical { categories, values }),
        }
    }

    pub fn with_objects(mut self, objects: serde_json::Value) -> Self {
        self.metadata.objects = Some(objects);
        self
    }

    /// All columns (categories first, then values)
    pub fn columns(&self) -> impl Iterator<Item = &DataColumn> {
        self.categorical
            .iter()
            .flat_map(|c| c.categories.iter().chain(c.values.iter()))
    }
}
