//! Model declarations: what a relation looks like and how rows become instances.
//!
//! A model is described by a [`ModelDescriptor`]: its relation, its declared columns and
//! the read options used whenever it is materialized. Static Rust types implement
//! [`Model`]; schema-driven code works with descriptors from a [`ModelCatalog`] and gets
//! [`Record`]s back.

pub mod catalog;
pub mod errors;
pub mod fields;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::bridge::{Bridge, DefaultBridge};
use crate::table::{ReadOptions, Value};

pub use catalog::ModelCatalog;
pub use errors::{CatalogError, ModelError};
pub use fields::{FieldMap, FromValue};

/// Per-model configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Model name
    pub name: String,
    /// Relation the model maps to
    pub table: String,
    /// Declared columns; only these become constructor fields
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Defaults applied to every materialization of this model
    #[serde(default)]
    pub read_options: ReadOptions,
}

impl ModelDescriptor {
    pub fn new<I, S>(name: impl Into<String>, table: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            table: table.into(),
            columns: columns.into_iter().map(Into::into).collect(),
            primary_key: None,
            read_options: ReadOptions::default(),
        }
    }

    pub fn with_primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = Some(column.into());
        self
    }

    pub fn with_read_options(mut self, options: ReadOptions) -> Self {
        self.read_options = options;
        self
    }

    /// The declared attribute set
    pub fn attributes(&self) -> HashSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    pub fn declares(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }
}

/// A relational model type that can be rebuilt from table rows.
///
/// ```ignore
/// lazy_static! {
///     static ref WIDGET: ModelDescriptor =
///         ModelDescriptor::new("Widget", "widgets", ["id", "name", "units"]);
/// }
///
/// impl Model for Widget {
///     fn descriptor() -> &'static ModelDescriptor {
///         &WIDGET
///     }
///
///     fn from_fields(mut fields: FieldMap) -> Result<Self, ModelError> {
///         Ok(Widget {
///             id: fields.take_required("id")?,
///             name: fields.take_required("name")?,
///             units: fields.take_optional("units")?,
///         })
///     }
/// }
/// ```
pub trait Model: Sized + 'static {
    fn descriptor() -> &'static ModelDescriptor;

    /// Build an instance from the declared fields present in one row
    fn from_fields(fields: FieldMap) -> Result<Self, ModelError>;

    /// Implementation used by [`crate::bridge::materialize`] and [`crate::bridge::parse`].
    ///
    /// Override to customise how this model is read or parsed.
    fn bridge() -> Box<dyn Bridge<Self>> {
        Box::new(DefaultBridge::new())
    }
}

/// Model instance built from a descriptor at runtime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub model: String,
    pub fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn from_fields(fields: FieldMap) -> Self {
        Self {
            model: fields.model().to_string(),
            fields: fields.into_inner(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}
