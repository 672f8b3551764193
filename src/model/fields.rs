//! Keyword arguments handed to model constructors.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use super::errors::ModelError;
use crate::table::Value;

/// Conversion from a cell value into a model field type.
///
/// On mismatch the original value is handed back so the caller can report it.
pub trait FromValue: Sized {
    /// Human-readable name of the accepted type, for error messages
    const EXPECTED: &'static str;

    fn from_value(value: Value) -> Result<Self, Value>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: Value) -> Result<Self, Value> {
        value.as_i64().ok_or(value)
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: Value) -> Result<Self, Value> {
        value.as_f64().ok_or(value)
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: Value) -> Result<Self, Value> {
        value.as_bool().ok_or(value)
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "text";

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl FromValue for NaiveDateTime {
    const EXPECTED: &'static str = "timestamp";

    fn from_value(value: Value) -> Result<Self, Value> {
        value.as_timestamp().ok_or(value)
    }
}

/// Field name → value mapping for one row, restricted to a model's declared columns
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FieldMap {
    #[serde(skip)]
    model: String,
    values: BTreeMap<String, Value>,
}

impl FieldMap {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            values: BTreeMap::new(),
        }
    }

    /// Name of the model these fields are for
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        self.values.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Remove `field` and convert it. Absent fields and nulls are `MissingField`.
    pub fn take_required<T: FromValue>(&mut self, field: &str) -> Result<T, ModelError> {
        match self.values.remove(field) {
            None | Some(Value::Null) => Err(ModelError::missing(&self.model, field)),
            Some(value) => convert(field, value),
        }
    }

    /// Remove `field` and convert it. Absent fields and nulls are `None`.
    pub fn take_optional<T: FromValue>(&mut self, field: &str) -> Result<Option<T>, ModelError> {
        match self.values.remove(field) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => convert(field, value).map(Some),
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.values
    }
}

fn convert<T: FromValue>(field: &str, value: Value) -> Result<T, ModelError> {
    T::from_value(value).map_err(|value| ModelError::InvalidValue {
        field: field.to_string(),
        expected: T::EXPECTED,
        found: format!("{} {}", value.type_name(), value),
    })
}

impl IntoIterator for FieldMap {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
