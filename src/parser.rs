//! Table → model instances.
//!
//! [`Parsed`] owns the table it reads from and builds one instance per row on demand.
//! It is single-pass: rows are moved out as they are yielded and there is no way to
//! rewind. Only columns the model declares reach the constructor; anything else in the
//! table is dropped unless strict mode is on.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::config::RedframeConfig;
use crate::model::{FieldMap, Model, ModelDescriptor, ModelError, Record};
use crate::table::{Table, Value};

/// Constructor signature used when parsing into a [`Model`] type
pub type Constructor<T> = fn(FieldMap) -> Result<T, ModelError>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Inject the index value under the index name, when the model declares it
    pub parse_index: bool,
    /// Reject tables carrying columns the model does not declare
    pub strict: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse_index(mut self, parse_index: bool) -> Self {
        self.parse_index = parse_index;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn from_config(config: &RedframeConfig) -> Self {
        Self {
            parse_index: config.parse_index,
            strict: config.strict_columns,
        }
    }
}

impl From<bool> for ParseOptions {
    fn from(parse_index: bool) -> Self {
        Self::new().parse_index(parse_index)
    }
}

/// Lazy, single-pass sequence of instances built from a table's rows
pub struct Parsed<T, F = Constructor<T>>
where
    F: FnMut(FieldMap) -> Result<T, ModelError>,
{
    model: String,
    /// Row positions of declared columns, with their names
    fields: Vec<(usize, String)>,
    /// Index values and the field they are injected under
    index: Option<(String, std::vec::IntoIter<Value>)>,
    rows: std::vec::IntoIter<Vec<Value>>,
    rejected: Option<ModelError>,
    construct: F,
}

impl<T, F> Parsed<T, F>
where
    F: FnMut(FieldMap) -> Result<T, ModelError>,
{
    fn new(table: Table, descriptor: &ModelDescriptor, options: ParseOptions, construct: F) -> Self {
        let attributes = descriptor.attributes();
        let (columns, rows, index) = table.into_parts();

        let mut fields = Vec::new();
        let mut undeclared = Vec::new();
        for (pos, column) in columns.into_iter().enumerate() {
            if attributes.contains(column.as_str()) {
                fields.push((pos, column));
            } else {
                undeclared.push(column);
            }
        }

        let index = match index {
            Some(ix) if options.parse_index => match ix.name {
                Some(name) if attributes.contains(name.as_str()) => {
                    Some((name, ix.values.into_iter()))
                }
                _ => None,
            },
            _ => None,
        };

        let rejected = if undeclared.is_empty() {
            None
        } else if options.strict {
            warn!(
                "Rejecting table for {}: undeclared columns {:?}",
                descriptor.name, undeclared
            );
            Some(ModelError::UndeclaredColumns {
                model: descriptor.name.clone(),
                columns: undeclared,
            })
        } else {
            debug!(
                "Dropping columns {:?} not declared on {}",
                undeclared, descriptor.name
            );
            None
        };

        Self {
            model: descriptor.name.clone(),
            fields,
            index,
            rows: rows.into_iter(),
            rejected,
            construct,
        }
    }
}

impl<T, F> Iterator for Parsed<T, F>
where
    F: FnMut(FieldMap) -> Result<T, ModelError>,
{
    type Item = Result<T, ModelError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.rejected.take() {
            self.rows = Vec::new().into_iter();
            return Some(Err(err));
        }

        let mut row = self.rows.next()?;
        let mut fields = FieldMap::new(self.model.as_str());
        for (pos, name) in &self.fields {
            fields.insert(name.clone(), std::mem::replace(&mut row[*pos], Value::Null));
        }
        if let Some((name, values)) = &mut self.index {
            if let Some(value) = values.next() {
                fields.insert(name.clone(), value);
            }
        }

        Some((self.construct)(fields))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.rejected.is_some() {
            (1, Some(1))
        } else {
            self.rows.size_hint()
        }
    }
}

/// Parse `table` with an arbitrary constructor
pub fn parse_with<T, F>(
    table: Table,
    descriptor: &ModelDescriptor,
    options: ParseOptions,
    construct: F,
) -> Parsed<T, F>
where
    F: FnMut(FieldMap) -> Result<T, ModelError>,
{
    Parsed::new(table, descriptor, options, construct)
}

/// Parse `table` into instances of `M`
pub fn parse_models<M: Model>(table: Table, options: ParseOptions) -> Parsed<M> {
    parse_with(table, M::descriptor(), options, M::from_fields as Constructor<M>)
}

fn build_record(fields: FieldMap) -> Result<Record, ModelError> {
    Ok(Record::from_fields(fields))
}

/// Parse `table` into dynamic records for `descriptor`
pub fn parse_records(
    table: Table,
    descriptor: &ModelDescriptor,
    options: ParseOptions,
) -> Parsed<Record> {
    parse_with(table, descriptor, options, build_record as Constructor<Record>)
}
