//! In-memory tables produced by query materialization and consumed by the model parser.
//!
//! A [`Table`] is a row-major collection of [`Value`]s with ordered column names and an
//! optional [`Index`]. Tables carry no identity: two tables are equal when their
//! columns, rows and index are equal.

pub mod errors;
pub mod read_sql;
pub mod value;

use serde::{Deserialize, Serialize};

pub use errors::ReadError;
pub use read_sql::{read_sql, ReadOptions, ReadSpec};
pub use value::Value;

/// Row labels for a table, optionally named after the column they came from
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Index {
    pub name: Option<String>,
    pub values: Vec<Value>,
}

impl Index {
    pub fn named(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: Some(name.into()),
            values,
        }
    }

    pub fn unnamed(values: Vec<Value>) -> Self {
        Self { name: None, values }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    index: Option<Index>,
}

/// Deserialized form of [`Table`], checked by [`Table::new`] before use
#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default)]
    index: Option<Index>,
}

impl TryFrom<RawTable> for Table {
    type Error = ReadError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        let table = Table::new(raw.columns, raw.rows)?;
        match raw.index {
            Some(index) => table.with_index(index),
            None => Ok(table),
        }
    }
}

impl Table {
    /// Build a table from column names and rows.
    ///
    /// Every row must have exactly one value per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, ReadError> {
        if let Some((row, values)) = rows
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != columns.len())
        {
            return Err(ReadError::RowWidth {
                row,
                expected: columns.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            columns,
            rows,
            index: None,
        })
    }

    /// Build a table from rows given as `(column, value)` pairs.
    ///
    /// Columns are taken from the first row; later rows must name the same columns,
    /// in any order.
    pub fn from_records<I, R, K>(records: I) -> Result<Self, ReadError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::new();

        for (row_idx, record) in records.into_iter().enumerate() {
            let pairs: Vec<(String, Value)> =
                record.into_iter().map(|(k, v)| (k.into(), v)).collect();
            if row_idx == 0 {
                columns = pairs.iter().map(|(k, _)| k.clone()).collect();
            }
            if pairs.len() != columns.len() {
                return Err(ReadError::RowWidth {
                    row: row_idx,
                    expected: columns.len(),
                    found: pairs.len(),
                });
            }
            let mut row = vec![Value::Null; columns.len()];
            for (key, value) in pairs {
                let pos = columns
                    .iter()
                    .position(|c| *c == key)
                    .ok_or_else(|| ReadError::UnknownColumn {
                        option: "records",
                        column: key.clone(),
                    })?;
                row[pos] = value;
            }
            rows.push(row);
        }

        Ok(Self {
            columns,
            rows,
            index: None,
        })
    }

    /// Attach an index. The index must have one value per row.
    pub fn with_index(mut self, index: Index) -> Result<Self, ReadError> {
        if index.values.len() != self.rows.len() {
            return Err(ReadError::IndexLength {
                expected: self.rows.len(),
                found: index.values.len(),
            });
        }
        self.index = Some(index);
        Ok(self)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn index(&self) -> Option<&Index> {
        self.index.as_ref()
    }

    /// Name of the index, if the table has a named one
    pub fn index_name(&self) -> Option<&str> {
        self.index.as_ref().and_then(|ix| ix.name.as_deref())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    /// Cell lookup by row number and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let pos = self.column_position(column)?;
        self.rows.get(row).and_then(|values| values.get(pos))
    }

    /// Iterate over one column's values in row order
    pub fn column(&self, column: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let pos = self.column_position(column)?;
        Some(self.rows.iter().map(move |row| &row[pos]))
    }

    /// Keep rows for which `predicate` holds. The index is filtered alongside.
    pub fn filter_rows<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&[String], &[Value]) -> bool,
    {
        let Table {
            columns,
            rows,
            index,
        } = self;
        let keep: Vec<bool> = rows.iter().map(|row| predicate(&columns, row)).collect();
        let rows = rows
            .into_iter()
            .zip(&keep)
            .filter_map(|(row, k)| k.then_some(row))
            .collect();
        let index = index.map(|ix| Index {
            name: ix.name,
            values: ix
                .values
                .into_iter()
                .zip(&keep)
                .filter_map(|(v, k)| k.then_some(v))
                .collect(),
        });
        Table {
            columns,
            rows,
            index,
        }
    }

    /// Split the table into its parts, transferring ownership of every row
    pub fn into_parts(self) -> (Vec<String>, Vec<Vec<Value>>, Option<Index>) {
        (self.columns, self.rows, self.index)
    }

    pub(crate) fn from_parts(
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        index: Option<Index>,
    ) -> Self {
        Self {
            columns,
            rows,
            index,
        }
    }

    /// Move a column out of the row data and make it the (named) index
    pub fn set_index(self, column: &str) -> Result<Self, ReadError> {
        let pos = self
            .column_position(column)
            .ok_or_else(|| ReadError::UnknownColumn {
                option: "index_col",
                column: column.to_string(),
            })?;
        let (mut columns, mut rows, _) = self.into_parts();
        let name = columns.remove(pos);
        let values = rows.iter_mut().map(|row| row.remove(pos)).collect();
        Ok(Self::from_parts(columns, rows, Some(Index::named(name, values))))
    }

    /// Restrict the table to `keep`, in that order
    pub fn select(self, keep: &[String]) -> Result<Self, ReadError> {
        let positions = keep
            .iter()
            .map(|column| {
                self.column_position(column)
                    .ok_or_else(|| ReadError::UnknownColumn {
                        option: "columns",
                        column: column.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (_, rows, index) = self.into_parts();
        let rows = rows
            .into_iter()
            .map(|row| positions.iter().map(|&p| row[p].clone()).collect())
            .collect();
        Ok(Self::from_parts(keep.to_vec(), rows, index))
    }
}
