//! Minimal `SELECT` builder scoped to a single relation.
//!
//! Queries are compiled per [`ParamStyle`]: every literal becomes a bind named
//! `param_N` (numbered in placeholder order) and the placeholder is written the way the
//! target driver expects. Identifiers are validated, never escaped, so compiled SQL only
//! ever contains names that match `[A-Za-z_][A-Za-z0-9_]*` (optionally schema-qualified).

pub mod errors;

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::dialect::{CompiledStatement, ParamStyle};
use crate::model::ModelDescriptor;
use crate::table::Value;

pub use errors::QueryError;

lazy_static! {
    static ref IDENTIFIER: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();
}

/// Comparison operators supported in filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl Op {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::NotEq => "!=",
            Op::Lt => "<",
            Op::LtEq => "<=",
            Op::Gt => ">",
            Op::GtEq => ">=",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    Compare { column: String, op: Op, value: Value },
    IsNull { column: String },
    /// Inclusive range, typically a time window over a timestamp column
    Between { column: String, low: Value, high: Value },
}

impl Filter {
    fn column(&self) -> &str {
        match self {
            Filter::Compare { column, .. }
            | Filter::IsNull { column }
            | Filter::Between { column, .. } => column,
        }
    }
}

/// A `SELECT` over one relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    table: String,
    /// Selected columns; empty selects `*`
    columns: Vec<String>,
    filters: Vec<Filter>,
    order_by: Vec<(String, Direction)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Query {
    /// `SELECT * FROM table`
    pub fn select_all(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Select every declared column of a model from its relation
    pub fn for_model(descriptor: &ModelDescriptor) -> Self {
        Self::select_all(descriptor.table.clone()).columns(descriptor.columns.iter().cloned())
    }

    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, column: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Compare {
            column: column.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn is_null(mut self, column: impl Into<String>) -> Self {
        self.filters.push(Filter::IsNull {
            column: column.into(),
        });
        self
    }

    /// Keep rows whose `column` lies within `[low, high]`
    pub fn between(
        mut self,
        column: impl Into<String>,
        low: impl Into<Value>,
        high: impl Into<Value>,
    ) -> Self {
        self.filters.push(Filter::Between {
            column: column.into(),
            low: low.into(),
            high: high.into(),
        });
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> &[(String, Direction)] {
        &self.order_by
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset_count(&self) -> Option<u64> {
        self.offset
    }

    /// Render SQL with placeholders in `style` and collect the bind values
    pub fn compile(&self, style: ParamStyle) -> Result<CompiledStatement, QueryError> {
        if self.table.trim().is_empty() {
            return Err(QueryError::EmptyRelation);
        }
        check_identifier(&self.table)?;
        for column in &self.columns {
            check_identifier(column)?;
        }

        let mut binder = Binder::new(style);

        let projection = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", projection, self.table);

        if !self.filters.is_empty() {
            let mut predicates = Vec::with_capacity(self.filters.len());
            for filter in &self.filters {
                check_identifier(filter.column())?;
                let predicate = match filter {
                    Filter::Compare { column, op, value } => {
                        format!("{} {} {}", column, op, binder.bind(value.clone()))
                    }
                    Filter::IsNull { column } => format!("{} IS NULL", column),
                    Filter::Between { column, low, high } => {
                        let low = binder.bind(low.clone());
                        let high = binder.bind(high.clone());
                        format!("{} BETWEEN {} AND {}", column, low, high)
                    }
                };
                predicates.push(predicate);
            }
            sql.push_str(" WHERE ");
            sql.push_str(&predicates.join(" AND "));
        }

        if !self.order_by.is_empty() {
            let mut keys = Vec::with_capacity(self.order_by.len());
            for (column, direction) in &self.order_by {
                check_identifier(column)?;
                keys.push(match direction {
                    Direction::Asc => format!("{} ASC", column),
                    Direction::Desc => format!("{} DESC", column),
                });
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        if let Some(limit) = self.limit {
            let placeholder = binder.bind(Value::Int(to_i64(limit, "limit")?));
            sql.push_str(&format!(" LIMIT {}", placeholder));
        }
        if let Some(offset) = self.offset {
            let placeholder = binder.bind(Value::Int(to_i64(offset, "offset")?));
            sql.push_str(&format!(" OFFSET {}", placeholder));
        }

        Ok(binder.finish(sql))
    }
}

/// Hands out bind names and placeholders in appearance order
struct Binder {
    style: ParamStyle,
    binds: BTreeMap<String, Value>,
    positions: Vec<String>,
}

impl Binder {
    fn new(style: ParamStyle) -> Self {
        Self {
            style,
            binds: BTreeMap::new(),
            positions: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        let position = self.positions.len() + 1;
        let name = format!("param_{}", position);
        let placeholder = self.style.placeholder(&name, position);
        self.binds.insert(name.clone(), value);
        self.positions.push(name);
        placeholder
    }

    fn finish(self, sql: String) -> CompiledStatement {
        CompiledStatement {
            sql,
            binds: self.binds,
            positions: self.positions,
        }
    }
}

fn check_identifier(name: &str) -> Result<(), QueryError> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(QueryError::InvalidIdentifier {
            identifier: name.to_string(),
        })
    }
}

fn to_i64(n: u64, clause: &'static str) -> Result<i64, QueryError> {
    i64::try_from(n).map_err(|_| QueryError::OutOfRange { clause, value: n })
}
