//! In-memory engine backed by fixed relations.
//!
//! `MemoryEngine` only executes statements it compiled itself: `compile` remembers the
//! query behind each SQL string, and `execute` evaluates that query against the stored
//! rows using the bind values it is handed. Because filters read their operands from
//! the supplied [`Params`] rather than from the query, a wrong parameter extraction shows
//! up as wrong rows. Every executed statement is recorded for inspection.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;

use log::trace;

use super::{Engine, EngineError, ResultSet};
use crate::dialect::{CompiledStatement, ParamStyle, Params};
use crate::query::{Direction, Filter, Op, Query};
use crate::table::Value;

/// A statement as it reached [`MemoryEngine::execute`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedStatement {
    pub sql: String,
    pub params: Params,
}

#[derive(Debug)]
pub struct MemoryEngine {
    dialect: String,
    param_style: Option<ParamStyle>,
    relations: HashMap<String, ResultSet>,
    statements: RefCell<HashMap<String, Query>>,
    executed: RefCell<Vec<ExecutedStatement>>,
}

impl MemoryEngine {
    pub fn new(dialect: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            param_style: None,
            relations: HashMap::new(),
            statements: RefCell::new(HashMap::new()),
            executed: RefCell::new(Vec::new()),
        }
    }

    /// Override the placeholder style derived from the dialect
    pub fn with_param_style(mut self, style: ParamStyle) -> Self {
        self.param_style = Some(style);
        self
    }

    pub fn with_relation(mut self, name: impl Into<String>, rows: ResultSet) -> Self {
        self.insert_relation(name, rows);
        self
    }

    pub fn insert_relation(&mut self, name: impl Into<String>, rows: ResultSet) {
        self.relations.insert(name.into(), rows);
    }

    /// Statements executed so far, oldest first
    pub fn executed(&self) -> Vec<ExecutedStatement> {
        self.executed.borrow().clone()
    }

    fn evaluate(&self, query: &Query, params: &Params) -> Result<ResultSet, EngineError> {
        let relation = self
            .relations
            .get(query.table())
            .ok_or_else(|| EngineError::execution(format!("no such table: {}", query.table())))?;
        let position = |column: &str| {
            relation
                .columns
                .iter()
                .position(|c| c == column)
                .ok_or_else(|| EngineError::execution(format!("no such column: {}", column)))
        };

        // Operands come from the bind parameters, in placeholder order
        let mut binds = BindCursor::new(params);
        let mut predicates = Vec::with_capacity(query.filters().len());
        for filter in query.filters() {
            predicates.push(match filter {
                Filter::Compare { column, op, .. } => {
                    Predicate::Compare(position(column)?, *op, binds.next()?)
                }
                Filter::IsNull { column } => Predicate::IsNull(position(column)?),
                Filter::Between { column, .. } => {
                    let low = binds.next()?;
                    let high = binds.next()?;
                    Predicate::Between(position(column)?, low, high)
                }
            });
        }
        let limit = query
            .limit_count()
            .map(|_| binds.next_count("limit"))
            .transpose()?;
        let offset = query
            .offset_count()
            .map(|_| binds.next_count("offset"))
            .transpose()?;

        let sort_keys = query
            .ordering()
            .iter()
            .map(|(column, direction)| Ok((position(column)?, *direction)))
            .collect::<Result<Vec<_>, EngineError>>()?;

        let (columns, projection) = if query.selected_columns().is_empty() {
            (relation.columns.clone(), (0..relation.columns.len()).collect())
        } else {
            let projection = query
                .selected_columns()
                .iter()
                .map(|c| position(c))
                .collect::<Result<Vec<_>, _>>()?;
            (query.selected_columns().to_vec(), projection)
        };

        let mut rows: Vec<&Vec<Value>> = relation
            .rows
            .iter()
            .filter(|row| predicates.iter().all(|p| p.matches(row)))
            .collect();

        if !sort_keys.is_empty() {
            rows.sort_by(|a, b| {
                sort_keys
                    .iter()
                    .map(|&(pos, direction)| {
                        let ord = a[pos].compare(&b[pos]).unwrap_or(Ordering::Equal);
                        match direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let rows = rows
            .into_iter()
            .skip(offset.unwrap_or(0))
            .take(limit.unwrap_or(usize::MAX))
            .map(|row| projection.iter().map(|&p| row[p].clone()).collect())
            .collect();

        Ok(ResultSet::new(columns, rows))
    }
}

impl Engine for MemoryEngine {
    fn dialect(&self) -> &str {
        &self.dialect
    }

    fn param_style(&self) -> ParamStyle {
        self.param_style
            .unwrap_or_else(|| ParamStyle::for_dialect(&self.dialect))
    }

    fn compile(&self, query: &Query) -> Result<CompiledStatement, EngineError> {
        let compiled = query.compile(self.param_style())?;
        self.statements
            .borrow_mut()
            .insert(compiled.sql.clone(), query.clone());
        Ok(compiled)
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, EngineError> {
        trace!("MemoryEngine executing {} with {:?}", sql, params);
        self.executed.borrow_mut().push(ExecutedStatement {
            sql: sql.to_string(),
            params: params.clone(),
        });
        let query = self
            .statements
            .borrow()
            .get(sql)
            .cloned()
            .ok_or_else(|| EngineError::execution(format!("unprepared statement: {}", sql)))?;
        self.evaluate(&query, params)
    }
}

enum Predicate {
    Compare(usize, Op, Value),
    IsNull(usize),
    Between(usize, Value, Value),
}

impl Predicate {
    fn matches(&self, row: &[Value]) -> bool {
        match self {
            Predicate::Compare(pos, op, value) => match row[*pos].compare(value) {
                Some(ord) => match op {
                    Op::Eq => ord == Ordering::Equal,
                    Op::NotEq => ord != Ordering::Equal,
                    Op::Lt => ord == Ordering::Less,
                    Op::LtEq => ord != Ordering::Greater,
                    Op::Gt => ord == Ordering::Greater,
                    Op::GtEq => ord != Ordering::Less,
                },
                None => false,
            },
            Predicate::IsNull(pos) => row[*pos].is_null(),
            Predicate::Between(pos, low, high) => {
                matches!(
                    row[*pos].compare(low),
                    Some(Ordering::Greater | Ordering::Equal)
                ) && matches!(
                    row[*pos].compare(high),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }
        }
    }
}

/// Walks bind parameters in placeholder order
struct BindCursor<'a> {
    params: &'a Params,
    position: usize,
}

impl<'a> BindCursor<'a> {
    fn new(params: &'a Params) -> Self {
        Self {
            params,
            position: 0,
        }
    }

    fn next(&mut self) -> Result<Value, EngineError> {
        self.position += 1;
        let value = match self.params {
            Params::Positional(values) => values.get(self.position - 1),
            Params::Named(map) => map.get(&format!("param_{}", self.position)),
        };
        value
            .cloned()
            .ok_or_else(|| EngineError::execution(format!("missing bind parameter {}", self.position)))
    }

    fn next_count(&mut self, clause: &str) -> Result<usize, EngineError> {
        let value = self.next()?;
        value
            .as_i64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| {
                EngineError::execution(format!("{} must be a non-negative integer, got {}", clause, value))
            })
    }
}
