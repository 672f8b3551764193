//! The engine seam: whatever owns the connection to a relational store.
//!
//! An [`Engine`] names its dialect, compiles [`Query`]s into SQL for that dialect and
//! executes raw SQL with bind parameters. Nothing in this crate opens connections;
//! drivers implement this trait and hand it to the materializer.

pub mod memory;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dialect::{CompiledStatement, ParamStyle, Params};
use crate::query::{Query, QueryError};
use crate::table::Value;

pub use memory::MemoryEngine;

/// Raw engine output, before any read options are applied
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }
}

/// Errors reported by an engine. Driver errors are carried without modification.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to compile query: {0}")]
    Compile(#[from] QueryError),
    #[error("Query execution failed: {message}")]
    Execution { message: String },
    #[error(transparent)]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl EngineError {
    pub fn execution(message: impl Into<String>) -> Self {
        EngineError::Execution {
            message: message.into(),
        }
    }

    /// Wrap a driver error so it reaches the caller unchanged
    pub fn backend(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        EngineError::Backend(error.into())
    }
}

pub trait Engine {
    /// Dialect identifier, used as the dialect registry key
    fn dialect(&self) -> &str;

    /// Placeholder style this engine's driver accepts
    fn param_style(&self) -> ParamStyle {
        ParamStyle::for_dialect(self.dialect())
    }

    /// Render `query` for this engine
    fn compile(&self, query: &Query) -> Result<CompiledStatement, EngineError> {
        Ok(query.compile(self.param_style())?)
    }

    /// Run `sql` with `params` and return every row
    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn dialect(&self) -> &str {
        (**self).dialect()
    }

    fn param_style(&self) -> ParamStyle {
        (**self).param_style()
    }

    fn compile(&self, query: &Query) -> Result<CompiledStatement, EngineError> {
        (**self).compile(query)
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, EngineError> {
        (**self).execute(sql, params)
    }
}

impl<E: Engine + ?Sized> Engine for Box<E> {
    fn dialect(&self) -> &str {
        (**self).dialect()
    }

    fn param_style(&self) -> ParamStyle {
        (**self).param_style()
    }

    fn compile(&self, query: &Query) -> Result<CompiledStatement, EngineError> {
        (**self).compile(query)
    }

    fn execute(&self, sql: &str, params: &Params) -> Result<ResultSet, EngineError> {
        (**self).execute(sql, params)
    }
}
