//! Dialect dispatch for bind parameters.
//!
//! Compiling a [`crate::query::Query`] produces a [`CompiledStatement`]: SQL text plus every
//! bind value keyed by name, and the order in which the placeholders appear. Drivers
//! disagree about how they want those values back. Some take an ordered sequence that
//! lines up with `?` placeholders, others take a name-to-value mapping. The
//! [`DialectRegistry`] maps a dialect identifier to the function that produces the
//! right [`Params`] shape, so the materializer never has to know which engine it is
//! talking to.
//!
//! Built-in dialects:
//!
//! | dialect      | placeholders  | params       |
//! |--------------|---------------|--------------|
//! | `sqlite`     | `?`           | positional   |
//! | `clickhouse` | `?`           | positional   |
//! | `postgresql` | `%(name)s`    | named        |
//! | `mysql`      | `%(name)s`    | named        |

pub mod errors;
pub mod registry;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::table::Value;

pub use errors::DialectError;
pub use registry::{
    builtin_extractor, default_registry, extract_params, register_dialect, DialectRegistry,
    ParamExtractor, BUILTIN_DIALECTS,
};

/// How placeholders are written into compiled SQL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ParamStyle {
    /// `?`
    Qmark,
    /// `$1`, `$2`, ...
    Numeric,
    /// `:name`
    Named,
    /// `%(name)s`
    Pyformat,
}

impl ParamStyle {
    /// Placeholder style a dialect's driver expects. Unknown dialects get `:name`.
    pub fn for_dialect(dialect: &str) -> Self {
        match normalize_dialect(dialect).as_str() {
            "sqlite" | "clickhouse" => ParamStyle::Qmark,
            "postgresql" | "mysql" => ParamStyle::Pyformat,
            _ => ParamStyle::Named,
        }
    }

    /// Render the placeholder for the `position`-th (1-based) bind called `name`
    pub fn placeholder(&self, name: &str, position: usize) -> String {
        match self {
            ParamStyle::Qmark => "?".to_string(),
            ParamStyle::Numeric => format!("${}", position),
            ParamStyle::Named => format!(":{}", name),
            ParamStyle::Pyformat => format!("%({})s", name),
        }
    }
}

/// Query rendered for one dialect: SQL text plus its parameter carrier
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CompiledStatement {
    pub sql: String,
    /// Every bind value, keyed by bind name
    pub binds: BTreeMap<String, Value>,
    /// Bind names in placeholder order
    pub positions: Vec<String>,
}

impl CompiledStatement {
    /// Bind values ordered by placeholder position. Missing names bind as `NULL`.
    pub fn positional_values(&self) -> Vec<Value> {
        self.positions
            .iter()
            .map(|name| self.binds.get(name).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

/// Bind parameters in the shape a driver expects
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Params {
    Positional(Vec<Value>),
    Named(BTreeMap<String, Value>),
}

impl Params {
    pub fn len(&self) -> usize {
        match self {
            Params::Positional(values) => values.len(),
            Params::Named(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_positional(&self) -> bool {
        matches!(self, Params::Positional(_))
    }
}

impl Default for Params {
    fn default() -> Self {
        Params::Positional(Vec::new())
    }
}

/// Dialect identifiers are compared case-insensitively
pub fn normalize_dialect(dialect: &str) -> String {
    dialect.trim().to_ascii_lowercase()
}
