//! Redframe - relational models read into tables and back into instances
//!
//! This crate bridges a relational model layer and a tabular data layer:
//! - Model queries compiled per SQL dialect
//! - Dialect-agnostic bind parameter extraction through a pluggable registry
//! - `read_sql` style materialization with per-model read options
//! - Lazy parsing of table rows back into model instances

pub mod bridge;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod materializer;
pub mod model;
pub mod parser;
pub mod query;
pub mod table;

pub use bridge::{frame, materialize, parse, Bridge, DefaultBridge};
pub use config::{ConfigError, RedframeConfig};
pub use dialect::{register_dialect, DialectError, DialectRegistry, ParamStyle, Params};
pub use engine::{Engine, EngineError, MemoryEngine, ResultSet};
pub use materializer::{MaterializeError, Materializer};
pub use model::{FieldMap, Model, ModelCatalog, ModelDescriptor, ModelError, Record};
pub use parser::{ParseOptions, Parsed};
pub use query::{Direction, Op, Query, QueryError};
pub use table::{read_sql, ReadOptions, Table, Value};
