//! The `{materialize, parse}` capability a model type uses.
//!
//! Every [`Model`] gets a [`Bridge`] from [`Model::bridge`]. The default one reads
//! through a [`Materializer`] and parses with [`parse_models`]; a model that needs
//! something else (a different registry, post-processing, caching) returns its own
//! implementation instead. The free functions here always dispatch through the model's
//! bridge.

use crate::engine::Engine;
use crate::materializer::{MaterializeError, Materializer};
use crate::model::{Model, ModelError};
use crate::parser::{parse_models, ParseOptions};
use crate::query::Query;
use crate::table::{ReadOptions, Table};

/// Boxed stream of parsed instances
pub type ParsedModels<M> = Box<dyn Iterator<Item = Result<M, ModelError>>>;

pub trait Bridge<M: Model> {
    fn materialize(
        &self,
        engine: &dyn Engine,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<Table, MaterializeError>;

    fn parse(&self, table: Table, options: ParseOptions) -> ParsedModels<M>;
}

#[derive(Debug, Clone, Default)]
pub struct DefaultBridge {
    materializer: Materializer,
}

impl DefaultBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_materializer(materializer: Materializer) -> Self {
        Self { materializer }
    }
}

impl<M: Model> Bridge<M> for DefaultBridge {
    fn materialize(
        &self,
        engine: &dyn Engine,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<Table, MaterializeError> {
        self.materializer.materialize::<M>(engine, query, options)
    }

    fn parse(&self, table: Table, options: ParseOptions) -> ParsedModels<M> {
        Box::new(parse_models::<M>(table, options))
    }
}

/// Materialize `M` through its bridge
pub fn materialize<M: Model>(
    engine: &dyn Engine,
    query: Option<Query>,
    options: ReadOptions,
) -> Result<Table, MaterializeError> {
    M::bridge().materialize(engine, query, options)
}

/// Parse `table` into `M` through its bridge.
///
/// `options` accepts a bare `bool` for the `parse_index` flag.
pub fn parse<M: Model>(table: Table, options: impl Into<ParseOptions>) -> ParsedModels<M> {
    M::bridge().parse(table, options.into())
}

/// Materialize `M`, then fold `transformations` over the table left to right
pub fn frame<M: Model>(
    engine: &dyn Engine,
    query: Option<Query>,
    options: ReadOptions,
    transformations: &[&dyn Fn(Table) -> Table],
) -> Result<Table, MaterializeError> {
    let table = materialize::<M>(engine, query, options)?;
    Ok(transformations
        .iter()
        .fold(table, |table, transform| transform(table)))
}
