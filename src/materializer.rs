//! Query materialization: model query in, [`Table`] out.
//!
//! The materializer compiles the query through the engine, asks its
//! [`DialectRegistry`] how that engine wants its bind parameters, layers the call-site
//! read options over the model's defaults and hands everything to [`read_sql`].

use log::{debug, trace};
use thiserror::Error;

use crate::config::RedframeConfig;
use crate::dialect::{default_registry, DialectError, DialectRegistry};
use crate::engine::{Engine, EngineError};
use crate::model::{Model, ModelDescriptor};
use crate::query::Query;
use crate::table::{read_sql, ReadError, ReadOptions, ReadSpec, Table};

/// Failure of a materialization, by layer
#[derive(Debug, Error)]
pub enum MaterializeError {
    #[error(transparent)]
    UnsupportedDialect(#[from] DialectError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Read(#[from] ReadError),
}

#[derive(Debug, Clone)]
pub struct Materializer {
    registry: DialectRegistry,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Materializer {
    /// Materializer using a snapshot of the process-wide default registry
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }

    pub fn with_registry(registry: DialectRegistry) -> Self {
        Self { registry }
    }

    /// Default registry plus the dialect aliases declared in `config`
    pub fn from_config(config: &RedframeConfig) -> Result<Self, DialectError> {
        let mut registry = default_registry();
        for (alias, target) in &config.dialect_aliases {
            let extractor = registry.resolve(target)?;
            registry.register_shared(alias, extractor);
        }
        Ok(Self::with_registry(registry))
    }

    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DialectRegistry {
        &mut self.registry
    }

    /// Build the effective read arguments for `M` without executing anything
    pub fn read_spec<M: Model>(
        &self,
        engine: &dyn Engine,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<ReadSpec, MaterializeError> {
        self.read_spec_for(engine, M::descriptor(), query, options)
    }

    /// Like [`Materializer::read_spec`], for a descriptor without a Rust type
    pub fn read_spec_for(
        &self,
        engine: &dyn Engine,
        descriptor: &ModelDescriptor,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<ReadSpec, MaterializeError> {
        let query = query.unwrap_or_else(|| Query::for_model(descriptor));
        let compiled = engine.compile(&query)?;
        debug!(
            "Materializing {} on {}: {}",
            descriptor.name,
            engine.dialect(),
            compiled.sql
        );

        let extractor = self.registry.resolve(engine.dialect())?;
        let params = extractor(&compiled);
        let options = options.merged_over(&descriptor.read_options);
        trace!(
            "{} bind parameters, read options {:?}",
            params.len(),
            options.set_keys()
        );

        Ok(ReadSpec {
            sql: compiled.sql,
            params,
            options,
        })
    }

    /// Read `query` (or every row of `M`'s relation) into a table
    pub fn materialize<M: Model>(
        &self,
        engine: &dyn Engine,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<Table, MaterializeError> {
        self.materialize_descriptor(engine, M::descriptor(), query, options)
    }

    pub fn materialize_descriptor(
        &self,
        engine: &dyn Engine,
        descriptor: &ModelDescriptor,
        query: Option<Query>,
        options: ReadOptions,
    ) -> Result<Table, MaterializeError> {
        let spec = self.read_spec_for(engine, descriptor, query, options)?;
        let table = read_sql(&spec.sql, engine, &spec.params, &spec.options)?;
        trace!("Materialized {} rows for {}", table.len(), descriptor.name);
        Ok(table)
    }
}
