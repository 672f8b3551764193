//! Dialect → parameter extractor registry
//!
//! Maps a dialect identifier to the function that turns a compiled statement into
//! driver-ready bind parameters.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use super::errors::DialectError;
use super::{normalize_dialect, CompiledStatement, Params};

/// Extracts bind parameters from a compiled statement
pub type ParamExtractor = Arc<dyn Fn(&CompiledStatement) -> Params + Send + Sync>;

/// Dialects that resolve even when nothing was registered for them
pub const BUILTIN_DIALECTS: &[&str] = &["clickhouse", "mysql", "postgresql", "sqlite"];

/// Ordered sequence, one value per placeholder
fn positional_params(compiled: &CompiledStatement) -> Params {
    Params::Positional(compiled.positional_values())
}

/// Name → value mapping
fn named_params(compiled: &CompiledStatement) -> Params {
    Params::Named(compiled.binds.clone())
}

// Static built-in extractor table
lazy_static::lazy_static! {
    static ref BUILTIN_EXTRACTORS: HashMap<&'static str, ParamExtractor> = {
        let mut m: HashMap<&'static str, ParamExtractor> = HashMap::new();

        // qmark drivers bind by position
        m.insert("sqlite", Arc::new(positional_params));
        m.insert("clickhouse", Arc::new(positional_params));

        // pyformat drivers bind by name
        m.insert("postgresql", Arc::new(named_params));
        m.insert("mysql", Arc::new(named_params));

        m
    };

    static ref DEFAULT_REGISTRY: RwLock<DialectRegistry> =
        RwLock::new(DialectRegistry::with_builtins());
}

/// Built-in extractor for `dialect`, if it has one
pub fn builtin_extractor(dialect: &str) -> Option<ParamExtractor> {
    BUILTIN_EXTRACTORS
        .get(normalize_dialect(dialect).as_str())
        .cloned()
}

/// Registry of parameter extractors keyed by dialect identifier.
///
/// Registration replaces any previous entry for the same dialect. Lookups fall back to
/// the built-in table, so an empty registry still resolves the built-in dialects.
#[derive(Clone, Default)]
pub struct DialectRegistry {
    extractors: HashMap<String, ParamExtractor>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.dialects())
            .finish()
    }
}

impl DialectRegistry {
    /// Registry with no entries of its own
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry pre-seeded with every built-in dialect
    pub fn with_builtins() -> Self {
        let extractors = BUILTIN_EXTRACTORS
            .iter()
            .map(|(name, extractor)| (name.to_string(), Arc::clone(extractor)))
            .collect();
        Self { extractors }
    }

    /// Insert or replace the extractor for `dialect`
    pub fn register<F>(&mut self, dialect: &str, extractor: F)
    where
        F: Fn(&CompiledStatement) -> Params + Send + Sync + 'static,
    {
        self.register_shared(dialect, Arc::new(extractor));
    }

    /// Insert or replace the extractor for `dialect` with an already shared one
    pub fn register_shared(&mut self, dialect: &str, extractor: ParamExtractor) {
        let key = normalize_dialect(dialect);
        if self.extractors.insert(key.clone(), extractor).is_some() {
            debug!("Replaced parameter extractor for dialect '{}'", key);
        } else {
            debug!("Registered parameter extractor for dialect '{}'", key);
        }
    }

    /// Look up the extractor for `dialect`.
    ///
    /// Registered entries win over built-ins.
    pub fn resolve(&self, dialect: &str) -> Result<ParamExtractor, DialectError> {
        let key = normalize_dialect(dialect);
        if let Some(extractor) = self.extractors.get(&key) {
            return Ok(Arc::clone(extractor));
        }
        builtin_extractor(&key).ok_or(DialectError::Unsupported { dialect: key })
    }

    /// Resolve the extractor for `dialect` and apply it to `compiled`
    pub fn extract(
        &self,
        dialect: &str,
        compiled: &CompiledStatement,
    ) -> Result<Params, DialectError> {
        let extractor = self.resolve(dialect)?;
        Ok(extractor(compiled))
    }

    pub fn contains(&self, dialect: &str) -> bool {
        self.extractors.contains_key(&normalize_dialect(dialect))
    }

    /// Registered dialect identifiers, sorted
    pub fn dialects(&self) -> Vec<String> {
        let mut names: Vec<String> = self.extractors.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Register `extractor` for `dialect` in the process-wide default registry.
///
/// Materializers copy the default registry when they are built, so registrations made
/// afterwards do not reach existing materializers.
pub fn register_dialect<F>(dialect: &str, extractor: F)
where
    F: Fn(&CompiledStatement) -> Params + Send + Sync + 'static,
{
    DEFAULT_REGISTRY
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .register(dialect, extractor);
}

/// Snapshot of the process-wide default registry
pub fn default_registry() -> DialectRegistry {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Extract parameters using the process-wide default registry
pub fn extract_params(
    dialect: &str,
    compiled: &CompiledStatement,
) -> Result<Params, DialectError> {
    DEFAULT_REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .extract(dialect, compiled)
}
