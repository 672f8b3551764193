use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use super::errors::CatalogError;
use super::ModelDescriptor;

/// Model catalog loaded from YAML.
///
/// Catalogs let schema-driven tools (the CLI, notebooks, generic exporters) work with
/// models that have no Rust type. The file format is:
///
/// ```yaml
/// models:
///   - name: Widget            # Model name used for lookups
///     table: widgets          # Relation to select from
///     columns: [timestamp, name, kind, units]
///     primary_key: timestamp  # Optional, must be a declared column
///     read_options:           # Optional per-model read defaults
///       index_col: timestamp
///       parse_dates: [timestamp]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    pub models: Vec<ModelDescriptor>,
}

impl ModelCatalog {
    /// Load and validate a catalog from a YAML file
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::ReadError {
            error: format!("{}: {}", path.display(), e),
        })?;
        let catalog = Self::from_yaml_str(&contents)?;
        debug!(
            "Loaded {} models from {}",
            catalog.models.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parse and validate a catalog from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_yaml::from_str(yaml).map_err(|e| CatalogError::ParseError {
            error: e.to_string(),
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Structural validation: unique names, non-empty column lists, and every column
    /// named by `primary_key` or the read options is declared.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for model in &self.models {
            if !seen.insert(model.name.as_str()) {
                return Err(CatalogError::DuplicateModel {
                    model: model.name.clone(),
                });
            }
            if model.columns.is_empty() {
                return Err(CatalogError::NoColumns {
                    model: model.name.clone(),
                });
            }

            let options = &model.read_options;
            let referenced = model
                .primary_key
                .iter()
                .map(|c| ("primary_key", c))
                .chain(options.index_col.iter().map(|c| ("index_col", c)))
                .chain(
                    options
                        .parse_dates
                        .iter()
                        .flatten()
                        .map(|c| ("parse_dates", c)),
                )
                .chain(options.columns.iter().flatten().map(|c| ("columns", c)));
            for (field, column) in referenced {
                if !model.declares(column) {
                    return Err(CatalogError::UndeclaredColumn {
                        model: model.name.clone(),
                        field,
                        column: column.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<&ModelDescriptor, CatalogError> {
        self.models
            .iter()
            .find(|m| m.name == name)
            .ok_or_else(|| CatalogError::UnknownModel {
                model: name.to_string(),
            })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|m| m.name.as_str())
    }
}
