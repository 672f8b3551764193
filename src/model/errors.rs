use thiserror::Error;

/// Errors raised while building model instances from table rows
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ModelError {
    #[error("Model `{model}` requires field '{field}'")]
    MissingField { model: String, field: String },
    #[error("Field '{field}' expects {expected}, found {found}")]
    InvalidValue {
        field: String,
        expected: &'static str,
        found: String,
    },
    #[error("Table columns {columns:?} are not declared on model `{model}`")]
    UndeclaredColumns { model: String, columns: Vec<String> },
    #[error("{0}")]
    Custom(String),
}

impl ModelError {
    pub fn missing(model: impl Into<String>, field: impl Into<String>) -> Self {
        ModelError::MissingField {
            model: model.into(),
            field: field.into(),
        }
    }
}

/// Errors raised while loading a model catalog
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CatalogError {
    #[error("Failed to read catalog file: {error}")]
    ReadError { error: String },
    #[error("Failed to parse catalog: {error}")]
    ParseError { error: String },
    #[error("Model `{model}` is declared more than once")]
    DuplicateModel { model: String },
    #[error("Model `{model}` declares no columns")]
    NoColumns { model: String },
    #[error("Model `{model}`: {field} refers to undeclared column '{column}'")]
    UndeclaredColumn {
        model: String,
        field: &'static str,
        column: String,
    },
    #[error("No model named `{model}` in catalog")]
    UnknownModel { model: String },
}
