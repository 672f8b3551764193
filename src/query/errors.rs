use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Query has no relation to select from")]
    EmptyRelation,
    #[error("Invalid identifier '{identifier}': expected [A-Za-z_][A-Za-z0-9_]*, optionally schema-qualified")]
    InvalidIdentifier { identifier: String },
    #[error("{clause} value {value} does not fit a signed 64-bit integer")]
    OutOfRange { clause: &'static str, value: u64 },
}
