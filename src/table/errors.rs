use thiserror::Error;

/// Errors raised while shaping engine output into a [`super::Table`]
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReadError {
    #[error("Option `{option}` names column '{column}' which is not in the result")]
    UnknownColumn { option: &'static str, column: String },
    #[error("Row {row} has {found} values, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Index has {found} values but table has {expected} rows")]
    IndexLength { expected: usize, found: usize },
    #[error("Cannot parse '{value}' in column '{column}' as a date: {reason}")]
    DateParse {
        column: String,
        value: String,
        reason: String,
    },
}
