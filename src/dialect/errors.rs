use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialectError {
    #[error(
        "Unsupported dialect `{dialect}`: no parameter extractor is registered or built in"
    )]
    Unsupported { dialect: String },
}
