use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Invalid time format: {0}")]
    InvalidTime(String),

    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    #[error("Invalid interval: start {start} must be before end {end}")]
    InvalidInterval { start: String, end: String },

    #[error("Invalid color: {0}")]
    InvalidColor(String),

    #[error("Required field missing: {0}")]
    MissingField(String),
}

pub type DomainResult<T> = Result<T, DomainError>;
