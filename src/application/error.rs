use crate::domain::DomainError;
use crate::ports::{ConfigError, GeneratorError, RepositoryError};
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AppError {
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("Schedule generation failed: {0}")]
    Generation(#[from] GeneratorError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Application error: {0}")]
    Application(String),
}

pub type AppResult<T> = Result<T, AppError>;
