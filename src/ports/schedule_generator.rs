use crate::domain::{Project, TaskDraft};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeneratorError {
    #[error("Generator not configured: {0}")]
    NotConfigured(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid generator output: {0}")]
    InvalidOutput(String),
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Turns a natural-language request into draft tasks for the given
/// projects. Drafts are unvalidated; callers check them before use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScheduleGenerator: Send + Sync {
    async fn generate(
        &self,
        projects: &[Project],
        prompt: &str,
        target_year: i32,
    ) -> GeneratorResult<Vec<TaskDraft>>;
}
