use crate::domain::{Project, ProjectId, Task, TaskId, TaskUpdate};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited: retry after {0} seconds")]
    RateLimit(u64),

    #[error("API error: {0}")]
    Api(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Persistence gateway for projects and their tasks.
///
/// Task reads include the nested checklist and content ideas. Updates
/// carry keyed diffs of those collections so untouched items keep their
/// ids on the backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlannerRepository: Send + Sync {
    async fn list_projects(&self) -> RepositoryResult<Vec<Project>>;
    async fn create_project(&self, project: &Project) -> RepositoryResult<()>;
    async fn delete_project(&self, id: &ProjectId) -> RepositoryResult<()>;

    async fn list_tasks(&self) -> RepositoryResult<Vec<Task>>;
    async fn create_task(&self, task: &Task) -> RepositoryResult<()>;
    async fn update_task(&self, update: &TaskUpdate) -> RepositoryResult<()>;
    async fn delete_task(&self, id: &TaskId) -> RepositoryResult<()>;
}
