use super::{PlannerClient, ProjectDto, TaskDto, TaskUpdateDto};
use crate::domain::{Project, ProjectId, Task, TaskId, TaskUpdate};
use crate::ports::{PlannerRepository, RepositoryResult};
use async_trait::async_trait;
use reqwest::Method;

#[derive(Clone)]
pub struct HttpPlannerRepository {
    client: PlannerClient,
}

impl HttpPlannerRepository {
    pub fn new(client: PlannerClient) -> Self {
        Self { client }
    }

    fn project_path(id: &ProjectId) -> String {
        format!("/projects/{}", urlencoding::encode(&id.0))
    }

    fn task_path(id: &TaskId) -> String {
        format!("/tasks/{}", urlencoding::encode(&id.0))
    }
}

#[async_trait]
impl PlannerRepository for HttpPlannerRepository {
    async fn list_projects(&self) -> RepositoryResult<Vec<Project>> {
        let dtos: Vec<ProjectDto> = self.client.get("/projects").await?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    async fn create_project(&self, project: &Project) -> RepositoryResult<()> {
        self.client
            .send(Method::POST, "/projects", &ProjectDto::from(project))
            .await
    }

    async fn delete_project(&self, id: &ProjectId) -> RepositoryResult<()> {
        self.client.delete(&Self::project_path(id)).await
    }

    async fn list_tasks(&self) -> RepositoryResult<Vec<Task>> {
        let dtos: Vec<TaskDto> = self.client.get("/tasks").await?;
        let mut tasks = Vec::with_capacity(dtos.len());
        for dto in dtos {
            let id = dto.id.clone();
            match Task::try_from(dto) {
                Ok(task) => tasks.push(task),
                // One malformed row shouldn't hide the rest of the calendar.
                Err(e) => tracing::warn!("Skipping task {}: {}", id, e),
            }
        }
        Ok(tasks)
    }

    async fn create_task(&self, task: &Task) -> RepositoryResult<()> {
        self.client
            .send(Method::POST, "/tasks", &TaskDto::from(task))
            .await
    }

    async fn update_task(&self, update: &TaskUpdate) -> RepositoryResult<()> {
        self.client
            .send(
                Method::PUT,
                &Self::task_path(&update.task.id),
                &TaskUpdateDto::from(update),
            )
            .await
    }

    async fn delete_task(&self, id: &TaskId) -> RepositoryResult<()> {
        self.client.delete(&Self::task_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_encode_ids() {
        assert_eq!(
            HttpPlannerRepository::task_path(&TaskId::from("a b/c")),
            "/tasks/a%20b%2Fc"
        );
        assert_eq!(
            HttpPlannerRepository::project_path(&ProjectId::from("p1")),
            "/projects/p1"
        );
    }
}
