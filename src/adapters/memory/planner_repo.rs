use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{Project, ProjectId, Task, TaskId, TaskUpdate};
use crate::ports::{PlannerRepository, RepositoryError, RepositoryResult};

/// Process-local gateway. Backs `--offline` runs and the service tests.
#[derive(Default)]
pub struct InMemoryPlannerRepository {
    projects: DashMap<ProjectId, Project>,
    tasks: DashMap<TaskId, Task>,
}

impl InMemoryPlannerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(projects: Vec<Project>, tasks: Vec<Task>) -> Self {
        let repo = Self::new();
        for project in projects {
            repo.projects.insert(project.id.clone(), project);
        }
        for task in tasks {
            repo.tasks.insert(task.id.clone(), task);
        }
        repo
    }

    pub fn stored_task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).map(|t| t.clone())
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }
}

#[async_trait]
impl PlannerRepository for InMemoryPlannerRepository {
    async fn list_projects(&self) -> RepositoryResult<Vec<Project>> {
        let mut projects: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    async fn create_project(&self, project: &Project) -> RepositoryResult<()> {
        self.projects.insert(project.id.clone(), project.clone());
        Ok(())
    }

    async fn delete_project(&self, id: &ProjectId) -> RepositoryResult<()> {
        self.projects
            .remove(id)
            .ok_or_else(|| RepositoryError::NotFound(format!("project {id}")))?;
        self.tasks.retain(|_, task| &task.project_id != id);
        Ok(())
    }

    async fn list_tasks(&self) -> RepositoryResult<Vec<Task>> {
        Ok(self.tasks.iter().map(|t| t.clone()).collect())
    }

    async fn create_task(&self, task: &Task) -> RepositoryResult<()> {
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(())
    }

    async fn update_task(&self, update: &TaskUpdate) -> RepositoryResult<()> {
        let mut stored = self
            .tasks
            .get_mut(&update.task.id)
            .ok_or_else(|| RepositoryError::NotFound(format!("task {}", update.task.id)))?;

        let mut checklist = std::mem::take(&mut stored.checklist);
        let mut content_ideas = std::mem::take(&mut stored.content_ideas);
        update.checklist.apply(&mut checklist);
        update.content_ideas.apply(&mut content_ideas);

        *stored = Task {
            checklist,
            content_ideas,
            ..update.task.clone()
        };
        Ok(())
    }

    async fn delete_task(&self, id: &TaskId) -> RepositoryResult<()> {
        self.tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| RepositoryError::NotFound(format!("task {id}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::fixtures::{item, task};
    use crate::domain::ChecklistItemId;

    #[tokio::test]
    async fn test_update_applies_keyed_diff() {
        let mut original = task("t1", "p", "2024-12-05", "10:00", "11:00");
        original.checklist = vec![item("a", "One", false), item("b", "Two", false)];
        let repo = InMemoryPlannerRepository::with_data(vec![], vec![original.clone()]);

        let mut edited = original.clone();
        edited.title = "Renamed".to_string();
        edited.checklist[0].completed = true;
        edited.checklist.remove(1);

        repo.update_task(&TaskUpdate::between(&original, &edited))
            .await
            .unwrap();

        let stored = repo.stored_task(&"t1".into()).unwrap();
        assert_eq!(stored.title, "Renamed");
        assert_eq!(stored.checklist.len(), 1);
        assert_eq!(stored.checklist[0].id, ChecklistItemId::from("a"));
        assert!(stored.checklist[0].completed);
    }

    #[tokio::test]
    async fn test_update_keeps_local_checklist_order() {
        let mut original = task("t1", "p", "2024-12-05", "10:00", "11:00");
        original.checklist = vec![item("a", "One", false), item("b", "Two", false)];
        let repo = InMemoryPlannerRepository::with_data(vec![], vec![original.clone()]);

        let mut edited = original.clone();
        edited.checklist.insert(1, item("x", "Between", false));
        repo.update_task(&TaskUpdate::between(&original, &edited))
            .await
            .unwrap();
        assert_eq!(repo.stored_task(&"t1".into()).unwrap().checklist, edited.checklist);

        let mut reordered = edited.clone();
        reordered.checklist.reverse();
        repo.update_task(&TaskUpdate::between(&edited, &reordered))
            .await
            .unwrap();
        assert_eq!(repo.stored_task(&"t1".into()).unwrap().checklist, reordered.checklist);
    }

    #[tokio::test]
    async fn test_delete_project_cascades_to_tasks() {
        let project = Project {
            id: "p".into(),
            name: "Family".to_string(),
            color: "#3b82f6".to_string(),
            description: None,
        };
        let repo = InMemoryPlannerRepository::with_data(
            vec![project],
            vec![
                task("t1", "p", "2024-12-05", "10:00", "11:00"),
                task("t2", "other", "2024-12-05", "10:00", "11:00"),
            ],
        );
        repo.delete_project(&"p".into()).await.unwrap();
        assert!(repo.list_projects().await.unwrap().is_empty());
        assert_eq!(repo.task_count(), 1);
        assert!(matches!(
            repo.delete_task(&"t1".into()).await,
            Err(RepositoryError::NotFound(_))
        ));
    }

    #[test]
    fn test_update_of_unknown_task_is_not_found() {
        let repo = InMemoryPlannerRepository::new();
        let ghost = task("ghost", "p", "2024-12-05", "10:00", "11:00");
        let result = tokio_test::block_on(repo.update_task(&TaskUpdate::between(&ghost, &ghost)));
        assert!(matches!(result, Err(RepositoryError::NotFound(_))));
        assert_eq!(repo.task_count(), 0);
    }
}
