use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::task::JoinHandle;

use super::{AppError, AppResult};
use crate::domain::progress::{project_progress, ProjectProgress, Rgb};
use crate::domain::time::{parse_task_date, ClockTime, TimeInterval};
use crate::domain::*;
use crate::ports::{
    Cache, GeneratorError, PlannerRepository, RepositoryResult, ScheduleGenerator,
};

const PROJECTS_CACHE_KEY: &str = "projects";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub projects: usize,
    pub tasks: usize,
}

/// Field edits for an existing task, as typed by the user. `None` leaves
/// the field alone.
#[derive(Debug, Clone, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub project_id: Option<ProjectId>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<Option<String>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub content_ideas: Option<Vec<ContentIdea>>,
}

impl TaskEdit {
    /// Applies the edit to a copy of `task`. Fails without touching
    /// anything if a date or time doesn't parse or the interval inverts.
    pub fn apply_to(&self, task: &Task) -> DomainResult<Task> {
        let mut edited = task.clone();
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(DomainError::MissingField("title".to_string()));
            }
            edited.title = title.clone();
        }
        if let Some(project_id) = &self.project_id {
            edited.project_id = project_id.clone();
        }
        if let Some(date) = &self.date {
            edited.date = parse_task_date(date)?;
        }
        if let Some(start) = &self.start_time {
            edited.start_time = ClockTime::parse(start)?;
        }
        if let Some(end) = &self.end_time {
            edited.end_time = ClockTime::parse(end)?;
        }
        if let Some(description) = &self.description {
            edited.description = description.clone();
        }
        if let Some(checklist) = &self.checklist {
            edited.checklist = checklist.clone();
        }
        if let Some(ideas) = &self.content_ideas {
            edited.content_ideas = ideas.clone();
        }
        TimeInterval::new(edited.start_time, edited.end_time)?;
        Ok(edited)
    }
}

/// In-memory projects and tasks with optimistic writes.
///
/// Every mutation lands in local state first. The matching gateway call
/// is spawned afterwards; a failure is logged and the local state is kept
/// as-is. Input that doesn't parse is rejected before anything changes.
pub struct PlannerService {
    repository: Arc<dyn PlannerRepository>,
    generator: Option<Arc<dyn ScheduleGenerator>>,
    project_cache: Arc<dyn Cache<String, Vec<Project>>>,

    projects: DashMap<ProjectId, Project>,
    tasks: DashMap<TaskId, Task>,
    loading: AtomicBool,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl PlannerService {
    pub fn new(
        repository: Arc<dyn PlannerRepository>,
        project_cache: Arc<dyn Cache<String, Vec<Project>>>,
    ) -> Self {
        Self {
            repository,
            generator: None,
            project_cache,
            projects: DashMap::new(),
            tasks: DashMap::new(),
            loading: AtomicBool::new(false),
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn ScheduleGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Replaces local state with the gateway's. Failures are logged and
    /// leave the corresponding collection empty.
    pub async fn load(&self, use_cache: bool) -> LoadSummary {
        self.loading.store(true, Ordering::SeqCst);

        let (projects, tasks) = tokio::join!(
            self.fetch_projects(use_cache),
            self.repository.list_tasks()
        );

        self.projects.clear();
        self.tasks.clear();

        match projects {
            Ok(projects) => {
                for project in projects {
                    self.projects.insert(project.id.clone(), project);
                }
            }
            Err(e) => tracing::error!("Failed to load projects: {}", e),
        }
        match tasks {
            Ok(tasks) => {
                for task in tasks {
                    self.tasks.insert(task.id.clone(), task);
                }
            }
            Err(e) => tracing::error!("Failed to load tasks: {}", e),
        }

        self.loading.store(false, Ordering::SeqCst);
        let summary = LoadSummary {
            projects: self.projects.len(),
            tasks: self.tasks.len(),
        };
        tracing::info!("Loaded {} projects and {} tasks", summary.projects, summary.tasks);
        summary
    }

    async fn fetch_projects(&self, use_cache: bool) -> RepositoryResult<Vec<Project>> {
        let key = PROJECTS_CACHE_KEY.to_string();
        if use_cache {
            if let Some(projects) = self.project_cache.get(&key).await {
                return Ok(projects);
            }
        }
        let projects = self.repository.list_projects().await?;
        self.project_cache.insert(key, projects.clone()).await;
        Ok(projects)
    }

    /// Issues a gateway call in the background. The handle is kept so
    /// short-lived callers can wait with [`PlannerService::flush`].
    fn persist<F, Fut>(&self, action: String, op: F)
    where
        F: FnOnce(Arc<dyn PlannerRepository>) -> Fut,
        Fut: Future<Output = RepositoryResult<()>> + Send + 'static,
    {
        let call = op(self.repository.clone());
        let handle = tokio::spawn(async move {
            match call.await {
                Ok(()) => tracing::debug!("Persisted: {}", action),
                Err(e) => tracing::error!("Failed to {}: {}", action, e),
            }
        });

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        pending.retain(|h| !h.is_finished());
        pending.push(handle);
    }

    /// Waits for every gateway call issued so far.
    pub async fn flush(&self) {
        let handles: Vec<JoinHandle<()>> = {
            let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
            pending.drain(..).collect()
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::error!("Persistence task panicked: {}", e);
            }
        }
    }

    pub fn projects(&self) -> Vec<Project> {
        let mut projects: Vec<Project> = self.projects.iter().map(|p| p.clone()).collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        projects
    }

    pub fn project(&self, id: &ProjectId) -> Option<Project> {
        self.projects.get(id).map(|p| p.clone())
    }

    /// All tasks ordered by date, then start time.
    pub fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = self.tasks.iter().map(|t| t.clone()).collect();
        tasks.sort_by(|a, b| {
            (a.date, a.start_time, &a.title, &a.id).cmp(&(b.date, b.start_time, &b.title, &b.id))
        });
        tasks
    }

    pub fn tasks_on(&self, date: NaiveDate) -> Vec<Task> {
        self.tasks().into_iter().filter(|t| t.date == date).collect()
    }

    pub fn task(&self, id: &TaskId) -> Option<Task> {
        self.tasks.get(id).map(|t| t.clone())
    }

    pub fn project_progress(&self) -> Vec<ProjectProgress> {
        project_progress(&self.projects(), &self.tasks())
    }

    pub async fn create_project(
        &self,
        name: &str,
        color: &str,
        description: Option<String>,
    ) -> AppResult<Project> {
        if name.trim().is_empty() {
            return Err(DomainError::MissingField("name".to_string()).into());
        }
        if Rgb::from_hex(color).is_none() {
            tracing::error!("Rejected project color {:?}", color);
            return Err(DomainError::InvalidColor(color.to_string()).into());
        }

        let mut project = Project::new(name.trim(), color.trim());
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            project = project.with_description(description);
        }

        self.projects.insert(project.id.clone(), project.clone());
        self.project_cache.remove(&PROJECTS_CACHE_KEY.to_string()).await;

        let stored = project.clone();
        self.persist(format!("create project {}", project.id), move |repo| async move {
            repo.create_project(&stored).await
        });
        Ok(project)
    }

    /// Removes the project and, locally, every task that belonged to it.
    pub async fn delete_project(&self, id: &ProjectId) -> AppResult<()> {
        if self.projects.remove(id).is_none() {
            return Err(AppError::NotFound(format!("project {id}")));
        }
        self.tasks.retain(|_, task| &task.project_id != id);
        self.project_cache.remove(&PROJECTS_CACHE_KEY.to_string()).await;

        let id = id.clone();
        self.persist(format!("delete project {id}"), move |repo| async move {
            repo.delete_project(&id).await
        });
        Ok(())
    }

    pub fn create_task(&self, draft: TaskDraft) -> AppResult<Task> {
        let task = draft.into_task().map_err(|e| {
            tracing::error!("Rejected new task: {}", e);
            AppError::from(e)
        })?;

        self.tasks.insert(task.id.clone(), task.clone());
        let stored = task.clone();
        self.persist(format!("create task {}", task.id), move |repo| async move {
            repo.create_task(&stored).await
        });
        Ok(task)
    }

    /// Replaces a task wholesale. Nested items are sent as keyed diffs
    /// against the previous local version.
    pub fn update_task(&self, task: Task) -> AppResult<Task> {
        task.interval().map_err(|e| {
            tracing::error!("Rejected update of task {}: {}", task.id, e);
            AppError::from(e)
        })?;
        let previous = self
            .task(&task.id)
            .ok_or_else(|| AppError::NotFound(format!("task {}", task.id)))?;

        let update = TaskUpdate::between(&previous, &task);
        tracing::debug!(
            "Updating task {} (checklist changed: {}, content ideas changed: {})",
            task.id,
            !update.checklist.is_empty(),
            !update.content_ideas.is_empty()
        );
        self.tasks.insert(task.id.clone(), task.clone());
        self.persist(format!("update task {}", task.id), move |repo| async move {
            repo.update_task(&update).await
        });
        Ok(task)
    }

    pub fn edit_task(&self, id: &TaskId, edit: &TaskEdit) -> AppResult<Task> {
        let current = self
            .task(id)
            .ok_or_else(|| AppError::NotFound(format!("task {id}")))?;
        let edited = edit.apply_to(&current).map_err(|e| {
            tracing::error!("Rejected edit of task {}: {}", id, e);
            AppError::from(e)
        })?;
        self.update_task(edited)
    }

    pub fn toggle_completed(&self, id: &TaskId) -> AppResult<Task> {
        let mut task = self
            .task(id)
            .ok_or_else(|| AppError::NotFound(format!("task {id}")))?;
        task.completed = !task.completed;
        self.update_task(task)
    }

    pub fn toggle_checklist_item(&self, task_id: &TaskId, item_id: &ChecklistItemId) -> AppResult<Task> {
        let mut task = self
            .task(task_id)
            .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;
        if !task.toggle_checklist_item(item_id) {
            return Err(AppError::NotFound(format!("checklist item {item_id}")));
        }
        self.update_task(task)
    }

    /// Drag-and-drop onto another day. `Ok(None)` when dropped back on
    /// its own date.
    pub fn move_task(&self, id: &TaskId, date: NaiveDate) -> AppResult<Option<Task>> {
        let task = self
            .task(id)
            .ok_or_else(|| AppError::NotFound(format!("task {id}")))?;
        match task.moved_to(date) {
            Some(moved) => self.update_task(moved).map(Some),
            None => Ok(None),
        }
    }

    pub fn delete_task(&self, id: &TaskId) -> AppResult<()> {
        if self.tasks.remove(id).is_none() {
            return Err(AppError::NotFound(format!("task {id}")));
        }
        let id = id.clone();
        self.persist(format!("delete task {id}"), move |repo| async move {
            repo.delete_task(&id).await
        });
        Ok(())
    }

    /// Asks the generator for a schedule and creates every task it
    /// returns. All drafts must be valid or none are kept.
    pub async fn generate_schedule(&self, prompt: &str, target_year: i32) -> AppResult<Vec<Task>> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            GeneratorError::NotConfigured("no AI API key configured".to_string())
        })?;
        if prompt.trim().is_empty() {
            return Err(DomainError::MissingField("prompt".to_string()).into());
        }

        let projects = self.projects();
        if projects.is_empty() {
            return Err(AppError::Application(
                "Create a project before generating a schedule".to_string(),
            ));
        }

        let drafts = generator
            .generate(&projects, prompt, target_year)
            .await
            .map_err(|e| {
                tracing::error!("Schedule generation failed: {}", e);
                AppError::from(e)
            })?;
        let tasks = accept_generated(drafts, &projects).map_err(|e| {
            tracing::error!("Discarding generated schedule: {}", e);
            AppError::from(e)
        })?;

        for task in &tasks {
            self.tasks.insert(task.id.clone(), task.clone());
            let stored = task.clone();
            self.persist(format!("create task {}", task.id), move |repo| async move {
                repo.create_task(&stored).await
            });
        }
        tracing::info!("Generated {} tasks", tasks.len());
        Ok(tasks)
    }
}

/// Validates generator drafts against the projects they were generated
/// for. Missing lists were already defaulted to empty by the adapter;
/// dates outside the requested month are accepted.
pub fn accept_generated(drafts: Vec<TaskDraft>, projects: &[Project]) -> Result<Vec<Task>, GeneratorError> {
    let known: HashSet<&str> = projects.iter().map(|p| p.id.0.as_str()).collect();

    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            if !known.contains(draft.project_id.as_str()) {
                return Err(GeneratorError::InvalidOutput(format!(
                    "entry {index} references unknown project {:?}",
                    draft.project_id
                )));
            }
            draft
                .into_task()
                .map_err(|e| GeneratorError::InvalidOutput(format!("entry {index}: {e}")))
        })
        .collect()
}
