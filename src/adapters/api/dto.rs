use crate::domain::time::{parse_task_date, ClockTime};
use crate::domain::*;
use serde::{Deserialize, Serialize};

// DTOs for API communication. The backend speaks camelCase JSON.

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDto {
    pub id: String,
    pub name: String,
    pub color: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChecklistItemDto {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ContentIdeaDto {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ContentIdeaType,
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDto {
    pub id: String,
    pub project_id: String,
    pub title: String,
    /// `YYYY-MM-DD` or a full timestamp, depending on the backend.
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub checklist: Vec<ChecklistItemDto>,
    #[serde(default)]
    pub content_ideas: Vec<ContentIdeaDto>,
}

// Request DTOs
#[derive(Debug, Serialize)]
pub struct CollectionDiffDto<T, K> {
    pub upsert: Vec<T>,
    pub delete: Vec<K>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub order: Vec<K>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskUpdateDto {
    pub project_id: String,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    pub completed: bool,
    pub checklist: CollectionDiffDto<ChecklistItemDto, String>,
    pub content_ideas: CollectionDiffDto<ContentIdeaDto, String>,
}

// Conversion implementations
impl From<ProjectDto> for Project {
    fn from(dto: ProjectDto) -> Self {
        Self {
            id: ProjectId(dto.id),
            name: dto.name,
            color: dto.color.unwrap_or_else(|| FALLBACK_COLOR.to_string()),
            description: dto.description.filter(|d| !d.is_empty()),
        }
    }
}

impl From<&Project> for ProjectDto {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.0.clone(),
            name: project.name.clone(),
            color: Some(project.color.clone()),
            description: project.description.clone(),
        }
    }
}

impl From<ChecklistItemDto> for ChecklistItem {
    fn from(dto: ChecklistItemDto) -> Self {
        Self {
            id: ChecklistItemId(dto.id),
            text: dto.text,
            completed: dto.completed,
        }
    }
}

impl From<&ChecklistItem> for ChecklistItemDto {
    fn from(item: &ChecklistItem) -> Self {
        Self {
            id: item.id.0.clone(),
            text: item.text.clone(),
            completed: item.completed,
        }
    }
}

impl From<ContentIdeaDto> for ContentIdea {
    fn from(dto: ContentIdeaDto) -> Self {
        Self {
            id: ContentIdeaId(dto.id),
            kind: dto.kind,
            text: dto.text,
        }
    }
}

impl From<&ContentIdea> for ContentIdeaDto {
    fn from(idea: &ContentIdea) -> Self {
        Self {
            id: idea.id.0.clone(),
            kind: idea.kind,
            text: idea.text.clone(),
        }
    }
}

impl TryFrom<TaskDto> for Task {
    type Error = DomainError;

    /// Normalizes the wire date and times. The interval itself isn't
    /// checked here so a bad row can still be listed and fixed.
    fn try_from(dto: TaskDto) -> DomainResult<Self> {
        Ok(Self {
            id: TaskId(dto.id),
            project_id: ProjectId(dto.project_id),
            title: dto.title,
            date: parse_task_date(&dto.date)?,
            start_time: ClockTime::parse(&dto.start_time)?,
            end_time: ClockTime::parse(&dto.end_time)?,
            description: dto.description.filter(|d| !d.is_empty()),
            checklist: dto.checklist.into_iter().map(Into::into).collect(),
            content_ideas: dto.content_ideas.into_iter().map(Into::into).collect(),
            completed: dto.completed,
        })
    }
}

impl From<&Task> for TaskDto {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.0.clone(),
            project_id: task.project_id.0.clone(),
            title: task.title.clone(),
            date: task.date.format("%Y-%m-%d").to_string(),
            start_time: task.start_time.to_string(),
            end_time: task.end_time.to_string(),
            description: task.description.clone(),
            completed: task.completed,
            checklist: task.checklist.iter().map(Into::into).collect(),
            content_ideas: task.content_ideas.iter().map(Into::into).collect(),
        }
    }
}

impl From<&TaskUpdate> for TaskUpdateDto {
    fn from(update: &TaskUpdate) -> Self {
        let task = &update.task;
        Self {
            project_id: task.project_id.0.clone(),
            title: task.title.clone(),
            date: task.date.format("%Y-%m-%d").to_string(),
            start_time: task.start_time.to_string(),
            end_time: task.end_time.to_string(),
            description: task.description.clone(),
            completed: task.completed,
            checklist: CollectionDiffDto {
                upsert: update.checklist.upserts.iter().map(Into::into).collect(),
                delete: update.checklist.deletes.iter().map(|id| id.0.clone()).collect(),
                order: update.checklist.order.iter().map(|id| id.0.clone()).collect(),
            },
            content_ideas: CollectionDiffDto {
                upsert: update.content_ideas.upserts.iter().map(Into::into).collect(),
                delete: update.content_ideas.deletes.iter().map(|id| id.0.clone()).collect(),
                order: update.content_ideas.order.iter().map(|id| id.0.clone()).collect(),
            },
        }
    }
}
