use crate::domain::{ContentIdeaType, Project, TaskDraft};
use crate::ports::{GeneratorError, GeneratorResult, ScheduleGenerator};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

const SYSTEM_PROMPT: &str = "You plan family and content-creation schedules. \
Answer with a JSON object {\"tasks\": [...]} and nothing else. Each task has \
projectId (one of the given project ids), title, date (YYYY-MM-DD), \
startTime and endTime (HH:mm, 24-hour, same day, start before end), an \
optional description, checklist (array of short strings) and contentIdeas \
(exactly three objects {type, text} with type video, story and image).";

/// Schedule generator backed by an OpenAI-compatible chat completions API.
pub struct ChatScheduleGenerator {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct GeneratedSchedule {
    #[serde(default)]
    tasks: Vec<GeneratedTask>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedTask {
    project_id: String,
    title: String,
    date: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    checklist: Vec<String>,
    #[serde(default)]
    content_ideas: Vec<GeneratedIdea>,
}

#[derive(Debug, Deserialize)]
struct GeneratedIdea {
    #[serde(rename = "type")]
    kind: ContentIdeaType,
    text: String,
}

impl From<GeneratedTask> for TaskDraft {
    fn from(task: GeneratedTask) -> Self {
        Self {
            project_id: task.project_id,
            title: task.title,
            date: task.date,
            start_time: task.start_time,
            end_time: task.end_time,
            description: task.description,
            checklist: task.checklist,
            content_ideas: task
                .content_ideas
                .into_iter()
                .map(|idea| (idea.kind, idea.text))
                .collect(),
        }
    }
}

impl ChatScheduleGenerator {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> GeneratorResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| GeneratorError::Network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
        })
    }

    fn request_body(&self, projects: &[Project], prompt: &str, target_year: i32) -> Value {
        let catalog: Vec<Value> = projects
            .iter()
            .map(|p| json!({ "id": p.id.0, "name": p.name, "description": p.description }))
            .collect();

        json!({
            "model": self.model,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Year: {target_year}\nProjects: {}\nRequest: {prompt}",
                        Value::Array(catalog)
                    ),
                },
            ],
        })
    }
}

/// Pulls the assistant content out of a chat completion response.
fn completion_content(body: &Value) -> GeneratorResult<&str> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| GeneratorError::InvalidOutput("response has no message content".to_string()))
}

/// Parses the model's JSON into drafts. Accepts a bare array or an object
/// with a `tasks` array, optionally wrapped in a markdown code fence.
fn parse_drafts(content: &str) -> GeneratorResult<Vec<TaskDraft>> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let tasks = if unfenced.starts_with('[') {
        serde_json::from_str::<Vec<GeneratedTask>>(unfenced)
    } else {
        serde_json::from_str::<GeneratedSchedule>(unfenced).map(|s| s.tasks)
    }
    .map_err(|e| GeneratorError::InvalidOutput(e.to_string()))?;

    Ok(tasks.into_iter().map(Into::into).collect())
}

#[async_trait]
impl ScheduleGenerator for ChatScheduleGenerator {
    #[instrument(skip(self, projects, prompt), fields(model = %self.model))]
    async fn generate(
        &self,
        projects: &[Project],
        prompt: &str,
        target_year: i32,
    ) -> GeneratorResult<Vec<TaskDraft>> {
        let body = self.request_body(projects, prompt, target_year);
        debug!("Requesting schedule for {} projects", projects.len());

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        let status = response.status();
        let response_body: Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = response_body
                .get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string();
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let drafts = parse_drafts(completion_content(&response_body)?)?;
        debug!("Model proposed {} tasks", drafts.len());
        Ok(drafts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drafts_defaults_missing_lists() {
        let content = r#"{"tasks": [{
            "projectId": "p1", "title": "Beach day", "date": "2025-07-04",
            "startTime": "09:00", "endTime": "12:00"
        }]}"#;
        let drafts = parse_drafts(content).unwrap();
        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].checklist.is_empty());
        assert!(drafts[0].content_ideas.is_empty());
        assert_eq!(drafts[0].description, None);
    }

    #[test]
    fn test_parse_drafts_accepts_fenced_array() {
        let content = "```json\n[{\"projectId\": \"p1\", \"title\": \"Bake\", \"date\": \"2025-07-05\", \
            \"startTime\": \"14:00\", \"endTime\": \"15:00\", \"checklist\": [\"Flour\"], \
            \"contentIdeas\": [{\"type\": \"story\", \"text\": \"Mixing\"}]}]\n```";
        let drafts = parse_drafts(content).unwrap();
        assert_eq!(drafts[0].checklist, vec!["Flour".to_string()]);
        assert_eq!(
            drafts[0].content_ideas,
            vec![(ContentIdeaType::Story, "Mixing".to_string())]
        );
    }

    #[test]
    fn test_parse_drafts_rejects_unknown_idea_type() {
        let content = r#"[{"projectId": "p1", "title": "Bake", "date": "2025-07-05",
            "startTime": "14:00", "endTime": "15:00",
            "contentIdeas": [{"type": "podcast", "text": "Talk"}]}]"#;
        assert!(matches!(
            parse_drafts(content),
            Err(GeneratorError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_completion_content_extraction() {
        let body = json!({ "choices": [{ "message": { "content": "{\"tasks\": []}" } }] });
        assert_eq!(completion_content(&body).unwrap(), "{\"tasks\": []}");
        assert!(completion_content(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn test_request_body_lists_projects_and_year() {
        let generator =
            ChatScheduleGenerator::new("key", "https://api.example.com/v1/", "gpt-4o-mini").unwrap();
        assert_eq!(generator.base_url, "https://api.example.com/v1");

        let project = Project {
            id: "p1".into(),
            name: "Garden".to_string(),
            color: "#22c55e".to_string(),
            description: None,
        };
        let body = generator.request_body(&[project], "Plan spring planting", 2025);
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Year: 2025"));
        assert!(user.contains("\"p1\""));
        assert!(user.contains("Plan spring planting"));
        assert_eq!(body["model"], "gpt-4o-mini");
    }
}
