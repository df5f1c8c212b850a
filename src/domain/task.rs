use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::time::{parse_task_date, ClockTime, TimeInterval};
use super::{DomainResult, ProjectId};

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                $name(uuid::Uuid::new_v4().to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }
    };
}

string_id!(TaskId);
string_id!(ChecklistItemId);
string_id!(ContentIdeaId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: ChecklistItemId,
    pub text: String,
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: ChecklistItemId::generate(),
            text: text.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentIdeaType {
    Video,
    Story,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub id: ContentIdeaId,
    #[serde(rename = "type")]
    pub kind: ContentIdeaType,
    pub text: String,
}

impl ContentIdea {
    pub fn new(kind: ContentIdeaType, text: impl Into<String>) -> Self {
        Self {
            id: ContentIdeaId::generate(),
            kind,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub description: Option<String>,
    pub checklist: Vec<ChecklistItem>,
    pub content_ideas: Vec<ContentIdea>,
    pub completed: bool,
}

impl Task {
    /// Validated `[start, end)` interval of this task.
    pub fn interval(&self) -> DomainResult<TimeInterval> {
        TimeInterval::new(self.start_time, self.end_time)
    }

    /// Whether `now` falls inside this task's interval on its own date.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        now.date() == self.date
            && self
                .interval()
                .map(|interval| interval.contains(ClockTime::from_naive(now.time())))
                .unwrap_or(false)
    }

    pub fn duration_minutes(&self) -> u16 {
        self.interval().map(|i| i.duration_minutes()).unwrap_or(0)
    }

    /// Flips one checklist item. Returns false if no item has that id.
    pub fn toggle_checklist_item(&mut self, item_id: &ChecklistItemId) -> bool {
        match self.checklist.iter_mut().find(|item| &item.id == item_id) {
            Some(item) => {
                item.completed = !item.completed;
                true
            }
            None => false,
        }
    }

    /// Drag-and-drop reassignment. Only the date changes; returns `None`
    /// when the task already sits on `date`.
    pub fn moved_to(&self, date: NaiveDate) -> Option<Task> {
        if self.date == date {
            return None;
        }
        Some(Task {
            date,
            ..self.clone()
        })
    }

    pub fn time_range_display(&self) -> String {
        format!("{}–{}", self.start_time, self.end_time)
    }
}

/// Unvalidated task input from a form, the CLI or the schedule generator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    pub project_id: String,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    pub description: Option<String>,
    pub checklist: Vec<String>,
    pub content_ideas: Vec<(ContentIdeaType, String)>,
}

impl TaskDraft {
    /// Parses every field and assigns fresh ids. Nothing is built if any
    /// date or time fails to parse or the interval is inverted.
    pub fn into_task(self) -> DomainResult<Task> {
        if self.title.trim().is_empty() {
            return Err(super::DomainError::MissingField("title".to_string()));
        }
        if self.project_id.trim().is_empty() {
            return Err(super::DomainError::MissingField("project_id".to_string()));
        }

        let date = parse_task_date(&self.date)?;
        let start_time = ClockTime::parse(&self.start_time)?;
        let end_time = ClockTime::parse(&self.end_time)?;
        TimeInterval::new(start_time, end_time)?;

        Ok(Task {
            id: TaskId::generate(),
            project_id: ProjectId(self.project_id),
            title: self.title,
            date,
            start_time,
            end_time,
            description: self.description.filter(|d| !d.trim().is_empty()),
            checklist: self.checklist.into_iter().map(ChecklistItem::new).collect(),
            content_ideas: self
                .content_ideas
                .into_iter()
                .map(|(kind, text)| ContentIdea::new(kind, text))
                .collect(),
            completed: false,
        })
    }
}

/// Items that exist on a nested collection.
pub trait Keyed {
    type Key: Clone + Eq + std::hash::Hash + fmt::Debug + Serialize + for<'de> Deserialize<'de>;
    fn key(&self) -> &Self::Key;
}

impl Keyed for ChecklistItem {
    type Key = ChecklistItemId;
    fn key(&self) -> &ChecklistItemId {
        &self.id
    }
}

impl Keyed for ContentIdea {
    type Key = ContentIdeaId;
    fn key(&self) -> &ContentIdeaId {
        &self.id
    }
}

/// Changes between two versions of a nested collection, keyed by item id.
/// Untouched items appear in neither list and keep their identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionDiff<T: Keyed> {
    pub upserts: Vec<T>,
    pub deletes: Vec<T::Key>,
    /// Every key of the new collection in order. Left empty when the
    /// upserts and deletes alone already reproduce that order.
    #[serde(default)]
    pub order: Vec<T::Key>,
}

impl<T> CollectionDiff<T>
where
    T: Keyed + Clone + PartialEq,
{
    pub fn between(previous: &[T], next: &[T]) -> Self {
        let before: HashMap<&T::Key, &T> = previous.iter().map(|item| (item.key(), item)).collect();
        let after: HashMap<&T::Key, &T> = next.iter().map(|item| (item.key(), item)).collect();

        let upserts = next
            .iter()
            .filter(|item| before.get(item.key()).map_or(true, |old| *old != *item))
            .cloned()
            .collect();
        let deletes = previous
            .iter()
            .filter(|item| !after.contains_key(item.key()))
            .map(|item| item.key().clone())
            .collect();

        let mut diff = Self {
            upserts,
            deletes,
            order: Vec::new(),
        };
        let mut replayed = previous.to_vec();
        diff.apply(&mut replayed);
        if !replayed
            .iter()
            .map(|item| item.key())
            .eq(next.iter().map(|item| item.key()))
        {
            diff.order = next.iter().map(|item| item.key().clone()).collect();
        }
        diff
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deletes.is_empty() && self.order.is_empty()
    }

    /// Applies the diff to a stored collection. New items are appended
    /// unless an explicit order is carried, in which case the result
    /// follows it. Stored items missing from the order keep their
    /// relative position at the end.
    pub fn apply(&self, stored: &mut Vec<T>) {
        stored.retain(|item| !self.deletes.contains(item.key()));
        for upsert in &self.upserts {
            match stored.iter_mut().find(|item| item.key() == upsert.key()) {
                Some(existing) => *existing = upsert.clone(),
                None => stored.push(upsert.clone()),
            }
        }
        if !self.order.is_empty() {
            stored.sort_by_key(|item| {
                self.order
                    .iter()
                    .position(|key| key == item.key())
                    .unwrap_or(usize::MAX)
            });
        }
    }
}

/// Full-replace update of a task's scalar fields plus keyed diffs of its
/// nested collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    pub task: Task,
    pub checklist: CollectionDiff<ChecklistItem>,
    pub content_ideas: CollectionDiff<ContentIdea>,
}

impl TaskUpdate {
    pub fn between(previous: &Task, next: &Task) -> Self {
        Self {
            task: next.clone(),
            checklist: CollectionDiff::between(&previous.checklist, &next.checklist),
            content_ideas: CollectionDiff::between(&previous.content_ideas, &next.content_ideas),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{item, task};
    use super::*;
    use chrono::NaiveTime;

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
    }

    #[test]
    fn test_is_active_only_on_its_date() {
        let t = task("a", "p", "2024-12-05", "10:00", "11:00");
        assert!(t.is_active_at(at("2024-12-05", "10:30")));
        assert!(!t.is_active_at(at("2024-12-05", "11:00")));
        assert!(!t.is_active_at(at("2024-12-06", "10:30")));
    }

    #[test]
    fn test_moved_to_changes_only_date() {
        let mut original = task("a", "p", "2024-12-05", "10:00", "11:00");
        original.checklist.push(item("c1", "Buy props", true));
        original.description = Some("Shoot intro".to_string());

        let target = NaiveDate::from_ymd_opt(2024, 12, 10).unwrap();
        let moved = original.moved_to(target).unwrap();

        assert_eq!(moved.date, target);
        assert_eq!(
            Task {
                date: original.date,
                ..moved.clone()
            },
            original
        );
        assert_eq!(
            serde_json::to_value(&moved).unwrap()["id"],
            serde_json::to_value(&original).unwrap()["id"]
        );
        assert!(original.moved_to(original.date).is_none());
    }

    #[test]
    fn test_draft_rejects_malformed_input() {
        let draft = TaskDraft {
            project_id: "p".to_string(),
            title: "Film".to_string(),
            date: "2024-12-05".to_string(),
            start_time: "10:00".to_string(),
            end_time: "09:00".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            draft.clone().into_task(),
            Err(crate::domain::DomainError::InvalidInterval { .. })
        ));

        let bad_date = TaskDraft {
            date: "next tuesday".to_string(),
            end_time: "11:00".to_string(),
            ..draft.clone()
        };
        assert!(matches!(
            bad_date.into_task(),
            Err(crate::domain::DomainError::InvalidDate(_))
        ));

        let ok = TaskDraft {
            end_time: "11:00".to_string(),
            checklist: vec!["Script".to_string(), "Edit".to_string()],
            ..draft
        }
        .into_task()
        .unwrap();
        assert_eq!(ok.checklist.len(), 2);
        assert!(ok.checklist.iter().all(|i| !i.completed));
        assert!(!ok.completed);
    }

    #[test]
    fn test_collection_diff_keeps_unchanged_identities() {
        let before = vec![item("a", "One", false), item("b", "Two", false), item("c", "Three", false)];
        let mut after = before.clone();
        after[1].completed = true;
        after.remove(2);
        after.push(item("d", "Four", false));

        let diff = CollectionDiff::between(&before, &after);
        let upserted: Vec<_> = diff.upserts.iter().map(|i| i.id.0.as_str()).collect();
        assert_eq!(upserted, vec!["b", "d"]);
        assert_eq!(diff.deletes, vec![ChecklistItemId::from("c")]);
        // Appending already lands "d" last, so no order is sent.
        assert!(diff.order.is_empty());

        let mut stored = before.clone();
        diff.apply(&mut stored);
        assert_eq!(stored, after);
    }

    #[test]
    fn test_collection_diff_insert_in_middle_keeps_position() {
        let before = vec![item("a", "One", false), item("b", "Two", false)];
        let after = vec![item("a", "One", false), item("x", "New", false), item("b", "Two", false)];

        let diff = CollectionDiff::between(&before, &after);
        assert_eq!(diff.upserts, vec![item("x", "New", false)]);
        assert_eq!(
            diff.order,
            vec![
                ChecklistItemId::from("a"),
                ChecklistItemId::from("x"),
                ChecklistItemId::from("b")
            ]
        );

        let mut stored = before.clone();
        diff.apply(&mut stored);
        assert_eq!(stored, after);
    }

    #[test]
    fn test_collection_diff_pure_reorder_is_not_empty() {
        let before = vec![item("a", "One", false), item("b", "Two", false)];
        let after = vec![item("b", "Two", false), item("a", "One", false)];

        let diff = CollectionDiff::between(&before, &after);
        assert!(!diff.is_empty());
        assert!(diff.upserts.is_empty());
        assert!(diff.deletes.is_empty());

        let mut stored = before.clone();
        diff.apply(&mut stored);
        assert_eq!(stored, after);
    }

    #[test]
    fn test_task_update_between_identical_is_empty() {
        let mut t = task("a", "p", "2024-12-05", "10:00", "11:00");
        t.checklist.push(item("c1", "Plan", false));
        let update = TaskUpdate::between(&t, &t);
        assert!(update.checklist.is_empty());
        assert!(update.content_ideas.is_empty());
    }

    #[test]
    fn test_toggle_checklist_item() {
        let mut t = task("a", "p", "2024-12-05", "10:00", "11:00");
        t.checklist.push(item("c1", "Plan", false));
        assert!(t.toggle_checklist_item(&ChecklistItemId::from("c1")));
        assert!(t.checklist[0].completed);
        assert!(!t.toggle_checklist_item(&ChecklistItemId::from("missing")));
    }
}
