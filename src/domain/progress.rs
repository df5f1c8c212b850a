//! Completion scoring and the color intensity derived from it.

use serde::{Deserialize, Serialize};

use super::{Project, Task};

/// Opacity of a task with no progress at all. Keeps fresh tasks visible.
pub const MIN_ALPHA: f64 = 0.15;

/// Hex fragments of the yellow/orange family. Light text on these hues is
/// unreadable at any opacity.
const LIGHT_HUES: &[&str] = &[
    "eab308", "facc15", "fde047", "f59e0b", "fbbf24", "fcd34d", "f97316", "fb923c", "fdba74",
    "ffff00", "ffd700", "ffa500",
];

/// Normalized completion of a task in `[0, 1]`.
///
/// The `completed` flag wins over the checklist; otherwise the checklist
/// ratio is used, and a task with neither counts as untouched.
pub fn task_progress(task: &Task) -> f64 {
    if task.completed {
        return 1.0;
    }
    if task.checklist.is_empty() {
        return 0.0;
    }
    let done = task.checklist.iter().filter(|item| item.completed).count();
    (done as f64 / task.checklist.len() as f64).clamp(0.0, 1.0)
}

/// Rounded 0–100 score for a set of tasks, `None` when there are none.
pub fn aggregate_score<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Option<u8> {
    let (sum, count) = tasks
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), task| (sum + task_progress(task), count + 1));
    if count == 0 {
        return None;
    }
    Some((100.0 * sum / count as f64).round().clamp(0.0, 100.0) as u8)
}

pub fn progress_alpha(progress: f64) -> f64 {
    MIN_ALPHA + progress.clamp(0.0, 1.0) * (1.0 - MIN_ALPHA)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextTone {
    Light,
    Dark,
}

impl TextTone {
    pub fn css(&self) -> &'static str {
        match self {
            TextTone::Light => "#ffffff",
            TextTone::Dark => "#1f2937",
        }
    }
}

pub fn is_naturally_light(color: &str) -> bool {
    let lowered = color.to_ascii_lowercase();
    LIGHT_HUES.iter().any(|hue| lowered.contains(hue))
}

pub fn text_tone(base_color: &str, alpha: f64) -> TextTone {
    if alpha > 0.5 && !is_naturally_light(base_color) {
        TextTone::Light
    } else {
        TextTone::Dark
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Parses `#rrggbb` or `#rgb`, with or without the leading `#`.
    pub fn from_hex(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            3 => {
                let mut digits = hex.chars().map(|c| channel(&format!("{c}{c}")));
                Some(Self {
                    r: digits.next()??,
                    g: digits.next()??,
                    b: digits.next()??,
                })
            }
            _ => None,
        }
    }

    pub fn to_rgba_css(&self, alpha: f64) -> String {
        format!("rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, alpha.clamp(0.0, 1.0))
    }
}

/// Fill and text colors for drawing a task tile or arc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskShade {
    pub progress: f64,
    pub alpha: f64,
    pub fill: String,
    pub text: TextTone,
}

impl TaskShade {
    pub fn new(base_color: &str, progress: f64) -> Self {
        let alpha = progress_alpha(progress);
        let rgb = Rgb::from_hex(base_color)
            .or_else(|| Rgb::from_hex(super::FALLBACK_COLOR))
            .unwrap_or(Rgb { r: 156, g: 163, b: 175 });
        Self {
            progress,
            alpha,
            fill: rgb.to_rgba_css(alpha),
            text: text_tone(base_color, alpha),
        }
    }

    pub fn for_task(task: &Task, base_color: &str) -> Self {
        Self::new(base_color, task_progress(task))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectProgress {
    pub project: Project,
    pub score: u8,
    pub task_count: usize,
    pub completed_count: usize,
}

/// Scores for every project that owns at least one task, ordered by name.
pub fn project_progress(projects: &[Project], tasks: &[Task]) -> Vec<ProjectProgress> {
    let mut summaries: Vec<ProjectProgress> = projects
        .iter()
        .filter_map(|project| {
            let owned: Vec<&Task> = tasks.iter().filter(|t| t.project_id == project.id).collect();
            let score = aggregate_score(owned.iter().copied())?;
            Some(ProjectProgress {
                project: project.clone(),
                score,
                task_count: owned.len(),
                completed_count: owned.iter().filter(|t| task_progress(t) >= 1.0).count(),
            })
        })
        .collect();
    summaries.sort_by(|a, b| a.project.name.cmp(&b.project.name));
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::fixtures::{item, task};

    #[test]
    fn test_completed_flag_overrides_checklist() {
        let mut t = task("a", "p", "2024-03-01", "09:00", "10:00");
        t.checklist = vec![item("1", "x", false), item("2", "y", false)];
        t.completed = true;
        assert_eq!(task_progress(&t), 1.0);
    }

    #[test]
    fn test_progress_without_checklist_is_zero() {
        let t = task("a", "p", "2024-03-01", "09:00", "10:00");
        assert_eq!(task_progress(&t), 0.0);
    }

    #[test]
    fn test_progress_is_checklist_ratio() {
        let mut t = task("a", "p", "2024-03-01", "09:00", "10:00");
        t.checklist = vec![item("1", "x", true), item("2", "y", false), item("3", "z", false)];
        assert!((task_progress(&t) - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_bounds_and_monotonic() {
        assert!((progress_alpha(0.0) - 0.15).abs() < 1e-9);
        assert!((progress_alpha(1.0) - 1.0).abs() < 1e-9);
        let mut previous = progress_alpha(0.0);
        for step in 1..=20 {
            let alpha = progress_alpha(step as f64 / 20.0);
            assert!(alpha >= previous);
            previous = alpha;
        }
    }

    #[test]
    fn test_text_tone() {
        assert_eq!(text_tone("#3b82f6", 0.9), TextTone::Light);
        assert_eq!(text_tone("#3b82f6", 0.5), TextTone::Dark);
        assert_eq!(text_tone("#EAB308", 1.0), TextTone::Dark);
        assert_eq!(text_tone("#f97316", 0.8), TextTone::Dark);
    }

    #[test]
    fn test_rgb_parsing() {
        assert_eq!(Rgb::from_hex("#3b82f6"), Some(Rgb { r: 0x3b, g: 0x82, b: 0xf6 }));
        assert_eq!(Rgb::from_hex("#fff"), Some(Rgb { r: 255, g: 255, b: 255 }));
        assert_eq!(Rgb::from_hex("blue"), None);
        assert_eq!(
            Rgb { r: 1, g: 2, b: 3 }.to_rgba_css(0.15),
            "rgba(1, 2, 3, 0.15)"
        );
    }

    #[test]
    fn test_project_progress_excludes_empty_projects() {
        let alpha = Project {
            id: "p1".into(),
            name: "Alpha".to_string(),
            color: "#3b82f6".to_string(),
            description: None,
        };
        let beta = Project {
            id: "p2".into(),
            name: "Beta".to_string(),
            color: "#10b981".to_string(),
            description: None,
        };

        let mut done = task("a", "p1", "2024-03-01", "09:00", "10:00");
        done.completed = true;
        let mut partial = task("b", "p1", "2024-03-02", "09:00", "10:00");
        partial.checklist = vec![item("1", "x", true), item("2", "y", false)];
        let fresh = task("c", "p1", "2024-03-03", "09:00", "10:00");

        let summary = project_progress(&[beta, alpha], &[done, partial, fresh]);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary[0].project.name, "Alpha");
        // (1 + 0.5 + 0) / 3 = 0.5
        assert_eq!(summary[0].score, 50);
        assert_eq!(summary[0].task_count, 3);
        assert_eq!(summary[0].completed_count, 1);
    }

    #[test]
    fn test_aggregate_score_rounds() {
        let mut t1 = task("a", "p", "2024-03-01", "09:00", "10:00");
        t1.checklist = vec![item("1", "x", true), item("2", "y", false), item("3", "z", false)];
        assert_eq!(aggregate_score([&t1]), Some(33));
        assert_eq!(aggregate_score(std::iter::empty()), None);
    }
}
