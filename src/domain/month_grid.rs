//! Month view: tasks projected onto whole weeks of day cells.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::progress::TaskShade;
use super::project::resolve_color;
use super::time::ClockTime;
use super::{DomainError, DomainResult, Project, ProjectId, Task, TaskId};

/// Most tasks a single cell shows before collapsing into "+N more".
pub const VISIBLE_PER_CELL: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellEntry {
    pub task_id: TaskId,
    pub project_id: ProjectId,
    pub title: String,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    pub shade: TaskShade,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayCell {
    pub date: NaiveDate,
    /// False for the leading and trailing days borrowed from the
    /// neighbouring months.
    pub in_month: bool,
    pub is_today: bool,
    pub visible: Vec<CellEntry>,
    pub hidden: usize,
}

impl DayCell {
    pub fn overflow_label(&self) -> Option<String> {
        (self.hidden > 0).then(|| format!("+{} more", self.hidden))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub cells: Vec<DayCell>,
}

impl MonthGrid {
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell]> {
        self.cells.chunks(7)
    }
}

#[cfg(test)]
impl MonthGrid {
    pub fn cell(&self, date: NaiveDate) -> Option<&DayCell> {
        self.cells.iter().find(|c| c.date == date)
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.cells.first().map(|c| c.date)
    }
}

pub fn month_bounds(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| DomainError::InvalidDate(format!("{year}-{month:02}")))?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| DomainError::InvalidDate(format!("{year}-{month:02}")))?;
    let last = next_first
        .pred_opt()
        .ok_or_else(|| DomainError::InvalidDate(format!("{year}-{month:02}")))?;
    Ok((first, last))
}

/// Sunday on or before the 1st through Saturday on or after the last day.
pub fn grid_range(year: i32, month: u32) -> DomainResult<(NaiveDate, NaiveDate)> {
    let (first, last) = month_bounds(year, month)?;
    let out_of_range = || DomainError::InvalidDate(format!("{year}-{month:02}"));
    let start = first
        .checked_sub_signed(Duration::days(first.weekday().num_days_from_sunday() as i64))
        .ok_or_else(out_of_range)?;
    let end = last
        .checked_add_signed(Duration::days(6 - last.weekday().num_days_from_sunday() as i64))
        .ok_or_else(out_of_range)?;
    Ok((start, end))
}

/// Range of a sorted cell list to show.
///
/// With an active task the window is centred on it (one task before it
/// when possible) and pulled back so it never runs past the end.
/// Otherwise the earliest tasks are shown.
pub fn visible_window(len: usize, active_index: Option<usize>) -> Range<usize> {
    if len <= VISIBLE_PER_CELL {
        return 0..len;
    }
    let start = active_index
        .map(|index| index.saturating_sub(1).min(len - VISIBLE_PER_CELL))
        .unwrap_or(0);
    start..start + VISIBLE_PER_CELL
}

/// Tasks dated `date`, sorted by start time. Equal starts fall back to
/// title then id so the order is stable across reloads.
pub fn tasks_on<'a>(tasks: &'a [Task], date: NaiveDate) -> Vec<&'a Task> {
    let mut day: Vec<&Task> = tasks.iter().filter(|t| t.date == date).collect();
    day.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.id.cmp(&b.id))
    });
    day
}

fn project_cell(
    date: NaiveDate,
    in_month: bool,
    tasks: &[Task],
    projects: &[Project],
    now: NaiveDateTime,
) -> DayCell {
    let is_today = date == now.date();
    let day = tasks_on(tasks, date);
    let active_index = if is_today {
        day.iter().position(|t| t.is_active_at(now))
    } else {
        None
    };
    let window = visible_window(day.len(), active_index);
    let hidden = day.len() - window.len();

    let visible = day[window]
        .iter()
        .map(|task| CellEntry {
            task_id: task.id.clone(),
            project_id: task.project_id.clone(),
            title: task.title.clone(),
            start_time: task.start_time,
            end_time: task.end_time,
            shade: TaskShade::for_task(task, resolve_color(projects, &task.project_id)),
            is_active: is_today && task.is_active_at(now),
        })
        .collect();

    DayCell {
        date,
        in_month,
        is_today,
        visible,
        hidden,
    }
}

pub fn project_month(
    year: i32,
    month: u32,
    tasks: &[Task],
    projects: &[Project],
    now: NaiveDateTime,
) -> DomainResult<MonthGrid> {
    let (start, end) = grid_range(year, month)?;
    let cells = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| {
            let in_month = date.year() == year && date.month() == month;
            project_cell(date, in_month, tasks, projects, now)
        })
        .collect();

    Ok(MonthGrid { year, month, cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::fixtures::task;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn noon(date: NaiveDate) -> NaiveDateTime {
        date.and_hms_opt(12, 0, 0).unwrap()
    }

    #[test]
    fn test_march_2024_grid_starts_on_preceding_sunday() {
        let grid = project_month(2024, 3, &[], &[], noon(ymd(2024, 3, 10))).unwrap();
        assert_eq!(grid.first_date(), Some(ymd(2024, 2, 25)));
        assert_eq!(grid.cells.len() % 7, 0);
        assert_eq!(grid.cells.len(), 42);
        assert_eq!(grid.cells.last().unwrap().date, ymd(2024, 4, 6));
        assert!(!grid.cells[0].in_month);
        assert!(grid.cell(ymd(2024, 3, 1)).unwrap().in_month);
        assert!(grid.cell(ymd(2024, 3, 10)).unwrap().is_today);
        assert_eq!(grid.weeks().count(), 6);
    }

    #[test]
    fn test_month_already_aligned_to_weeks() {
        // February 2026 starts on a Sunday and ends on a Saturday.
        let (start, end) = grid_range(2026, 2).unwrap();
        assert_eq!(start, ymd(2026, 2, 1));
        assert_eq!(end, ymd(2026, 2, 28));
    }

    #[test]
    fn test_december_rolls_into_next_year() {
        let (first, last) = month_bounds(2024, 12).unwrap();
        assert_eq!(first, ymd(2024, 12, 1));
        assert_eq!(last, ymd(2024, 12, 31));
        assert!(month_bounds(2024, 13).is_err());
    }

    #[test]
    fn test_months_at_calendar_limits_are_errors() {
        let now = noon(ymd(2024, 3, 10));
        // January of the earliest year would need days before the first
        // representable date.
        assert!(matches!(
            project_month(NaiveDate::MIN.year(), 1, &[], &[], now),
            Err(DomainError::InvalidDate(_))
        ));
        assert!(project_month(NaiveDate::MAX.year(), 12, &[], &[], now).is_err());
        assert!(project_month(i32::MIN, 1, &[], &[], now).is_err());
    }

    #[test]
    fn test_overflow_shows_first_three_when_nothing_active() {
        let tasks: Vec<Task> = ["13:00", "09:00", "11:00", "08:00", "10:00"]
            .iter()
            .enumerate()
            .map(|(i, start)| {
                let end = format!("{}:30", &start[..2]);
                task(&format!("t{i}"), "p", "2024-03-05", start, &end)
            })
            .collect();

        let grid = project_month(2024, 3, &tasks, &[], noon(ymd(2024, 3, 20))).unwrap();
        let cell = grid.cell(ymd(2024, 3, 5)).unwrap();
        let starts: Vec<String> = cell.visible.iter().map(|e| e.start_time.to_string()).collect();
        assert_eq!(starts, vec!["08:00", "09:00", "10:00"]);
        assert_eq!(cell.hidden, 2);
        assert_eq!(cell.overflow_label().as_deref(), Some("+2 more"));
        assert_eq!(cell.visible.len() + cell.hidden, 5);
    }

    #[test]
    fn test_overflow_centres_on_active_task_today() {
        let tasks: Vec<Task> = (0..5)
            .map(|i| {
                let start = format!("{:02}:00", 8 + i * 2);
                let end = format!("{:02}:00", 9 + i * 2);
                task(&format!("t{i}"), "p", "2024-03-05", &start, &end)
            })
            .collect();

        // 14:30 falls in t3 (14:00–15:00)
        let now = ymd(2024, 3, 5).and_hms_opt(14, 30, 0).unwrap();
        let grid = project_month(2024, 3, &tasks, &[], now).unwrap();
        let cell = grid.cell(ymd(2024, 3, 5)).unwrap();
        let ids: Vec<&str> = cell.visible.iter().map(|e| e.task_id.0.as_str()).collect();
        assert_eq!(ids, vec!["t2", "t3", "t4"]);
        assert!(cell.visible[1].is_active);
        assert_eq!(cell.hidden, 2);
    }

    #[test]
    fn test_visible_window_clamps() {
        assert_eq!(visible_window(2, Some(1)), 0..2);
        assert_eq!(visible_window(5, None), 0..3);
        assert_eq!(visible_window(5, Some(0)), 0..3);
        assert_eq!(visible_window(5, Some(2)), 1..4);
        assert_eq!(visible_window(5, Some(4)), 2..5);
        assert_eq!(visible_window(6, Some(3)), 2..5);
    }

    #[test]
    fn test_active_ignored_on_other_days() {
        let tasks: Vec<Task> = (0..4)
            .map(|i| {
                let start = format!("{:02}:00", 8 + i);
                let end = format!("{:02}:00", 9 + i);
                task(&format!("t{i}"), "p", "2024-03-06", &start, &end)
            })
            .collect();
        let now = ymd(2024, 3, 5).and_hms_opt(11, 30, 0).unwrap();
        let grid = project_month(2024, 3, &tasks, &[], now).unwrap();
        let cell = grid.cell(ymd(2024, 3, 6)).unwrap();
        assert_eq!(cell.visible[0].task_id, TaskId::from("t0"));
        assert!(cell.visible.iter().all(|e| !e.is_active));
    }
}
