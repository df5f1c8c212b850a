use std::sync::{Arc, RwLock};

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use dashmap::DashMap;

use super::{AppResult, PlannerService};
use crate::domain::month_grid::{project_month, MonthGrid};
use crate::domain::radial::{default_selection, layout_day, ClockHands, DayLayout, DialGeometry};
use crate::domain::TaskId;

/// What the one-minute tick recomputes for the open day.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSnapshot {
    pub hands: ClockHands,
    pub active: Vec<TaskId>,
}

/// View state on top of the planner: which month is visible, which day
/// is open and what is selected on each day.
///
/// Nothing here reads the clock. Callers pass the evaluation instant so
/// every derived view is a pure function of data and time.
pub struct StateManager {
    planner: Arc<PlannerService>,
    geometry: DialGeometry,

    visible_month: RwLock<(i32, u32)>,
    open_day: RwLock<NaiveDate>,
    // Explicit selections only; defaults are recomputed on open.
    selections: DashMap<NaiveDate, TaskId>,
}

impl StateManager {
    pub fn new(planner: Arc<PlannerService>, geometry: DialGeometry, today: NaiveDate) -> Self {
        Self {
            planner,
            geometry,
            visible_month: RwLock::new((today.year(), today.month())),
            open_day: RwLock::new(today),
            selections: DashMap::new(),
        }
    }

    pub fn planner(&self) -> &Arc<PlannerService> {
        &self.planner
    }

    pub fn geometry(&self) -> &DialGeometry {
        &self.geometry
    }

    pub fn visible_month(&self) -> (i32, u32) {
        *self.visible_month.read().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_visible_month(&self, year: i32, month: u32) {
        *self.visible_month.write().unwrap_or_else(|e| e.into_inner()) = (year, month);
    }

    /// Steps the visible month forwards or backwards by `delta` months.
    pub fn shift_month(&self, delta: i32) -> (i32, u32) {
        let (year, month) = self.visible_month();
        let index = year * 12 + (month as i32 - 1) + delta;
        let shifted = (index.div_euclid(12), index.rem_euclid(12) as u32 + 1);
        self.set_visible_month(shifted.0, shifted.1);
        shifted
    }

    pub fn month_view(&self, now: NaiveDateTime) -> AppResult<MonthGrid> {
        let (year, month) = self.visible_month();
        Ok(project_month(
            year,
            month,
            &self.planner.tasks(),
            &self.planner.projects(),
            now,
        )?)
    }

    pub fn open_day(&self) -> NaiveDate {
        *self.open_day.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Opens a day and returns the selection to show for it. The visible
    /// month follows the opened day.
    pub fn open(&self, date: NaiveDate, now: NaiveDateTime) -> Option<TaskId> {
        *self.open_day.write().unwrap_or_else(|e| e.into_inner()) = date;
        self.set_visible_month(date.year(), date.month());
        self.selection(date, now)
    }

    pub fn selection(&self, date: NaiveDate, now: NaiveDateTime) -> Option<TaskId> {
        let explicit = self.selections.get(&date).map(|id| id.clone());
        default_selection(date, &self.planner.tasks(), now, explicit.as_ref())
    }

    pub fn select(&self, date: NaiveDate, task_id: TaskId) {
        self.selections.insert(date, task_id);
    }

    pub fn clear_selection(&self, date: NaiveDate) {
        self.selections.remove(&date);
    }

    pub fn day_view(&self, date: NaiveDate, now: NaiveDateTime) -> DayLayout {
        layout_day(
            date,
            &self.planner.tasks(),
            &self.planner.projects(),
            &self.geometry,
            now,
        )
    }

    pub fn tick(&self, now: NaiveDateTime) -> TickSnapshot {
        let layout = self.day_view(self.open_day(), now);
        TickSnapshot {
            hands: layout.hands,
            active: layout.active_task_ids().into_iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::MokaCacheAdapter;
    use crate::adapters::memory::InMemoryPlannerRepository;
    use crate::domain::task::fixtures::task;
    use crate::domain::Project;

    async fn manager(today: NaiveDate) -> StateManager {
        let project = Project {
            id: "p".into(),
            name: "Family".to_string(),
            color: "#3b82f6".to_string(),
            description: None,
        };
        let repo = Arc::new(InMemoryPlannerRepository::with_data(
            vec![project],
            vec![
                task("school", "p", "2024-12-05", "08:00", "15:00"),
                task("dentist", "p", "2024-12-05", "10:00", "10:30"),
            ],
        ));
        let planner = Arc::new(PlannerService::new(repo, Arc::new(MokaCacheAdapter::new(60, 10))));
        planner.load(false).await;
        StateManager::new(planner, DialGeometry::default(), today)
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 5).unwrap()
    }

    #[tokio::test]
    async fn test_open_today_selects_running_task() {
        let state = manager(day()).await;
        let now = day().and_hms_opt(10, 15, 0).unwrap();
        assert_eq!(state.open(day(), now), Some(TaskId::from("dentist")));

        let later = day().and_hms_opt(18, 0, 0).unwrap();
        assert_eq!(state.open(day(), later), None);
    }

    #[tokio::test]
    async fn test_explicit_selection_wins() {
        let state = manager(day()).await;
        let now = day().and_hms_opt(10, 15, 0).unwrap();
        state.select(day(), TaskId::from("school"));
        assert_eq!(state.open(day(), now), Some(TaskId::from("school")));

        state.clear_selection(day());
        assert_eq!(state.open(day(), now), Some(TaskId::from("dentist")));
    }

    #[tokio::test]
    async fn test_other_day_has_no_default_selection() {
        let state = manager(day()).await;
        let now = day().succ_opt().unwrap().and_hms_opt(10, 15, 0).unwrap();
        assert_eq!(state.open(day(), now), None);
    }

    #[tokio::test]
    async fn test_shift_month_wraps_years() {
        let state = manager(day()).await;
        assert_eq!(state.shift_month(1), (2025, 1));
        assert_eq!(state.shift_month(-2), (2024, 11));
        assert_eq!(state.shift_month(-11), (2023, 12));
    }

    #[tokio::test]
    async fn test_tick_reports_active_tasks() {
        let state = manager(day()).await;
        state.open(day(), day().and_hms_opt(7, 0, 0).unwrap());

        let snapshot = state.tick(day().and_hms_opt(10, 15, 0).unwrap());
        assert_eq!(snapshot.active.len(), 2);
        assert!(snapshot.active.contains(&TaskId::from("dentist")));

        let snapshot = state.tick(day().and_hms_opt(16, 0, 0).unwrap());
        assert!(snapshot.active.is_empty());
        assert_eq!(snapshot.hands.hour_angle, 120.0);
    }

    #[tokio::test]
    async fn test_month_view_follows_open_day() {
        let state = manager(day()).await;
        let other = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        state.open(other, other.and_hms_opt(9, 0, 0).unwrap());
        let grid = state.month_view(other.and_hms_opt(9, 0, 0).unwrap()).unwrap();
        assert_eq!((grid.year, grid.month), (2025, 3));
    }
}
