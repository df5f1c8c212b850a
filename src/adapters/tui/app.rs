use color_eyre::Result;
use std::sync::Arc;

use super::event::{AppEvent, EventHandler};
use crate::application::{StateManager, TickSnapshot};
use crate::domain::month_grid::{DayCell, MonthGrid};
use crate::domain::progress::{Rgb, TextTone};
use crate::domain::radial::{DayLayout, Segment};
use crate::domain::{resolve_color, ContentIdeaType, Task, FALLBACK_COLOR};
use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use ratatui::{
    prelude::*,
    symbols::Marker,
    widgets::{
        canvas::{Canvas, Circle, Line as CanvasLine, Points},
        Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, Wrap,
    },
};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const BACKGROUND: (u8, u8, u8) = (24, 24, 27);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppMode {
    Main,
    Help,
}

pub struct App {
    state: Arc<StateManager>,
    mode: AppMode,

    // Evaluation instant for every derived view. Only advanced on tick so
    // the hands move once a minute.
    now: NaiveDateTime,
    snapshot: Option<TickSnapshot>,
    status: Option<String>,
    // Where the dial was last drawn, for mouse hit-testing.
    dial_area: Option<Rect>,
}

impl App {
    pub fn new(state: Arc<StateManager>) -> Self {
        Self {
            state,
            mode: AppMode::Main,
            now: Local::now().naive_local(),
            snapshot: None,
            status: None,
            dial_area: None,
        }
    }

    pub async fn initialize(&mut self) -> Result<()> {
        let summary = self.state.planner().load(true).await;
        self.status = Some(format!(
            "Loaded {} projects, {} tasks",
            summary.projects, summary.tasks
        ));
        let today = self.now.date();
        self.state.open(today, self.now);
        self.snapshot = Some(self.state.tick(self.now));
        Ok(())
    }

    fn open_day(&self) -> NaiveDate {
        self.state.open_day()
    }

    fn selected(&self) -> Option<Task> {
        let id = self.state.selection(self.open_day(), self.now)?;
        self.state.planner().task(&id)
    }

    fn go_to(&mut self, date: NaiveDate) {
        self.state.open(date, self.now);
        self.snapshot = Some(self.state.tick(self.now));
    }

    fn go_to_month(&mut self, delta: i32) {
        let current = self.open_day();
        let (year, month) = self.state.shift_month(delta);
        let day = current.day().min(days_in_month(year, month));
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            self.go_to(date);
        }
    }

    fn cycle_selection(&mut self, forward: bool) {
        let date = self.open_day();
        let tasks = self.state.planner().tasks_on(date);
        if tasks.is_empty() {
            return;
        }
        let current = self
            .state
            .selection(date, self.now)
            .and_then(|id| tasks.iter().position(|t| t.id == id));
        let next = match (current, forward) {
            (None, true) => 0,
            (None, false) => tasks.len() - 1,
            (Some(i), true) => (i + 1) % tasks.len(),
            (Some(i), false) => (i + tasks.len() - 1) % tasks.len(),
        };
        self.state.select(date, tasks[next].id.clone());
    }

    fn report<T>(&mut self, result: crate::application::AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.status = Some(e.to_string());
                None
            }
        }
    }

    fn move_selected(&mut self, days: i64) {
        let Some(task) = self.selected() else { return };
        let target = task.date + Duration::days(days);
        let moved = self.state.planner().move_task(&task.id, target);
        if let Some(Some(moved)) = self.report(moved) {
            self.go_to(moved.date);
            self.state.select(moved.date, moved.id);
        }
    }

    /// Selects the topmost task under a click on the dial. Clicks that miss
    /// every arc leave the selection alone.
    fn click(&mut self, column: u16, row: u16) {
        let Some(area) = self.dial_area else { return };
        let inner = Block::default().borders(Borders::ALL).inner(area);
        if inner.width == 0
            || inner.height == 0
            || column < inner.x
            || row < inner.y
            || column >= inner.x + inner.width
            || row >= inner.y + inner.height
        {
            return;
        }

        // Cell centres in drawing units; the canvas spans the whole dial.
        let g = self.state.geometry();
        let x = (f64::from(column - inner.x) + 0.5) / f64::from(inner.width) * 2.0 * g.center_x;
        let y = (f64::from(row - inner.y) + 0.5) / f64::from(inner.height) * 2.0 * g.center_y;

        let layout = self.state.day_view(self.open_day(), self.now);
        if let Some(segment) = layout.segment_at(x, y) {
            tracing::debug!("Dial click at ({x:.1}, {y:.1}) hit {}", segment.task_id);
            self.state.select(layout.date, segment.task_id.clone());
        }
    }

    pub async fn handle_event(&mut self, event: AppEvent) -> Result<bool> {
        if self.mode == AppMode::Help {
            if matches!(
                event,
                AppEvent::CloseModal | AppEvent::ShowHelp | AppEvent::Quit
            ) {
                self.mode = AppMode::Main;
            }
            return Ok(false);
        }

        match event {
            AppEvent::Quit => return Ok(true),
            AppEvent::ShowHelp => self.mode = AppMode::Help,
            AppEvent::CloseModal => {
                self.state.clear_selection(self.open_day());
                self.status = None;
            }
            AppEvent::Refresh => {
                let summary = self.state.planner().load(false).await;
                self.status = Some(format!(
                    "Reloaded {} projects, {} tasks",
                    summary.projects, summary.tasks
                ));
                self.snapshot = Some(self.state.tick(self.now));
            }

            AppEvent::NextDay => self.go_to(self.open_day() + Duration::days(1)),
            AppEvent::PreviousDay => self.go_to(self.open_day() - Duration::days(1)),
            AppEvent::NextWeek => self.go_to(self.open_day() + Duration::days(7)),
            AppEvent::PreviousWeek => self.go_to(self.open_day() - Duration::days(7)),
            AppEvent::NextMonth => self.go_to_month(1),
            AppEvent::PreviousMonth => self.go_to_month(-1),
            AppEvent::Today => self.go_to(self.now.date()),

            AppEvent::NextTask => self.cycle_selection(true),
            AppEvent::PreviousTask => self.cycle_selection(false),
            AppEvent::ToggleTaskComplete => {
                if let Some(task) = self.selected() {
                    let result = self.state.planner().toggle_completed(&task.id);
                    self.report(result);
                }
            }
            AppEvent::ToggleChecklistItem(n) => {
                if let Some(task) = self.selected() {
                    if let Some(item) = task.checklist.get(n.saturating_sub(1)) {
                        let result = self.state.planner().toggle_checklist_item(&task.id, &item.id);
                        self.report(result);
                    }
                }
            }
            AppEvent::MoveTaskForward => self.move_selected(1),
            AppEvent::MoveTaskBack => self.move_selected(-1),
            AppEvent::Click { column, row } => self.click(column, row),

            AppEvent::Tick => {
                self.now = Local::now().naive_local();
                let snapshot = self.state.tick(self.now);
                tracing::debug!("Tick: {} active tasks", snapshot.active.len());
                self.snapshot = Some(snapshot);
            }
            AppEvent::Redraw => {}
        }
        Ok(false)
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(0),    // Month grid | day
                Constraint::Length(1), // Status bar
            ])
            .split(frame.area());

        self.render_header(frame, main_chunks[0]);

        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(58), Constraint::Percentage(42)])
            .split(main_chunks[1]);

        match self.state.month_view(self.now) {
            Ok(grid) => self.render_month(frame, content_chunks[0], &grid),
            Err(e) => {
                let paragraph = Paragraph::new(e.to_string())
                    .block(Block::default().borders(Borders::ALL).title("Month"))
                    .style(Style::default().fg(Color::Red));
                frame.render_widget(paragraph, content_chunks[0]);
            }
        }

        let right_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(content_chunks[1]);

        let layout = self.state.day_view(self.open_day(), self.now);
        let selected = self.selected();
        self.dial_area = Some(right_chunks[0]);
        self.render_dial(frame, right_chunks[0], &layout, selected.as_ref());
        self.render_detail(frame, right_chunks[1], selected.as_ref());
        self.render_status_bar(frame, main_chunks[2]);

        if self.mode == AppMode::Help {
            self.render_help(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let (year, month) = self.state.visible_month();
        let title = NaiveDate::from_ymd_opt(year, month, 1)
            .map(|d| d.format("%B %Y").to_string())
            .unwrap_or_default();

        let mut spans = vec![Span::styled(
            format!(" {title} "),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        for summary in self.state.planner().project_progress() {
            spans.push(Span::raw("  "));
            spans.push(Span::styled(
                format!("● {} {}%", summary.project.name, summary.score),
                Style::default().fg(hex_color(&summary.project.color)),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_month(&self, frame: &mut Frame, area: Rect, grid: &MonthGrid) {
        let open_day = self.open_day();
        let projects = self.state.planner().projects();

        let header = Row::new(WEEKDAYS.iter().map(|d| Cell::from(*d)))
            .style(Style::default().fg(Color::DarkGray));
        let rows: Vec<Row> = grid
            .weeks()
            .map(|week| {
                let cells = week.iter().map(|cell| {
                    let mut lines = vec![day_label(cell, cell.date == open_day)];
                    for entry in &cell.visible {
                        let base = resolve_color(&projects, &entry.project_id);
                        let mut style = Style::default()
                            .bg(blend(base, entry.shade.alpha))
                            .fg(tone_color(entry.shade.text));
                        if entry.is_active {
                            style = style.add_modifier(Modifier::BOLD);
                        }
                        lines.push(Line::from(Span::styled(
                            format!("{} {}", entry.start_time, entry.title),
                            style,
                        )));
                    }
                    if let Some(label) = cell.overflow_label() {
                        lines.push(Line::styled(label, Style::default().fg(Color::Gray)));
                    }
                    let mut style = Style::default();
                    if !cell.in_month {
                        style = style.fg(Color::DarkGray);
                    }
                    if cell.date == open_day {
                        style = style.bg(Color::Rgb(45, 45, 52));
                    }
                    Cell::from(Text::from(lines)).style(style)
                });
                Row::new(cells).height(5)
            })
            .collect();

        let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
            .header(header)
            .column_spacing(1)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(Color::Gray)),
            );
        frame.render_widget(table, area);
    }

    fn render_dial(&self, frame: &mut Frame, area: Rect, layout: &DayLayout, selected: Option<&Task>) {
        let g = layout.geometry;
        let width = 2.0 * g.center_x;
        let height = 2.0 * g.center_y;
        // Canvas y grows upward, the dial's downward.
        let flip = |(x, y): (f64, f64)| (x, height - y);

        let arcs: Vec<(Vec<(f64, f64)>, Color)> = layout
            .segments
            .iter()
            .map(|segment| {
                let emphasized = selected.is_some_and(|t| t.id == segment.task_id);
                (arc_points(segment, &flip), segment_color(segment, emphasized))
            })
            .collect();

        let hands = self.snapshot.as_ref().map_or(layout.hands, |s| s.hands);
        let hour_tip = flip(g.point_at(g.am_radius * 0.6, hands.hour_angle));
        let minute_tip = flip(g.point_at(g.pm_radius * 0.9, hands.minute_angle));
        let center = flip((g.center_x, g.center_y));

        let title = format!(" {} ", layout.date.format("%a %-d %b"));
        let canvas = Canvas::default()
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            )
            .marker(Marker::Braille)
            .x_bounds([0.0, width])
            .y_bounds([0.0, height])
            .paint(move |ctx| {
                ctx.draw(&Circle {
                    x: center.0,
                    y: center.1,
                    radius: g.face_radius,
                    color: Color::DarkGray,
                });
                for (points, color) in &arcs {
                    ctx.draw(&Points {
                        coords: points,
                        color: *color,
                    });
                }
                ctx.layer();
                for (tip, color) in [(hour_tip, Color::White), (minute_tip, Color::Gray)] {
                    ctx.draw(&CanvasLine {
                        x1: center.0,
                        y1: center.1,
                        x2: tip.0,
                        y2: tip.1,
                        color,
                    });
                }
            });
        frame.render_widget(canvas, area);
    }

    fn render_detail(&self, frame: &mut Frame, area: Rect, selected: Option<&Task>) {
        let block = Block::default()
            .title(" Task ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded);

        let Some(task) = selected else {
            let count = self.state.planner().tasks_on(self.open_day()).len();
            let message = if count == 0 {
                "No tasks on this day".to_string()
            } else {
                format!("{count} tasks. Tab to select one.")
            };
            frame.render_widget(
                Paragraph::new(message)
                    .block(block)
                    .style(Style::default().fg(Color::Gray)),
                area,
            );
            return;
        };

        let project = self.state.planner().project(&task.project_id);
        let color = project.as_ref().map_or(FALLBACK_COLOR, |p| p.color.as_str());
        let project_name = project.as_ref().map_or("Unknown project", |p| p.name.as_str());

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    if task.completed { "✔ " } else { "  " },
                    Style::default().fg(Color::Green),
                ),
                Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(vec![
                Span::styled("● ", Style::default().fg(hex_color(color))),
                Span::raw(format!("{project_name}  {}", task.time_range_display())),
            ]),
        ];
        if let Some(description) = &task.description {
            lines.push(Line::raw(""));
            lines.push(Line::raw(description.clone()));
        }
        if !task.checklist.is_empty() {
            lines.push(Line::raw(""));
            for (i, item) in task.checklist.iter().enumerate() {
                let mark = if item.completed { "[x]" } else { "[ ]" };
                lines.push(Line::raw(format!("{} {mark} {}", i + 1, item.text)));
            }
        }
        if !task.content_ideas.is_empty() {
            lines.push(Line::raw(""));
            for idea in &task.content_ideas {
                let label = match idea.kind {
                    ContentIdeaType::Video => "video",
                    ContentIdeaType::Story => "story",
                    ContentIdeaType::Image => "image",
                };
                lines.push(Line::from(vec![
                    Span::styled(format!("{label:>5} "), Style::default().fg(Color::DarkGray)),
                    Span::raw(idea.text.clone()),
                ]));
            }
        }

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let active = self.snapshot.as_ref().map_or(0, |s| s.active.len());
        let text = match &self.status {
            Some(status) => format!("{status} | {active} running"),
            None => format!(
                "hjkl/arrows: move | n/p: month | Tab: select | Space: done | 1-9: checklist | H/L: move task | ?: help | {active} running"
            ),
        };
        let style = if self.state.planner().is_loading() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(Paragraph::new(text).style(style), area);
    }

    fn render_help(&self, frame: &mut Frame) {
        let area = Self::centered_rect(60, 60, frame.area());
        let lines = vec![
            Line::styled("Keys", Style::default().add_modifier(Modifier::BOLD)),
            Line::raw(""),
            Line::raw("h/l, ←/→     previous / next day"),
            Line::raw("k/j, ↑/↓     previous / next week"),
            Line::raw("p/n          previous / next month"),
            Line::raw("t            today"),
            Line::raw("Tab/S-Tab    cycle selected task"),
            Line::raw("click        select the arc under the mouse"),
            Line::raw("Space        toggle task completed"),
            Line::raw("1-9          toggle checklist item"),
            Line::raw("H/L          move task a day back / forward"),
            Line::raw("Esc          clear selection"),
            Line::raw("r            reload from server"),
            Line::raw("q            quit"),
        ];
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .title(" Help ")
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded),
            ),
            area,
        );
    }

    fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
        let popup_layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ])
            .split(r);

        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ])
            .split(popup_layout[1])[1]
    }
}

fn day_label(cell: &DayCell, is_open: bool) -> Line<'static> {
    let mut style = Style::default();
    if cell.is_today {
        style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
    }
    if is_open {
        style = style.add_modifier(Modifier::REVERSED);
    }
    Line::styled(format!("{:>2}", cell.date.day()), style)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    crate::domain::month_grid::month_bounds(year, month)
        .map(|(_, last)| last.day())
        .unwrap_or(28)
}

/// Samples an arc every degree so the braille canvas draws it solid.
fn arc_points(segment: &Segment, flip: &impl Fn((f64, f64)) -> (f64, f64)) -> Vec<(f64, f64)> {
    let arc = &segment.arc;
    let steps = arc.sweep().ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let angle = arc.start_angle + arc.sweep() * i as f64 / steps as f64;
            flip(arc.point_at(angle))
        })
        .collect()
}

fn segment_color(segment: &Segment, emphasized: bool) -> Color {
    if emphasized {
        hex_color(&segment.color)
    } else {
        blend(&segment.color, segment.shade.alpha)
    }
}

fn hex_color(hex: &str) -> Color {
    let rgb = Rgb::from_hex(hex)
        .or_else(|| Rgb::from_hex(FALLBACK_COLOR))
        .unwrap_or(Rgb { r: 156, g: 163, b: 175 });
    Color::Rgb(rgb.r, rgb.g, rgb.b)
}

/// Composites a project color at `alpha` over the terminal background.
fn blend(hex: &str, alpha: f64) -> Color {
    let Color::Rgb(r, g, b) = hex_color(hex) else {
        return Color::Gray;
    };
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |fg: u8, bg: u8| (fg as f64 * alpha + bg as f64 * (1.0 - alpha)).round() as u8;
    Color::Rgb(mix(r, BACKGROUND.0), mix(g, BACKGROUND.1), mix(b, BACKGROUND.2))
}

fn tone_color(tone: TextTone) -> Color {
    hex_color(tone.css())
}

pub async fn run_tui(mut app: App) -> Result<()> {
    crossterm::terminal::enable_raw_mode()?;
    let outcome = run_loop(&mut app).await;
    finish(outcome, restore_terminal)
}

async fn run_loop(app: &mut App) -> Result<()> {
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture
    )?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    app.initialize().await?;

    let mut event_handler = EventHandler::new();

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let event = event_handler.next_event().await?;
        if app.handle_event(event).await? {
            break;
        }
    }
    Ok(())
}

fn restore_terminal() -> Result<()> {
    crossterm::terminal::disable_raw_mode()?;
    let mut stdout = std::io::stdout();
    crossterm::execute!(
        stdout,
        crossterm::event::DisableMouseCapture,
        crossterm::terminal::LeaveAlternateScreen
    )?;
    Ok(())
}

/// Runs `restore` whatever the outcome. An error from the loop wins over
/// one from restoring.
fn finish<T>(outcome: Result<T>, restore: impl FnOnce() -> Result<()>) -> Result<T> {
    let restored = restore();
    outcome.and_then(|value| restored.map(|()| value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cache::MokaCacheAdapter;
    use crate::adapters::memory::InMemoryPlannerRepository;
    use crate::application::PlannerService;
    use crate::domain::radial::DialGeometry;
    use crate::domain::task::fixtures::{item, task};
    use crate::domain::{Project, TaskId};

    async fn app() -> App {
        let project = Project {
            id: "p".into(),
            name: "Family".to_string(),
            color: "#3b82f6".to_string(),
            description: None,
        };
        let mut chores = task("chores", "p", "2024-12-05", "09:00", "10:00");
        chores.checklist = vec![item("a", "Dishes", false), item("b", "Laundry", false)];
        let repo = Arc::new(InMemoryPlannerRepository::with_data(
            vec![project],
            vec![chores, task("piano", "p", "2024-12-05", "16:00", "17:00")],
        ));
        let planner = Arc::new(PlannerService::new(repo, Arc::new(MokaCacheAdapter::new(60, 10))));
        planner.load(false).await;

        let day = NaiveDate::from_ymd_opt(2024, 12, 5).unwrap();
        let state = Arc::new(StateManager::new(planner, DialGeometry::default(), day));
        let mut app = App::new(state);
        app.now = day.and_hms_opt(9, 30, 0).unwrap();
        app.go_to(day);
        app
    }

    #[tokio::test]
    async fn test_opening_today_selects_running_task() {
        let app = app().await;
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("chores")));
    }

    #[tokio::test]
    async fn test_tab_cycles_through_day() {
        let mut app = app().await;
        app.handle_event(AppEvent::NextTask).await.unwrap();
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("piano")));
        app.handle_event(AppEvent::NextTask).await.unwrap();
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("chores")));
    }

    #[tokio::test]
    async fn test_digit_toggles_checklist_item() {
        let mut app = app().await;
        app.handle_event(AppEvent::ToggleChecklistItem(2)).await.unwrap();
        let task = app.selected().unwrap();
        assert!(!task.checklist[0].completed);
        assert!(task.checklist[1].completed);
    }

    #[tokio::test]
    async fn test_month_navigation_clamps_day() {
        let mut app = app().await;
        app.go_to(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        app.handle_event(AppEvent::NextMonth).await.unwrap();
        assert_eq!(app.open_day(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(app.state.visible_month(), (2025, 2));
    }

    #[tokio::test]
    async fn test_move_task_follows_it() {
        let mut app = app().await;
        app.handle_event(AppEvent::MoveTaskForward).await.unwrap();
        let next = NaiveDate::from_ymd_opt(2024, 12, 6).unwrap();
        assert_eq!(app.open_day(), next);
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("chores")));
    }

    #[tokio::test]
    async fn test_click_on_dial_selects_arc() {
        let mut app = app().await;
        app.dial_area = Some(Rect::new(0, 0, 32, 18));
        let g = *app.state.geometry();

        // The cell holding 16:30 on the outer track of a 30x16 inner area.
        let (x, y) = g.point_at(g.pm_radius, 135.0);
        let column = 1 + (x / (2.0 * g.center_x) * 30.0) as u16;
        let row = 1 + (y / (2.0 * g.center_y) * 16.0) as u16;
        app.handle_event(AppEvent::Click { column, row }).await.unwrap();
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("piano")));

        // The hub is on neither track.
        app.handle_event(AppEvent::Click { column: 16, row: 9 }).await.unwrap();
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("piano")));

        app.handle_event(AppEvent::Click { column: 0, row: 0 }).await.unwrap();
        assert_eq!(app.selected().map(|t| t.id), Some(TaskId::from("piano")));
    }

    #[test]
    fn test_terminal_is_restored_when_loop_fails() {
        let mut restored = false;
        let outcome: Result<()> = finish(Err(color_eyre::eyre::eyre!("draw failed")), || {
            restored = true;
            Ok(())
        });
        assert!(restored);
        assert_eq!(outcome.unwrap_err().to_string(), "draw failed");

        let outcome = finish(Ok(7), || Err(color_eyre::eyre::eyre!("still raw")));
        assert_eq!(outcome.unwrap_err().to_string(), "still raw");
    }

    #[test]
    fn test_text_tone_colors() {
        assert_eq!(tone_color(TextTone::Light), Color::Rgb(255, 255, 255));
        assert_eq!(tone_color(TextTone::Dark), Color::Rgb(31, 41, 55));
    }

    #[test]
    fn test_blend_fades_toward_background() {
        assert_eq!(blend("#ffffff", 1.0), Color::Rgb(255, 255, 255));
        assert_eq!(blend("#ffffff", 0.0), Color::Rgb(24, 24, 27));
        assert_eq!(hex_color("not a color"), Color::Rgb(156, 163, 175));
    }
}
