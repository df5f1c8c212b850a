use color_eyre::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use std::time::{Duration, Instant};

/// How often the dial hands and active highlighting are recomputed.
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);
const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    Quit,
    Refresh,
    ShowHelp,
    CloseModal,

    // Calendar navigation
    NextDay,
    PreviousDay,
    NextWeek,
    PreviousWeek,
    NextMonth,
    PreviousMonth,
    Today,

    // Open day
    NextTask,
    PreviousTask,
    ToggleTaskComplete,
    /// Toggles the n-th checklist item (1-based) of the selected task.
    ToggleChecklistItem(usize),
    MoveTaskForward,
    MoveTaskBack,
    /// Left click at a terminal cell.
    Click { column: u16, row: u16 },

    Tick,
    Redraw,
}

pub struct EventHandler {
    last_tick: Instant,
}

impl EventHandler {
    pub fn new() -> Self {
        Self {
            last_tick: Instant::now(),
        }
    }

    pub async fn next_event(&mut self) -> Result<AppEvent> {
        if self.last_tick.elapsed() >= TICK_INTERVAL {
            self.last_tick = Instant::now();
            return Ok(AppEvent::Tick);
        }

        if event::poll(POLL_INTERVAL)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    Ok(map_key(key).unwrap_or(AppEvent::Redraw))
                }
                Event::Mouse(mouse) => Ok(map_mouse(mouse).unwrap_or(AppEvent::Redraw)),
                _ => Ok(AppEvent::Redraw),
            }
        } else {
            Ok(AppEvent::Redraw)
        }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

pub fn map_key(key: KeyEvent) -> Option<AppEvent> {
    let event = match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => AppEvent::Quit,
        (KeyCode::Char('q'), _) => AppEvent::Quit,
        (KeyCode::Char('r'), KeyModifiers::NONE) => AppEvent::Refresh,
        (KeyCode::Char('?'), _) => AppEvent::ShowHelp,
        (KeyCode::Esc, _) => AppEvent::CloseModal,

        (KeyCode::Right | KeyCode::Char('l'), KeyModifiers::NONE) => AppEvent::NextDay,
        (KeyCode::Left | KeyCode::Char('h'), KeyModifiers::NONE) => AppEvent::PreviousDay,
        (KeyCode::Down | KeyCode::Char('j'), KeyModifiers::NONE) => AppEvent::NextWeek,
        (KeyCode::Up | KeyCode::Char('k'), KeyModifiers::NONE) => AppEvent::PreviousWeek,
        (KeyCode::PageDown | KeyCode::Char('n'), _) => AppEvent::NextMonth,
        (KeyCode::PageUp | KeyCode::Char('p'), _) => AppEvent::PreviousMonth,
        (KeyCode::Char('t'), KeyModifiers::NONE) => AppEvent::Today,

        (KeyCode::Tab, _) => AppEvent::NextTask,
        (KeyCode::BackTab, _) => AppEvent::PreviousTask,
        (KeyCode::Char(' '), _) => AppEvent::ToggleTaskComplete,
        (KeyCode::Char('L'), _) | (KeyCode::Right, KeyModifiers::SHIFT) => {
            AppEvent::MoveTaskForward
        }
        (KeyCode::Char('H'), _) | (KeyCode::Left, KeyModifiers::SHIFT) => AppEvent::MoveTaskBack,
        (KeyCode::Char(c @ '1'..='9'), _) => {
            AppEvent::ToggleChecklistItem(c.to_digit(10).unwrap_or(1) as usize)
        }
        _ => return None,
    };
    Some(event)
}

pub fn map_mouse(mouse: MouseEvent) -> Option<AppEvent> {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => Some(AppEvent::Click {
            column: mouse.column,
            row: mouse.row,
        }),
        _ => None,
    }
}
