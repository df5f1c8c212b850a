mod app;
mod event;

pub use app::{run_tui, App};
