pub mod ai;
pub mod api;
pub mod cache;
pub mod config;
pub mod memory;
pub mod svg;
pub mod tui;
