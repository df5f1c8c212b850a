pub mod error;
pub mod month_grid;
pub mod progress;
pub mod project;
pub mod radial;
pub mod task;
pub mod time;

pub use error::*;
pub use project::*;
pub use task::*;

/// Neutral gray used when a task's project can't be resolved.
pub const FALLBACK_COLOR: &str = "#9ca3af";
