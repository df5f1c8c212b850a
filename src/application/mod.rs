pub mod error;
pub mod planner_service;
pub mod state_manager;

pub use error::*;
pub use planner_service::*;
pub use state_manager::*;
