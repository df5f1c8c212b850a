pub mod cache;
pub mod config_store;
pub mod planner_repository;
pub mod schedule_generator;

pub use cache::*;
pub use config_store::*;
pub use planner_repository::*;
pub use schedule_generator::*;
