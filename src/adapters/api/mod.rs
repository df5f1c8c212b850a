mod client;
mod dto;
mod planner_repo;

pub use client::PlannerClient;
pub use dto::*;
pub use planner_repo::HttpPlannerRepository;
