mod planner_repo;

pub use planner_repo::InMemoryPlannerRepository;
