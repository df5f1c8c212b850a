mod generator;

pub use generator::ChatScheduleGenerator;
