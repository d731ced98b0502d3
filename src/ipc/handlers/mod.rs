pub mod analytics;
pub mod attendance;
pub mod core;
pub mod exchange;
pub mod remarks;
pub mod reports;
pub mod students;
pub mod subjects;
