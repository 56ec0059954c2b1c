pub mod field;
pub mod heuristic;
pub mod structured;
