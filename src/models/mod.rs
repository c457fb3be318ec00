pub mod constants;
pub mod schedule;
