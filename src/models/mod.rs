pub mod interval;
pub mod schedule;
