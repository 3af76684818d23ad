pub mod calendar_policy;
pub mod scheduler_service;
