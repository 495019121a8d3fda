//! Scheduler module - the background poll loops.

mod scheduler_service;

pub use scheduler_service::{PollScheduler, SchedulerConfig};
