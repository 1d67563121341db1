//! Periodic job triggering.

mod config;
mod runner;

pub use config::{ScheduleError, ScheduleKind, SchedulerConfig};
pub use runner::Scheduler;
