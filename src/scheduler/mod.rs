pub mod controller;
pub mod cycle;
pub mod loop_worker;
pub mod state;

pub use controller::SchedulerController;
pub use cycle::{Aggregator, CyclePlan};
pub use state::{SchedulerState, SchedulerStatus};
