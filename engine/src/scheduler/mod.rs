mod driver;
mod scheduler;

pub use driver::SchedulerDriver;
pub use scheduler::{Scheduler, TaskHandle};
