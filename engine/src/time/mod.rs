mod clock;
mod time_manager;

pub use clock::{Clock, ManualClock, SystemClock};
pub use time_manager::TimeManager;
