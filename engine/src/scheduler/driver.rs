use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use log::{info, warn};

use crate::scheduler::Scheduler;

/// Background thread that runs a `Scheduler` at a fixed resolution.
/// Dropping the driver stops the thread
pub struct SchedulerDriver {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SchedulerDriver {
    pub fn spawn(name: &str, scheduler: Arc<Scheduler>, resolution: Duration) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();

        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while thread_running.load(Ordering::Acquire) {
                    scheduler.run_due();
                    thread::sleep(resolution);
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!("Unable to spawn scheduler thread '{}': {}", name, error);
                None
            }
        };

        Self { running, handle }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some() && self.running.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Release);
        let Some(handle) = self.handle.take() else {
            return;
        };
        // a job running on this very thread may be the one stopping us
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!("Scheduler thread panicked");
        } else {
            info!("Scheduler thread stopped");
        }
    }
}

impl Drop for SchedulerDriver {
    fn drop(&mut self) {
        self.stop();
    }
}
