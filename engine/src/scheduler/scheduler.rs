use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use crate::time::Clock;

/// Identifies a scheduled task so it can be cancelled
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

enum Job {
    Once(Box<dyn FnOnce() + Send>),
    Every(Duration, Arc<dyn Fn() + Send + Sync>),
}

struct ScheduledTask {
    due: Duration,
    job: Job,
}

struct SchedulerInner {
    next_id: u64,
    tasks: HashMap<u64, ScheduledTask>,
}

/// Delay queue for one-shot and recurring work.
///
/// Nothing runs on its own: `run_due` executes whatever is due according to
/// the clock. A `SchedulerDriver` calls it periodically in production, tests
/// advance a `ManualClock` and call it directly.
pub struct Scheduler {
    clock: Arc<dyn Clock>,
    inner: Mutex<SchedulerInner>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            inner: Mutex::new(SchedulerInner {
                next_id: 0,
                tasks: HashMap::new(),
            }),
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn schedule_once<F: FnOnce() + Send + 'static>(&self, delay: Duration, job: F) -> TaskHandle {
        self.insert(delay, Job::Once(Box::new(job)))
    }

    /// First run happens one `period` from now
    pub fn schedule_every<F: Fn() + Send + Sync + 'static>(
        &self,
        period: Duration,
        job: F,
    ) -> TaskHandle {
        self.insert(period, Job::Every(period, Arc::new(job)))
    }

    /// Returns false if the task already ran (one-shot) or was cancelled
    pub fn cancel(&self, handle: &TaskHandle) -> bool {
        let Ok(mut inner) = self.inner.lock() else {
            return false;
        };
        inner.tasks.remove(&handle.0).is_some()
    }

    pub fn is_scheduled(&self, handle: &TaskHandle) -> bool {
        self.inner
            .lock()
            .map(|inner| inner.tasks.contains_key(&handle.0))
            .unwrap_or(false)
    }

    pub fn pending(&self) -> usize {
        self.inner.lock().map(|inner| inner.tasks.len()).unwrap_or(0)
    }

    /// Runs every task that is due, in order of due time. Jobs execute after
    /// the internal lock is released, so they may schedule or cancel tasks.
    /// Returns how many jobs ran
    pub fn run_due(&self) -> usize {
        let now = self.clock.now();

        let mut ready: Vec<(Duration, u64, ReadyJob)> = Vec::new();
        {
            let Ok(mut inner) = self.inner.lock() else {
                return 0;
            };

            let mut due_ids: Vec<u64> = inner
                .tasks
                .iter()
                .filter(|(_, task)| task.due <= now)
                .map(|(id, _)| *id)
                .collect();
            due_ids.sort_unstable();

            for id in due_ids {
                let Some(task) = inner.tasks.remove(&id) else {
                    continue;
                };
                match task.job {
                    Job::Once(job) => ready.push((task.due, id, ReadyJob::Once(job))),
                    Job::Every(period, job) => {
                        ready.push((task.due, id, ReadyJob::Every(job.clone())));
                        inner.tasks.insert(
                            id,
                            ScheduledTask {
                                due: now + period,
                                job: Job::Every(period, job),
                            },
                        );
                    }
                }
            }
        }

        ready.sort_by_key(|(due, id, _)| (*due, *id));
        let count = ready.len();
        for (_, _, job) in ready {
            match job {
                ReadyJob::Once(job) => job(),
                ReadyJob::Every(job) => job(),
            }
        }
        count
    }

    fn insert(&self, delay: Duration, job: Job) -> TaskHandle {
        let due = self.clock.now() + delay;
        let Ok(mut inner) = self.inner.lock() else {
            return TaskHandle(u64::MAX);
        };
        let id = inner.next_id;
        inner.next_id += 1;
        inner.tasks.insert(id, ScheduledTask { due, job });
        TaskHandle(id)
    }
}

enum ReadyJob {
    Once(Box<dyn FnOnce() + Send>),
    Every(Arc<dyn Fn() + Send + Sync>),
}
