use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, RwLock,
    },
    time::Duration,
};

use log::info;

use crate::{
    constants::SESSION_END_COOLDOWN,
    discovery::LocalEndpoint,
    scheduler::{Scheduler, SchedulerDriver, TaskHandle},
    session::{BandwidthCounters, LinkConditionerConfig},
    time::{Clock, SystemClock},
};

const SESSION_DRIVER_RESOLUTION: Duration = Duration::from_millis(10);

/// A random 128-bit identifier rendered as 32 hex digits
pub fn generate_instance_guid() -> String {
    format!("{:016x}{:016x}", fastrand::u64(..), fastrand::u64(..))
}

/// State shared by every worker in one process session.
///
/// Create one per process (or per test) and hand an `Arc` of it to each
/// `NetWorker`.
pub struct SessionContext {
    instance_guid: String,
    clock: Arc<dyn Clock>,
    scheduler: Arc<Scheduler>,
    ending_session: Arc<AtomicBool>,
    cooldown: Mutex<Option<TaskHandle>>,
    bandwidth: BandwidthCounters,
    link_conditioner: RwLock<Option<LinkConditionerConfig>>,
    local_endpoints: Mutex<Vec<LocalEndpoint>>,
    next_worker_key: AtomicU64,
    driver: Mutex<Option<SchedulerDriver>>,
}

impl SessionContext {
    /// A session on the system clock, with a background thread driving the
    /// session scheduler
    pub fn new() -> Arc<Self> {
        let session = Arc::new(Self::build(Arc::new(SystemClock::new())));
        let driver = SchedulerDriver::spawn(
            "peerlink-session",
            session.scheduler.clone(),
            SESSION_DRIVER_RESOLUTION,
        );
        if let Ok(mut slot) = session.driver.lock() {
            *slot = Some(driver);
        }
        session
    }

    /// A session on the given clock. Nothing drives the scheduler; call
    /// `scheduler().run_due()` yourself
    pub fn with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self::build(clock))
    }

    fn build(clock: Arc<dyn Clock>) -> Self {
        Self {
            instance_guid: generate_instance_guid(),
            scheduler: Arc::new(Scheduler::new(clock.clone())),
            clock,
            ending_session: Arc::new(AtomicBool::new(false)),
            cooldown: Mutex::new(None),
            bandwidth: BandwidthCounters::new(),
            link_conditioner: RwLock::new(None),
            local_endpoints: Mutex::new(Vec::new()),
            next_worker_key: AtomicU64::new(1),
            driver: Mutex::new(None),
        }
    }

    /// Minted once per session, identifies this process to remote peers
    pub fn instance_guid(&self) -> &str {
        &self.instance_guid
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn bandwidth(&self) -> &BandwidthCounters {
        &self.bandwidth
    }

    // Ending

    /// Tells background loops (discovery) to wind down. The flag clears
    /// itself after a cooldown so a new session can start
    pub fn end_session(&self) {
        self.ending_session.store(true, Ordering::Release);
        info!("Ending session");

        let flag = self.ending_session.clone();
        let handle = self.scheduler.schedule_once(SESSION_END_COOLDOWN, move || {
            flag.store(false, Ordering::Release);
        });

        if let Ok(mut cooldown) = self.cooldown.lock() {
            if let Some(previous) = cooldown.replace(handle) {
                self.scheduler.cancel(&previous);
            }
        }
    }

    pub fn is_ending_session(&self) -> bool {
        self.ending_session.load(Ordering::Acquire)
    }

    // Link conditioner

    pub fn set_link_conditioner(&self, config: Option<LinkConditionerConfig>) {
        if let Ok(mut current) = self.link_conditioner.write() {
            *current = config;
        }
    }

    pub fn link_conditioner(&self) -> Option<LinkConditionerConfig> {
        self.link_conditioner
            .read()
            .ok()
            .and_then(|config| config.clone())
            .filter(|config| !config.is_perfect())
    }

    // Discovery

    pub fn local_endpoints(&self) -> Vec<LocalEndpoint> {
        self.local_endpoints
            .lock()
            .map(|endpoints| endpoints.clone())
            .unwrap_or_default()
    }

    pub(crate) fn set_local_endpoints(&self, endpoints: Vec<LocalEndpoint>) {
        if let Ok(mut current) = self.local_endpoints.lock() {
            *current = endpoints;
        }
    }

    // Workers

    /// Unique nonzero key for each worker created in this session
    pub(crate) fn next_worker_key(&self) -> u64 {
        self.next_worker_key.fetch_add(1, Ordering::AcqRel)
    }
}
