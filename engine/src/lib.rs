//! # PeerLink Engine
//! A peer-replication networking engine: a server and its clients share a
//! namespace of network objects, exchange framed messages over a pluggable
//! transport, call remote procedures on each other's objects and keep their
//! clocks in step.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub mod cache;
pub mod codec;
pub mod discovery;
pub mod frame;
pub mod object;

mod constants;
mod error;
mod events;
mod player;
mod scheduler;
mod session;
mod time;
mod transport;
mod types;
mod worker;

pub use constants::{
    DEFAULT_DISCOVERY_PORT, DISCOVERY_CLIENT_CODE, DISCOVERY_PROBE, DISCOVERY_SERVER_CODE,
    FIRST_NETWORK_ID, HEARTBEAT_TICK, SERVER_PLAYER_ID, SESSION_END_COOLDOWN,
};
pub use error::{TransportError, WorkerError};
pub use events::{
    BinaryMessageEvent, MessageEvent, ObjectCreatedEvent, ObserverKey, Observers, PongEvent,
    TextMessageEvent, WorkerEvents,
};
pub use frame::{BinaryMessage, Frame, FrameBody, GroupId, Receivers, RouterId};
pub use object::{NetworkObject, ObjectBehavior, RpcCall};
pub use player::{NetworkingPlayer, PlayerRegistry, PlayerState};
pub use scheduler::{Scheduler, SchedulerDriver, TaskHandle};
pub use session::{generate_instance_guid, BandwidthCounters, LinkConditionerConfig, SessionContext};
pub use time::{Clock, ManualClock, SystemClock, TimeManager};
pub use transport::Transport;
pub use types::{CreateCode, HostType, NetworkId, PlayerId, Timestep};
pub use worker::{
    AuthDecision, Authenticator, CreatePayload, IdentityReply, IdentityRequest, NetWorker,
    WorkerConfig, WorkerState,
};
