mod auth;
mod config;
mod identity;
mod net_worker;
mod players;
mod replication;
mod router;
mod state;

pub use auth::{AuthDecision, Authenticator};
pub use config::WorkerConfig;
pub use identity::{IdentityReply, IdentityRequest};
pub use net_worker::NetWorker;
pub use replication::CreatePayload;
pub use state::WorkerState;
