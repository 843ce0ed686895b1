mod bandwidth;
mod link_conditioner;
mod session_context;

pub use bandwidth::BandwidthCounters;
pub use link_conditioner::LinkConditionerConfig;
pub use session_context::{generate_instance_guid, SessionContext};
