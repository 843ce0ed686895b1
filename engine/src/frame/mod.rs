mod frame;
mod group_id;
mod receivers;
mod router_id;

pub use frame::{BinaryMessage, Frame, FrameBody};
pub use group_id::{GroupId, START_OF_APPLICATION_GROUP_IDS};
pub use receivers::Receivers;
pub use router_id::RouterId;
