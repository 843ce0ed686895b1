mod behavior;
mod create_buffer;
mod factory;
mod network_object;
mod registry;
pub mod rpc;

pub use behavior::{ObjectBehavior, RpcCall};
pub use create_buffer::{CreateAction, CreateBuffer};
pub use factory::ObjectFactory;
pub use network_object::NetworkObject;
pub use registry::NetworkObjectRegistry;
