mod observers;
mod worker_events;

pub use observers::{ObserverKey, Observers};
pub use worker_events::{
    BinaryMessageEvent, MessageEvent, ObjectCreatedEvent, PongEvent, TextMessageEvent,
    WorkerEvents,
};
