mod cache;
mod cached_value;
mod request;

pub use cache::Cache;
pub use cached_value::CachedValue;
pub use request::{CacheRequest, CacheResponse};
