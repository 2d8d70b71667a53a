mod behavior;
mod behaviors;
mod cache;
mod call;
mod endpoint;
mod error;
mod multipart;
mod pool;
mod response;

pub use behavior::{CombinedBehavior, RequestBehavior};
pub use behaviors::{CacheBehavior, LoggingBehavior};
pub use cache::{ResponseCache, DEFAULT_CACHE_LIFETIME, DEFAULT_SHRINK_INTERVAL};
pub use call::{PooledRequest, RequestId, Status};
pub use endpoint::{Endpoint, EndpointBuilder, QueryPair, QueryPairKey, QueryPairValue, Scheme};
pub use error::{ApiResult, Error, ErrorKind};
pub use multipart::{Multipart, Part, PartMetadata};
pub use pool::{RequestPool, RequestPoolBuilder};
pub use response::ApiResponse;
