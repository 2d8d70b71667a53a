mod cache;
mod logging;

pub use cache::CacheBehavior;
pub use logging::LoggingBehavior;
