#![deny(unsafe_code)]

//! A pooled, behavior-driven HTTP request layer.
//!
//! Requests are described declaratively as [`Endpoint`] values, turned into
//! transport requests, and executed through a process-local [`RequestPool`]
//! which tracks every in-flight call, supports bulk cancellation, and
//! garbage-collects completed entries. Cross-cutting concerns (logging,
//! response caching) hook into the request lifecycle through the
//! [`RequestBehavior`] chain.

mod client;
mod spawn;

#[cfg(test)]
mod test_utils;

pub extern crate reqpool_http as http;

pub use client::{
    ApiResponse, ApiResult, CacheBehavior, CombinedBehavior, Endpoint, EndpointBuilder, Error,
    ErrorKind, LoggingBehavior, Multipart, Part, PartMetadata, PooledRequest, QueryPair,
    QueryPairKey, QueryPairValue, RequestBehavior, RequestId, RequestPool, RequestPoolBuilder,
    ResponseCache, Scheme, Status, DEFAULT_CACHE_LIFETIME, DEFAULT_SHRINK_INTERVAL,
};
