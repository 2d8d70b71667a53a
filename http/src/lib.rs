#![deny(unsafe_code)]

//! Transport-level types for the reqpool request layer.
//!
//! This crate defines the vocabulary the pool speaks to its transport:
//! request and response values, the error taxonomy, the cancellation token,
//! and the [`HttpCaller`] seam an actual HTTP implementation plugs into.

mod cancellation;
mod error;
mod request;
mod response;

pub use http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    method::Method,
    status::StatusCode,
    uri::Uri,
    version::Version,
};

pub use cancellation::CancellationToken;
pub use error::{Error as ResponseError, ErrorBuilder as ResponseErrorBuilder, ErrorKind as ResponseErrorKind};
pub use request::{
    Request, RequestParts, RequestPartsBuilder, SyncRequest, DEFAULT_REQUEST_TIMEOUT,
};
pub use response::{
    Response, ResponseBuilder, ResponseParts, SyncResponse, SyncResponseResult,
};

/// Processes the HTTP requests issued through this library.
///
/// Implement this trait to put an actual transport under the request pool.
/// Implementations are expected to honor the request's
/// [`CancellationToken`] cooperatively and report
/// [`ResponseErrorKind::UserCanceled`] when it fires mid-call.
pub trait HttpCaller: Send + Sync {
    /// Sends the request and blocks until a response or an error is available.
    fn call(&self, request: &mut SyncRequest) -> SyncResponseResult;
}
