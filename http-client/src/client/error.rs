use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use reqpool_http::{ResponseError, ResponseErrorKind};
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
};

/// Outcome of a pooled request operation.
pub type ApiResult<T> = Result<T, Error>;

/// Request-layer error kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The endpoint could not form a transport request.
    MakeRequestError,

    /// The transport call failed; wraps the underlying kind.
    HttpError(ResponseErrorKind),

    /// The caller cancelled the request before its result was delivered.
    UserCanceled,

    /// The response body could not be decoded into the requested type.
    ParseResponseError,
}

/// Request-layer error: a kind plus the underlying cause.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
}

impl Error {
    /// Creates an error from a kind and an underlying cause.
    #[inline]
    pub fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Self {
            kind,
            error: err.into(),
        }
    }

    /// Creates an error from a kind and a bare message.
    #[inline]
    pub fn new_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self {
            kind,
            error: AnyError::msg(msg),
        }
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether this error reports a cancellation.
    #[inline]
    pub fn is_canceled(&self) -> bool {
        self.kind == ErrorKind::UserCanceled
    }

    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    /// Wraps a construction failure coming out of an endpoint.
    pub(super) fn make_request(err: ResponseError) -> Self {
        Self::new(ErrorKind::MakeRequestError, err)
    }

    /// Classifies a transport error, keeping cancellations distinct.
    pub(super) fn from_response_error(err: ResponseError) -> Self {
        match err.kind() {
            ResponseErrorKind::UserCanceled => Self::new(ErrorKind::UserCanceled, err),
            kind => Self::new(ErrorKind::HttpError(kind), err),
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.error)
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_classified_separately() {
        env_logger::builder().is_test(true).try_init().ok();

        let canceled = Error::from_response_error(
            ResponseError::builder_with_msg(ResponseErrorKind::UserCanceled, "canceled").build(),
        );
        assert_eq!(canceled.kind(), ErrorKind::UserCanceled);
        assert!(canceled.is_canceled());

        let timeout = Error::from_response_error(
            ResponseError::builder_with_msg(ResponseErrorKind::TimeoutError, "deadline").build(),
        );
        assert_eq!(
            timeout.kind(),
            ErrorKind::HttpError(ResponseErrorKind::TimeoutError)
        );
        assert!(!timeout.is_canceled());
    }
}
