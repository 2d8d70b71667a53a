use anyhow::Error as AnyError;
use assert_impl::assert_impl;
use http::uri::Uri;
use std::{
    error::Error as StdError,
    fmt::{self, Debug, Display},
};

/// Transport-level error kinds.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request URL is malformed or cannot be assembled.
    InvalidUrl,

    /// An HTTP header name or value is invalid.
    InvalidHeader,

    /// The request or response violates the HTTP contract.
    InvalidRequestResponse,

    /// Connecting to the server failed.
    ConnectError,

    /// Connecting through the proxy failed.
    ProxyError,

    /// The DNS server could not be reached or resolution failed.
    DnsServerError,

    /// Sending the request failed.
    SendError,

    /// Receiving the response failed.
    ReceiveError,

    /// A local I/O operation failed.
    LocalIoError,

    /// The call exceeded its timeout.
    TimeoutError,

    /// TLS negotiation failed.
    SslError,

    /// The server redirected too many times.
    TooManyRedirect,

    /// The caller cancelled the request.
    UserCanceled,

    /// Anything the transport cannot classify.
    UnknownError,
}

/// Transport-level error: a kind plus the underlying cause, optionally
/// annotated with the URI the call was addressed to.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    error: AnyError,
    uri: Option<Uri>,
}

impl Error {
    /// Starts building an error from a kind and an underlying cause.
    #[inline]
    pub fn builder(kind: ErrorKind, err: impl Into<AnyError>) -> ErrorBuilder {
        ErrorBuilder::new(kind, err)
    }

    /// Starts building an error from a kind and a bare message.
    #[inline]
    pub fn builder_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> ErrorBuilder {
        ErrorBuilder::new_with_msg(kind, msg)
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The URI of the call this error belongs to, when known.
    #[inline]
    pub fn uri(&self) -> Option<&Uri> {
        self.uri.as_ref()
    }

    #[inline]
    pub fn into_inner(self) -> AnyError {
        self.error
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}]", self.kind)?;
        if let Some(uri) = self.uri.as_ref() {
            write!(f, "[{}]", uri)?;
        }
        write!(f, " {}", self.error)
    }
}

impl StdError for Error {
    #[inline]
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(self.error.as_ref())
    }
}

/// Builder for [`Error`].
#[derive(Debug)]
pub struct ErrorBuilder {
    inner: Error,
}

impl ErrorBuilder {
    fn new(kind: ErrorKind, err: impl Into<AnyError>) -> Self {
        Self {
            inner: Error {
                kind,
                error: err.into(),
                uri: None,
            },
        }
    }

    fn new_with_msg(kind: ErrorKind, msg: impl Display + Debug + Send + Sync + 'static) -> Self {
        Self {
            inner: Error {
                kind,
                error: AnyError::msg(msg),
                uri: None,
            },
        }
    }

    /// Annotates the error with the URI of the call.
    #[inline]
    #[must_use]
    pub fn uri(mut self, uri: &Uri) -> Self {
        self.inner.uri = Some(uri.to_owned());
        self
    }

    #[inline]
    pub fn build(self) -> Error {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_carries_kind_and_uri() {
        env_logger::builder().is_test(true).try_init().ok();

        let uri: Uri = "http://example.com/path".parse().unwrap();
        let err = Error::builder_with_msg(ErrorKind::TimeoutError, "deadline exceeded")
            .uri(&uri)
            .build();
        assert_eq!(err.kind(), ErrorKind::TimeoutError);
        assert_eq!(err.uri(), Some(&uri));
        assert!(err.to_string().contains("deadline exceeded"));
    }
}
