use super::ResponseError;
use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderValue, IntoHeaderName},
    status::StatusCode,
    version::Version,
};
use std::{
    mem::take,
    ops::{Deref, DerefMut},
};

/// Everything about an HTTP response except its body.
#[derive(Debug, Clone, Default)]
pub struct ResponseParts {
    status_code: StatusCode,
    headers: HeaderMap,
    version: Version,
}

impl ResponseParts {
    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.status_code
    }

    #[inline]
    pub fn status_code_mut(&mut self) -> &mut StatusCode {
        &mut self.status_code
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Looks up a single response header.
    #[inline]
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn version_mut(&mut self) -> &mut Version {
        &mut self.version
    }
}

/// An HTTP response: parts plus a body.
#[derive(Debug, Default)]
pub struct Response<B> {
    parts: ResponseParts,
    body: B,
}

/// A response whose body is held in memory.
pub type SyncResponse = Response<Vec<u8>>;

/// Outcome of a transport call.
pub type SyncResponseResult = Result<SyncResponse, ResponseError>;

impl<B> Response<B> {
    #[inline]
    pub fn body(&self) -> &B {
        &self.body
    }

    #[inline]
    pub fn body_mut(&mut self) -> &mut B {
        &mut self.body
    }

    #[inline]
    pub fn into_body(self) -> B {
        self.body
    }

    #[inline]
    pub fn parts(&self) -> &ResponseParts {
        &self.parts
    }

    #[inline]
    pub fn parts_mut(&mut self) -> &mut ResponseParts {
        &mut self.parts
    }

    #[inline]
    pub fn into_parts_and_body(self) -> (ResponseParts, B) {
        (self.parts, self.body)
    }

    #[inline]
    pub fn from_parts_and_body(parts: ResponseParts, body: B) -> Self {
        Self { parts, body }
    }

    /// Maps the body, keeping the parts.
    #[inline]
    pub fn map_body<B2>(self, f: impl FnOnce(B) -> B2) -> Response<B2> {
        let (parts, body) = self.into_parts_and_body();
        Response {
            parts,
            body: f(body),
        }
    }
}

impl SyncResponse {
    /// Creates a response builder.
    #[inline]
    pub fn builder() -> ResponseBuilder {
        Default::default()
    }
}

impl<B> Deref for Response<B> {
    type Target = ResponseParts;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}

impl<B> DerefMut for Response<B> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parts
    }
}

impl<B: Send + Sync> Response<B> {
    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

/// Builder for [`SyncResponse`].
#[derive(Debug, Default)]
pub struct ResponseBuilder(SyncResponse);

impl ResponseBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the response status code.
    #[inline]
    pub fn status_code(&mut self, status_code: StatusCode) -> &mut Self {
        self.0.parts.status_code = status_code;
        self
    }

    /// Replaces the response headers wholesale.
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.0.parts.headers = headers;
        self
    }

    /// Inserts a single response header.
    #[inline]
    pub fn header(&mut self, header_name: impl IntoHeaderName, header_value: impl Into<HeaderValue>) -> &mut Self {
        self.0.parts.headers.insert(header_name, header_value.into());
        self
    }

    /// Sets the HTTP version.
    #[inline]
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.0.parts.version = version;
        self
    }

    /// Sets the response body.
    #[inline]
    pub fn bytes_as_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.0.body = body.into();
        self
    }

    /// Finishes the builder, leaving it reusable in its default state.
    #[inline]
    pub fn build(&mut self) -> SyncResponse {
        take(&mut self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_body_keeps_parts() {
        env_logger::builder().is_test(true).try_init().ok();

        let response = SyncResponse::builder()
            .status_code(StatusCode::CREATED)
            .header(http::header::CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .bytes_as_body(b"12".to_vec())
            .build();

        let mapped = response.map_body(|body| body.len());
        assert_eq!(mapped.status_code(), StatusCode::CREATED);
        assert_eq!(mapped.header(http::header::CONTENT_TYPE).unwrap(), "text/plain");
        assert_eq!(*mapped.body(), 2);
    }
}
