use super::CancellationToken;
use assert_impl::assert_impl;
use http::{
    header::{HeaderMap, HeaderValue, IntoHeaderName},
    method::Method,
    uri::Uri,
    version::Version,
};
use once_cell::sync::Lazy;
use std::{
    fmt,
    mem::take,
    ops::{Deref, DerefMut},
    time::Duration,
};

/// Timeout applied to a request when the endpoint does not specify one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

static BASE_USER_AGENT: Lazy<Box<str>> =
    Lazy::new(|| format!("reqpool-http/{}", env!("CARGO_PKG_VERSION")).into());

/// Everything about an HTTP request except its body.
#[derive(Debug)]
pub struct RequestParts {
    uri: Uri,
    method: Method,
    version: Version,
    headers: HeaderMap,
    timeout: Duration,
    appended_user_agent: Box<str>,
    cancellation: CancellationToken,
}

impl RequestParts {
    /// Creates a request parts builder.
    #[inline]
    pub fn builder() -> RequestPartsBuilder {
        RequestPartsBuilder::default()
    }

    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    #[inline]
    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }

    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    #[inline]
    pub fn version_mut(&mut self) -> &mut Version {
        &mut self.version
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// The timeout the transport should apply to this call.
    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn timeout_mut(&mut self) -> &mut Duration {
        &mut self.timeout
    }

    /// The full user agent: the library product token plus the appended part.
    pub fn user_agent(&self) -> String {
        let mut user_agent = String::with_capacity(BASE_USER_AGENT.len() + self.appended_user_agent.len());
        user_agent.push_str(&BASE_USER_AGENT);
        user_agent.push_str(&self.appended_user_agent);
        user_agent
    }

    #[inline]
    pub fn appended_user_agent(&self) -> &str {
        &self.appended_user_agent
    }

    /// The cancellation token this request was built with.
    #[inline]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }
}

impl Default for RequestParts {
    #[inline]
    fn default() -> Self {
        Self {
            uri: Default::default(),
            method: Default::default(),
            version: Default::default(),
            headers: Default::default(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            appended_user_agent: Default::default(),
            cancellation: Default::default(),
        }
    }
}

/// Builder for [`RequestParts`].
#[derive(Debug, Default)]
pub struct RequestPartsBuilder(RequestParts);

impl RequestPartsBuilder {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the request URI.
    #[inline]
    pub fn uri(&mut self, uri: Uri) -> &mut Self {
        self.0.uri = uri;
        self
    }

    /// Sets the request method.
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.0.method = method;
        self
    }

    /// Sets the HTTP version.
    #[inline]
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.0.version = version;
        self
    }

    /// Replaces the request headers wholesale.
    #[inline]
    pub fn headers(&mut self, headers: HeaderMap) -> &mut Self {
        self.0.headers = headers;
        self
    }

    /// Inserts a single request header.
    #[inline]
    pub fn header(&mut self, header_name: impl IntoHeaderName, header_value: impl Into<HeaderValue>) -> &mut Self {
        self.0.headers.insert(header_name, header_value.into());
        self
    }

    /// Sets the transport timeout for this call.
    #[inline]
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.0.timeout = timeout;
        self
    }

    /// Appends a product token to the user agent.
    #[inline]
    pub fn appended_user_agent(&mut self, user_agent: impl Into<Box<str>>) -> &mut Self {
        self.0.appended_user_agent = user_agent.into();
        self
    }

    /// Supplies the cancellation token the request should carry.
    #[inline]
    pub fn cancellation(&mut self, token: CancellationToken) -> &mut Self {
        self.0.cancellation = token;
        self
    }

    /// Finishes the builder, leaving it reusable in its default state.
    #[inline]
    pub fn build(&mut self) -> RequestParts {
        take(&mut self.0)
    }

    /// Finishes the builder and attaches a body.
    #[inline]
    pub fn build_with_body<B>(&mut self, body: B) -> Request<B> {
        Request {
            parts: self.build(),
            body,
        }
    }
}

/// An HTTP request: parts plus a body.
#[derive(Debug, Default)]
pub struct Request<B> {
    parts: RequestParts,
    body: B,
}

/// A request whose body is held in memory.
pub type SyncRequest = Request<Vec<u8>>;

impl<B> Request<B> {
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
    pub fn parts(&self) -> &RequestParts {
        &self.parts
    }

    #[inline]
    pub fn parts_mut(&mut self) -> &mut RequestParts {
        &mut self.parts
    }
}

impl<B> Deref for Request<B> {
    type Target = RequestParts;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.parts
    }
}

impl<B> DerefMut for Request<B> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parts
    }
}

impl<B: Send + Sync> Request<B> {
    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl fmt::Display for RequestParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assembles_request() {
        env_logger::builder().is_test(true).try_init().ok();

        let request = RequestParts::builder()
            .uri("http://example.com/todos".parse().unwrap())
            .method(Method::POST)
            .header(http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .timeout(Duration::from_secs(5))
            .build_with_body(b"{}".to_vec());

        assert_eq!(request.method(), &Method::POST);
        assert_eq!(request.uri().host(), Some("example.com"));
        assert_eq!(request.timeout(), Duration::from_secs(5));
        assert_eq!(request.body(), &b"{}".to_vec());
        assert!(!request.cancellation().is_cancelled());
    }

    #[test]
    fn test_user_agent_appends_suffix() {
        env_logger::builder().is_test(true).try_init().ok();

        let parts = RequestParts::builder().appended_user_agent("/app-1.0").build();
        assert!(parts.user_agent().starts_with("reqpool-http/"));
        assert!(parts.user_agent().ends_with("/app-1.0"));
    }
}
