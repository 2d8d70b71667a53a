use super::multipart::{Multipart, PATH_SEGMENT_ENCODE_SET};
use percent_encoding::utf8_percent_encode;
use reqpool_http::{
    header::{HeaderMap, HeaderValue, IntoHeaderName, ACCEPT, CONTENT_TYPE},
    Method, RequestParts, ResponseError, ResponseErrorKind, SyncRequest, Uri,
    DEFAULT_REQUEST_TIMEOUT,
};
use serde::Serialize;
use serde_json::Result as JsonResult;
use std::{borrow::Cow, fmt, mem::take, time::Duration};

/// URL scheme of an endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Scheme {
    Http,

    #[default]
    Https,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => f.write_str("http"),
            Self::Https => f.write_str("https"),
        }
    }
}

/// Query parameter key.
pub type QueryPairKey<'q> = Cow<'q, str>;

/// Query parameter value.
pub type QueryPairValue<'q> = Cow<'q, str>;

/// One query parameter.
pub type QueryPair<'q> = (QueryPairKey<'q>, QueryPairValue<'q>);

/// Declarative description of one HTTP call: where it goes and what it
/// carries. Immutable once built; [`Endpoint::to_request`] turns it into a
/// transport request.
#[derive(Debug, Default)]
pub struct Endpoint {
    scheme: Scheme,
    host: String,
    path: String,
    method: Method,
    query_pairs: Vec<QueryPair<'static>>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
    multipart: Option<Multipart>,
    timeout: Option<Duration>,
}

impl Endpoint {
    /// Creates an endpoint builder for the given host.
    #[inline]
    pub fn builder(host: impl Into<String>) -> EndpointBuilder {
        let mut builder = EndpointBuilder::default();
        builder.0.host = host.into();
        builder
    }

    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Builds the transport request this endpoint describes.
    ///
    /// Fails with [`ResponseErrorKind::InvalidUrl`] when scheme, host, path
    /// and query cannot form a valid URL, and with
    /// [`ResponseErrorKind::InvalidRequestResponse`] when a multipart part
    /// violates its size limit. Single attempt, no retries.
    pub fn to_request(&self) -> Result<SyncRequest, ResponseError> {
        let uri = self.to_uri()?;
        let mut builder = RequestParts::builder();
        builder
            .uri(uri)
            .method(self.method.to_owned())
            .headers(self.headers.to_owned())
            .timeout(self.timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT));
        let body = if let Some(multipart) = self.multipart.as_ref() {
            builder.header(
                CONTENT_TYPE,
                HeaderValue::from_str(&format!(
                    "multipart/form-data; boundary={}",
                    multipart.boundary()
                ))
                .unwrap(),
            );
            multipart.encode()?
        } else {
            self.body.to_owned().unwrap_or_default()
        };
        Ok(builder.build_with_body(body))
    }

    fn to_uri(&self) -> Result<Uri, ResponseError> {
        let mut url = format!("{}://{}", self.scheme, self.host);
        if !self.path.is_empty() {
            if !self.path.starts_with('/') {
                url.push('/');
            }
            url.push_str(&self.path);
        }
        if !self.query_pairs.is_empty() {
            let mut serializer = form_urlencoded::Serializer::new(String::new());
            for (key, value) in self.query_pairs.iter() {
                serializer.append_pair(key, value);
            }
            url.push('?');
            url.push_str(&serializer.finish());
        }
        url.parse::<Uri>().map_err(|err| {
            ResponseError::builder(ResponseErrorKind::InvalidUrl, err)
                .build()
        })
    }
}

/// Builder for [`Endpoint`].
#[derive(Debug, Default)]
pub struct EndpointBuilder(Endpoint);

impl EndpointBuilder {
    /// Sets the URL scheme. Defaults to HTTPS.
    #[inline]
    pub fn scheme(&mut self, scheme: Scheme) -> &mut Self {
        self.0.scheme = scheme;
        self
    }

    /// Sets the host.
    #[inline]
    pub fn host(&mut self, host: impl Into<String>) -> &mut Self {
        self.0.host = host.into();
        self
    }

    /// Sets the request path verbatim.
    #[inline]
    pub fn path(&mut self, path: impl Into<String>) -> &mut Self {
        self.0.path = path.into();
        self
    }

    /// Builds the request path from individual segments, percent-encoding
    /// each one.
    pub fn path_segments<S: AsRef<str>>(&mut self, segments: impl IntoIterator<Item = S>) -> &mut Self {
        let mut path = String::new();
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment.as_ref(), PATH_SEGMENT_ENCODE_SET));
        }
        self.0.path = path;
        self
    }

    /// Sets the HTTP method. Defaults to GET.
    #[inline]
    pub fn method(&mut self, method: Method) -> &mut Self {
        self.0.method = method;
        self
    }

    /// Replaces the query parameters wholesale.
    #[inline]
    pub fn query_pairs(&mut self, query_pairs: impl Into<Vec<QueryPair<'static>>>) -> &mut Self {
        self.0.query_pairs = query_pairs.into();
        self
    }

    /// Appends one query parameter.
    #[inline]
    pub fn append_query_pair(
        &mut self,
        key: impl Into<QueryPairKey<'static>>,
        value: impl Into<QueryPairValue<'static>>,
    ) -> &mut Self {
        self.0.query_pairs.push((key.into(), value.into()));
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
    pub fn set_header(&mut self, name: impl IntoHeaderName, value: impl Into<HeaderValue>) -> &mut Self {
        self.0.headers.insert(name, value.into());
        self
    }

    /// Announces that a JSON response is expected.
    #[inline]
    pub fn accept_json(&mut self) -> &mut Self {
        self.set_header(
            ACCEPT,
            HeaderValue::from_str(mime::APPLICATION_JSON.as_ref()).unwrap(),
        )
    }

    /// Sets the request body to raw bytes.
    #[inline]
    pub fn bytes_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.0.body = Some(body.into());
        self
    }

    /// Serializes `body` to JSON and marks the content type accordingly.
    pub fn json_body(&mut self, body: &(impl Serialize + ?Sized)) -> JsonResult<&mut Self> {
        self.0.body = Some(serde_json::to_vec(body)?);
        Ok(self.set_header(
            CONTENT_TYPE,
            HeaderValue::from_str(mime::APPLICATION_JSON.as_ref()).unwrap(),
        ))
    }

    /// Attaches a multipart form; it takes precedence over a plain body.
    #[inline]
    pub fn multipart(&mut self, multipart: Multipart) -> &mut Self {
        self.0.multipart = Some(multipart);
        self
    }

    /// Overrides the transport timeout for this call.
    #[inline]
    pub fn timeout(&mut self, timeout: Duration) -> &mut Self {
        self.0.timeout = Some(timeout);
        self
    }

    /// Finishes the builder, leaving it reusable in its default state.
    #[inline]
    pub fn build(&mut self) -> Endpoint {
        take(&mut self.0)
    }
}
