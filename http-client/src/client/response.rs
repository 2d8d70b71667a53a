use super::error::{ApiResult, Error, ErrorKind};
use reqpool_http::{header::HeaderMap, Response, ResponseParts, StatusCode};
use serde::de::DeserializeOwned;

/// A resolved API response: status code plus a body.
///
/// Comes out of a pooled request with the raw body bytes; `parse_json`
/// re-types the body while keeping the response parts.
#[derive(Debug, Default)]
pub struct ApiResponse<B>(Response<B>);

impl<B> ApiResponse<B> {
    pub(super) fn new(inner: Response<B>) -> Self {
        Self(inner)
    }

    #[inline]
    pub fn status_code(&self) -> StatusCode {
        self.0.status_code()
    }

    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        self.0.headers()
    }

    #[inline]
    pub fn parts(&self) -> &ResponseParts {
        self.0.parts()
    }

    #[inline]
    pub fn body(&self) -> &B {
        self.0.body()
    }

    #[inline]
    pub fn into_body(self) -> B {
        self.0.into_body()
    }
}

impl ApiResponse<Vec<u8>> {
    /// Decodes the body as JSON into `T`, keeping the response parts.
    ///
    /// A body that is not valid JSON for `T` yields
    /// [`ErrorKind::ParseResponseError`], independent of the transport
    /// outcome.
    pub fn parse_json<T: DeserializeOwned>(self) -> ApiResult<ApiResponse<T>> {
        let (parts, body) = self.0.into_parts_and_body();
        let parsed = serde_json::from_slice(&body)
            .map_err(|err| Error::new(ErrorKind::ParseResponseError, err))?;
        Ok(ApiResponse(Response::from_parts_and_body(parts, parsed)))
    }
}
