use anyhow::Error as AnyError;
use reqpool_http::{
    header::{HeaderName, HeaderValue, CONTENT_LENGTH, USER_AGENT},
    CancellationToken, HttpCaller, ResponseError, ResponseErrorKind, StatusCode, SyncRequest,
    SyncResponse, SyncResponseResult, Version,
};
use std::{
    fmt::Display,
    io::{Cursor, Error as IoError, ErrorKind as IoErrorKind, Read, Result as IoResult},
};
use ureq::{
    Agent, Error as UreqError, ErrorKind as UreqErrorKind, Request as UreqRequest,
    Response as UreqResponse,
};

/// Ureq-backed HTTP transport.
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
}

impl Client {
    /// Wraps an existing ureq agent.
    #[inline]
    pub fn new(agent: Agent) -> Self {
        Self { agent }
    }
}

impl From<Agent> for Client {
    #[inline]
    fn from(agent: Agent) -> Self {
        Self::new(agent)
    }
}

impl Default for Client {
    #[inline]
    fn default() -> Self {
        Self {
            agent: ureq::agent(),
        }
    }
}

impl HttpCaller for Client {
    fn call(&self, request: &mut SyncRequest) -> SyncResponseResult {
        if request.cancellation().is_cancelled() {
            return Err(cancelled_error(request));
        }

        let ureq_request = make_ureq_request(&self.agent, request)?;
        match ureq_request.send(CancellableBody::new(request)) {
            Ok(response) => make_sync_response(response, request),
            Err(_) if request.cancellation().is_cancelled() => Err(cancelled_error(request)),
            Err(err) => {
                let kind = err.kind();
                match err {
                    UreqError::Status(_, response) => make_sync_response(response, request),
                    UreqError::Transport(transport) => {
                        Err(from_ureq_error(kind, AnyError::new(transport), request))
                    }
                }
            }
        }
    }
}

fn cancelled_error(request: &SyncRequest) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::UserCanceled,
        "the request was cancelled by the caller",
    )
    .uri(request.uri())
    .build()
}

fn make_user_agent(request: &SyncRequest) -> Result<HeaderValue, ResponseError> {
    let user_agent = format!("{}/reqpool-ureq", request.user_agent());
    HeaderValue::from_str(&user_agent)
        .map_err(|err| build_header_value_error(request, &user_agent, &err))
}

fn make_ureq_request(agent: &Agent, request: &SyncRequest) -> Result<UreqRequest, ResponseError> {
    let mut request_builder = agent
        .request(request.method().as_str(), &request.uri().to_string())
        .timeout(request.timeout());
    for (header_name, header_value) in request.headers() {
        request_builder =
            set_header_for_request_builder(request_builder, request, header_name, header_value)?;
    }
    request_builder = set_header_for_request_builder(
        request_builder,
        request,
        &USER_AGENT,
        &make_user_agent(request)?,
    )?;
    request_builder = request_builder.set(CONTENT_LENGTH.as_str(), &request.body().len().to_string());
    Ok(request_builder)
}

fn make_sync_response(response: UreqResponse, request: &SyncRequest) -> SyncResponseResult {
    let mut response_builder = SyncResponse::builder();
    response_builder
        .status_code(status_code_of_response(&response, request)?)
        .version(parse_http_version(response.http_version(), request)?);
    for header_name_str in response.headers_names() {
        if let Some(header_value_str) = response.header(&header_name_str) {
            let header_name = HeaderName::from_bytes(header_name_str.as_bytes())
                .map_err(|err| build_header_name_error(request, &header_name_str, &err))?;
            let header_value = HeaderValue::from_bytes(header_value_str.as_bytes())
                .map_err(|err| build_header_value_error(request, header_value_str, &err))?;
            response_builder.header(header_name, header_value);
        }
    }

    let mut body = Vec::new();
    response.into_reader().read_to_end(&mut body).map_err(|err| {
        ResponseError::builder(ResponseErrorKind::ReceiveError, err)
            .uri(request.uri())
            .build()
    })?;
    response_builder.bytes_as_body(body);
    Ok(response_builder.build())
}

fn build_status_code_error(request: &SyncRequest, code: u16, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidRequestResponse,
        format!("invalid status code({}): {}", code, err),
    )
    .uri(request.uri())
    .build()
}

fn build_header_name_error(request: &SyncRequest, header_name: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header name({}): {}", header_name, err),
    )
    .uri(request.uri())
    .build()
}

fn build_header_value_error(request: &SyncRequest, header_value: &str, err: &dyn Display) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({}): {}", header_value, err),
    )
    .uri(request.uri())
    .build()
}

fn convert_header_value_error(
    request: &SyncRequest,
    header_value: &HeaderValue,
    err: &dyn Display,
) -> ResponseError {
    ResponseError::builder_with_msg(
        ResponseErrorKind::InvalidHeader,
        format!("invalid header value({:?}): {}", header_value, err),
    )
    .uri(request.uri())
    .build()
}

fn set_header_for_request_builder(
    request_builder: UreqRequest,
    request: &SyncRequest,
    header_name: &HeaderName,
    header_value: &HeaderValue,
) -> Result<UreqRequest, ResponseError> {
    Ok(request_builder.set(
        header_name.as_str(),
        header_value
            .to_str()
            .map_err(|err| convert_header_value_error(request, header_value, &err))?,
    ))
}

fn status_code_of_response(response: &UreqResponse, request: &SyncRequest) -> Result<StatusCode, ResponseError> {
    StatusCode::from_u16(response.status())
        .map_err(|err| build_status_code_error(request, response.status(), &err))
}

fn parse_http_version(version: &str, request: &SyncRequest) -> Result<Version, ResponseError> {
    match version {
        "HTTP/0.9" => Ok(Version::HTTP_09),
        "HTTP/1.0" => Ok(Version::HTTP_10),
        "HTTP/1.1" => Ok(Version::HTTP_11),
        "HTTP/2.0" => Ok(Version::HTTP_2),
        "HTTP/3.0" => Ok(Version::HTTP_3),
        _ => Err(ResponseError::builder_with_msg(
            ResponseErrorKind::InvalidRequestResponse,
            format!("invalid http version: {}", version),
        )
        .uri(request.uri())
        .build()),
    }
}

fn from_ureq_error(kind: UreqErrorKind, err: AnyError, request: &SyncRequest) -> ResponseError {
    let response_error_kind = match kind {
        UreqErrorKind::InvalidUrl => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::UnknownScheme => ResponseErrorKind::InvalidUrl,
        UreqErrorKind::Dns => ResponseErrorKind::DnsServerError,
        UreqErrorKind::ConnectionFailed => ResponseErrorKind::ConnectError,
        UreqErrorKind::TooManyRedirects => ResponseErrorKind::TooManyRedirect,
        UreqErrorKind::BadStatus => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::BadHeader => ResponseErrorKind::InvalidHeader,
        UreqErrorKind::Io => ResponseErrorKind::LocalIoError,
        UreqErrorKind::InvalidProxyUrl => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyConnect => ResponseErrorKind::ProxyError,
        UreqErrorKind::ProxyUnauthorized => ResponseErrorKind::ProxyError,
        UreqErrorKind::HTTP => ResponseErrorKind::InvalidRequestResponse,
        UreqErrorKind::InsecureRequestHttpsOnly => ResponseErrorKind::SslError,
    };
    ResponseError::builder(response_error_kind, err)
        .uri(request.uri())
        .build()
}

/// Feeds the request body to ureq while polling the cancellation token, so
/// an in-flight upload aborts cooperatively.
struct CancellableBody<'a> {
    body: Cursor<&'a [u8]>,
    cancellation: CancellationToken,
}

impl<'a> CancellableBody<'a> {
    fn new(request: &'a SyncRequest) -> Self {
        Self {
            body: Cursor::new(request.body().as_slice()),
            cancellation: request.cancellation().to_owned(),
        }
    }
}

impl Read for CancellableBody<'_> {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        if self.cancellation.is_cancelled() {
            return Err(IoError::new(
                IoErrorKind::Other,
                "the request was cancelled by the caller",
            ));
        }
        self.body.read(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqpool_http::RequestParts;

    #[test]
    fn test_cancelled_token_short_circuits_the_call() {
        env_logger::builder().is_test(true).try_init().ok();

        let mut request = RequestParts::builder()
            .uri("http://127.0.0.1:1/never".parse().unwrap())
            .build_with_body(Vec::new());
        request.cancellation().cancel();

        let err = Client::default().call(&mut request).unwrap_err();
        assert_eq!(err.kind(), ResponseErrorKind::UserCanceled);
    }

    #[test]
    fn test_cancelled_body_reader_stops_reading() {
        env_logger::builder().is_test(true).try_init().ok();

        let request = RequestParts::builder()
            .uri("http://127.0.0.1:1/never".parse().unwrap())
            .build_with_body(b"payload".to_vec());

        let mut reader = CancellableBody::new(&request);
        let mut buf = [0u8; 3];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);

        request.cancellation().cancel();
        assert!(reader.read(&mut buf).is_err());
    }
}
