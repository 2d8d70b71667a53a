use reqpool_http::{
    header::HeaderMap, HttpCaller, Method, ResponseError, ResponseErrorKind, StatusCode,
    SyncRequest, SyncResponse, SyncResponseResult, Uri,
};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    thread::sleep,
    time::Duration,
};

/// Responds 200 with an empty body.
pub(crate) fn fake_caller() -> impl HttpCaller {
    #[derive(Debug, Default)]
    struct FakeCaller;

    impl HttpCaller for FakeCaller {
        fn call(&self, _request: &mut SyncRequest) -> SyncResponseResult {
            Ok(Default::default())
        }
    }

    FakeCaller
}

/// Responds with the given status, headers and body, every time.
pub(crate) fn fixed_response_caller(
    status_code: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
) -> impl HttpCaller {
    #[derive(Debug)]
    struct FixedResponseCaller {
        status_code: StatusCode,
        headers: HeaderMap,
        body: Vec<u8>,
    }

    impl HttpCaller for FixedResponseCaller {
        fn call(&self, _request: &mut SyncRequest) -> SyncResponseResult {
            Ok(SyncResponse::builder()
                .status_code(self.status_code)
                .headers(self.headers.to_owned())
                .bytes_as_body(self.body.to_owned())
                .build())
        }
    }

    FixedResponseCaller {
        status_code,
        headers,
        body,
    }
}

/// Fails every call with the given kind and message.
pub(crate) fn error_caller(kind: ResponseErrorKind, message: impl Into<String>) -> impl HttpCaller {
    #[derive(Debug)]
    struct ErrorCaller {
        kind: ResponseErrorKind,
        message: String,
    }

    impl HttpCaller for ErrorCaller {
        fn call(&self, request: &mut SyncRequest) -> SyncResponseResult {
            Err(
                ResponseError::builder_with_msg(self.kind, self.message.to_owned())
                    .uri(request.uri())
                    .build(),
            )
        }
    }

    ErrorCaller {
        kind,
        message: message.into(),
    }
}

/// Sleeps before responding, leaving room to observe in-flight state.
pub(crate) fn delayed_response_caller(delay: Duration, body: Vec<u8>) -> impl HttpCaller {
    #[derive(Debug)]
    struct DelayedResponseCaller {
        delay: Duration,
        body: Vec<u8>,
    }

    impl HttpCaller for DelayedResponseCaller {
        fn call(&self, _request: &mut SyncRequest) -> SyncResponseResult {
            sleep(self.delay);
            Ok(SyncResponse::builder()
                .status_code(StatusCode::OK)
                .bytes_as_body(self.body.to_owned())
                .build())
        }
    }

    DelayedResponseCaller { delay, body }
}

/// Pops one prepared outcome per call, failing when none is left.
pub(crate) fn sequence_caller(
    responses: impl IntoIterator<Item = SyncResponseResult>,
) -> impl HttpCaller {
    #[derive(Debug)]
    struct SequenceCaller {
        responses: Mutex<VecDeque<SyncResponseResult>>,
    }

    impl HttpCaller for SequenceCaller {
        fn call(&self, _request: &mut SyncRequest) -> SyncResponseResult {
            self.responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(ResponseError::builder_with_msg(
                    ResponseErrorKind::UnknownError,
                    "the sequence caller ran out of prepared responses",
                )
                .build())
            })
        }
    }

    SequenceCaller {
        responses: Mutex::new(responses.into_iter().collect()),
    }
}

/// What a capturing caller saw of each request.
#[derive(Debug, Clone, Default)]
pub(crate) struct CapturedRequests {
    seen: Arc<Mutex<Vec<(Method, Uri, HeaderMap)>>>,
}

impl CapturedRequests {
    pub(crate) fn take(&self) -> Vec<(Method, Uri, HeaderMap)> {
        std::mem::take(&mut self.seen.lock().unwrap())
    }
}

/// Responds 200 empty while recording method, URI and headers of every call.
pub(crate) fn capturing_caller(captured: CapturedRequests) -> impl HttpCaller {
    #[derive(Debug)]
    struct CapturingCaller {
        captured: CapturedRequests,
    }

    impl HttpCaller for CapturingCaller {
        fn call(&self, request: &mut SyncRequest) -> SyncResponseResult {
            self.captured.seen.lock().unwrap().push((
                request.method().to_owned(),
                request.uri().to_owned(),
                request.headers().to_owned(),
            ));
            Ok(Default::default())
        }
    }

    CapturingCaller { captured }
}
