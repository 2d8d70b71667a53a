use super::{
    behavior::{CombinedBehavior, RequestBehavior},
    behaviors::CacheBehavior,
    error::{ApiResult, Error, ErrorKind},
    pool::PoolInner,
    response::ApiResponse,
};
use crate::spawn::spawn;
use assert_impl::assert_impl;
use log::debug;
use reqpool_http::{
    CancellationToken, HttpCaller, ResponseError, ResponseErrorKind, SyncRequest,
};
use serde::de::DeserializeOwned;
use std::{
    fmt::{self, Debug, Display},
    sync::{
        atomic::{AtomicU8, AtomicUsize, Ordering},
        Arc, Mutex, Weak,
    },
};

/// Identity of a pooled request.
///
/// Named requests share one identity per name; unnamed requests get a
/// process-unique identity that can never collide with a named one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestId {
    Named(Box<str>),
    Unique(usize),
}

static NEXT_UNIQUE_ID: AtomicUsize = AtomicUsize::new(0);

impl RequestId {
    pub(super) fn named(name: &str) -> Self {
        Self::Named(name.into())
    }

    pub(super) fn unique() -> Self {
        Self::Unique(NEXT_UNIQUE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Unique(id) => write!(f, "#{}", id),
        }
    }
}

/// Lifecycle stage of a pooled request.
///
/// Moves strictly forward: `Idle` → `InFlight` → `Done`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Idle = 0,
    InFlight = 1,
    Done = 2,
}

impl Status {
    #[inline]
    pub fn is_done(self) -> bool {
        self == Self::Done
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::InFlight,
            _ => Self::Done,
        }
    }
}

/// One asynchronous network call owned by the pool.
///
/// Created by [`RequestPool::make`](super::RequestPool::make), performed at
/// most once, and removed from the pool when it reaches [`Status::Done`].
pub struct PooledRequest {
    id: RequestId,
    request: Mutex<SyncRequest>,
    behaviors: CombinedBehavior,
    cache: Option<CacheBehavior>,
    cancellation: CancellationToken,
    status: AtomicU8,
    caller: Arc<dyn HttpCaller>,
    pool: Weak<PoolInner>,
}

impl PooledRequest {
    pub(super) fn new(
        id: RequestId,
        request: SyncRequest,
        behaviors: CombinedBehavior,
        cache: Option<CacheBehavior>,
        caller: Arc<dyn HttpCaller>,
        pool: Weak<PoolInner>,
    ) -> Self {
        let cancellation = request.cancellation().to_owned();
        Self {
            id,
            request: Mutex::new(request),
            behaviors,
            cache,
            cancellation,
            status: AtomicU8::new(Status::Idle as u8),
            caller,
            pool,
        }
    }

    #[inline]
    pub fn id(&self) -> &RequestId {
        &self.id
    }

    #[inline]
    pub fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::Acquire))
    }

    /// Requests cancellation.
    ///
    /// The token is polled by cooperative transports; regardless, once it
    /// fires the result of the call is discarded and a cancellation error is
    /// reported instead. The entry stays in the pool until the call
    /// resolves.
    pub fn cancel(&self) {
        debug!("request {} cancelled", self.id);
        self.cancellation.cancel();
    }

    /// Executes the call on a background thread and reports the outcome
    /// through `completion`, exactly once.
    ///
    /// Fails fast when the request was already performed or the worker
    /// thread cannot be started; `completion` is not invoked in either case.
    pub fn perform<F>(self: &Arc<Self>, completion: F) -> ApiResult<()>
    where
        F: FnOnce(ApiResult<ApiResponse<Vec<u8>>>) + Send + 'static,
    {
        self.transition_to_in_flight()?;
        let this = Arc::clone(self);
        spawn(format!("reqpool-request-{}", self.id), move || {
            let result = this.execute();
            this.finish();
            completion(result);
        })
        .map_err(|err| Error::new(ErrorKind::MakeRequestError, err))
    }

    /// Like [`perform`](Self::perform), decoding the successful body as
    /// JSON into `T`.
    pub fn perform_json<T, F>(self: &Arc<Self>, completion: F) -> ApiResult<()>
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(ApiResult<ApiResponse<T>>) + Send + 'static,
    {
        self.perform(move |result| completion(result.and_then(ApiResponse::parse_json)))
    }

    fn transition_to_in_flight(&self) -> ApiResult<()> {
        self.status
            .compare_exchange(
                Status::Idle as u8,
                Status::InFlight as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(drop)
            .map_err(|_| {
                Error::new_with_msg(
                    ErrorKind::MakeRequestError,
                    "the request has already been performed",
                )
            })
    }

    fn execute(&self) -> ApiResult<ApiResponse<Vec<u8>>> {
        let mut request = self.request.lock().unwrap();
        for (name, value) in self.behaviors.additional_headers().iter() {
            request.headers_mut().insert(name.to_owned(), value.to_owned());
        }
        self.behaviors.before_send(&request);

        let result = self.caller.call(&mut request);

        if self.cancellation.is_cancelled() {
            let error = ResponseError::builder_with_msg(
                ResponseErrorKind::UserCanceled,
                "the request was cancelled by the caller",
            )
            .uri(request.uri())
            .build();
            self.behaviors.after_failure(&error, None);
            return Err(Error::from_response_error(error));
        }

        match result {
            Ok(response) => {
                let response = match self.cache.as_ref() {
                    Some(cache) => cache.apply(&request, response),
                    None => response,
                };
                let (parts, body) = response.into_parts_and_body();
                self.behaviors.after_success(&parts, &body);
                Ok(ApiResponse::new(reqpool_http::Response::from_parts_and_body(parts, body)))
            }
            Err(error) => {
                self.behaviors.after_failure(&error, None);
                Err(Error::from_response_error(error))
            }
        }
    }

    /// The `finally` of a perform: the request is done no matter the
    /// outcome, and the pool drops it eagerly.
    fn finish(&self) {
        self.status.store(Status::Done as u8, Ordering::Release);
        if let Some(pool) = self.pool.upgrade() {
            pool.complete(&self.id);
        }
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Debug for PooledRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledRequest")
            .field("id", &self.id)
            .field("status", &self.status())
            .field("behaviors", &self.behaviors)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
