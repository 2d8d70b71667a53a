use super::{
    behavior::{CombinedBehavior, RequestBehavior},
    behaviors::CacheBehavior,
    call::{PooledRequest, RequestId},
    endpoint::Endpoint,
    error::{ApiResult, Error},
    response::ApiResponse,
};
use assert_impl::assert_impl;
use dashmap::DashMap;
use log::{debug, warn};
use reqpool_http::HttpCaller;
use std::{
    fmt::{self, Debug},
    mem::take,
    sync::Arc,
};

/// Registry owning every in-flight request, keyed by identity.
///
/// Explicitly constructed and cheap to clone; every clone shares the same
/// registry. Completed requests are removed eagerly when they finish and
/// swept again after every insertion.
#[derive(Clone)]
pub struct RequestPool {
    inner: Arc<PoolInner>,
}

pub(super) struct PoolInner {
    caller: Arc<dyn HttpCaller>,
    behaviors: Vec<Arc<dyn RequestBehavior>>,
    cache: Option<CacheBehavior>,
    requests: DashMap<RequestId, Arc<PooledRequest>>,
}

impl PoolInner {
    /// Eagerly drops a request that reported completion.
    pub(super) fn complete(&self, id: &RequestId) {
        if self.requests.remove(id).is_some() {
            debug!("request {} finished and left the pool", id);
        }
    }

    fn clear_completed_requests(&self) {
        self.requests.retain(|_, request| !request.status().is_done());
    }
}

impl RequestPool {
    /// Creates a pool over the given transport with no pool-wide behaviors.
    #[inline]
    pub fn new(caller: impl HttpCaller + 'static) -> Self {
        Self::builder(caller).build()
    }

    /// Creates a pool builder over the given transport.
    #[inline]
    pub fn builder(caller: impl HttpCaller + 'static) -> RequestPoolBuilder {
        RequestPoolBuilder {
            caller: Arc::new(caller),
            behaviors: Vec::new(),
            cache: None,
        }
    }

    /// Builds a request from `endpoint`, registers it, and returns it.
    ///
    /// Pool-wide behaviors run before the per-request ones. Construction
    /// failure yields [`ErrorKind::MakeRequestError`](super::ErrorKind) and
    /// registers nothing.
    pub fn make(
        &self,
        name: Option<&str>,
        endpoint: &Endpoint,
        behaviors: Vec<Arc<dyn RequestBehavior>>,
    ) -> ApiResult<Arc<PooledRequest>> {
        let request = endpoint.to_request().map_err(Error::make_request)?;
        let id = name.map(RequestId::named).unwrap_or_else(RequestId::unique);

        let mut chain = self.inner.behaviors.to_owned();
        chain.extend(behaviors);

        let pooled = Arc::new(PooledRequest::new(
            id.to_owned(),
            request,
            CombinedBehavior::new(chain),
            self.inner.cache.to_owned(),
            Arc::clone(&self.inner.caller),
            Arc::downgrade(&self.inner),
        ));

        debug!("request {} joined the pool", id);
        self.inner.requests.insert(id, Arc::clone(&pooled));
        self.inner.clear_completed_requests();
        Ok(pooled)
    }

    /// Convenience for [`make`](Self::make) followed by
    /// [`perform`](PooledRequest::perform).
    ///
    /// When `make` fails, the failure is reported synchronously through
    /// `completion` and nothing is performed; `None` is returned.
    pub fn make_and_perform<F>(
        &self,
        name: Option<&str>,
        endpoint: &Endpoint,
        behaviors: Vec<Arc<dyn RequestBehavior>>,
        completion: F,
    ) -> Option<Arc<PooledRequest>>
    where
        F: FnOnce(ApiResult<ApiResponse<Vec<u8>>>) + Send + 'static,
    {
        match self.make(name, endpoint, behaviors) {
            Ok(request) => {
                if let Err(err) = request.perform(completion) {
                    warn!("failed to perform request {}: {}", request.id(), err);
                }
                Some(request)
            }
            Err(err) => {
                completion(Err(err));
                None
            }
        }
    }

    /// Requests cancellation of every tracked request.
    pub fn cancel_all(&self) {
        for entry in self.inner.requests.iter() {
            entry.value().cancel();
        }
    }

    /// Number of tracked requests.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.requests.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.requests.is_empty()
    }

    /// Looks up a tracked request by identity.
    pub fn get(&self, id: &RequestId) -> Option<Arc<PooledRequest>> {
        self.inner
            .requests
            .get(id)
            .map(|entry| Arc::clone(entry.value()))
    }

    #[allow(dead_code)]
    fn assert() {
        assert_impl!(Send: Self);
        assert_impl!(Sync: Self);
    }
}

impl Debug for RequestPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPool")
            .field("requests", &self.inner.requests.len())
            .field("behaviors", &self.inner.behaviors.len())
            .field("cached", &self.inner.cache.is_some())
            .finish()
    }
}

/// Builder for [`RequestPool`].
pub struct RequestPoolBuilder {
    caller: Arc<dyn HttpCaller>,
    behaviors: Vec<Arc<dyn RequestBehavior>>,
    cache: Option<CacheBehavior>,
}

impl RequestPoolBuilder {
    /// Registers a behavior applied to every request made through the pool.
    #[inline]
    pub fn behavior(&mut self, behavior: impl RequestBehavior + 'static) -> &mut Self {
        self.behaviors.push(Arc::new(behavior));
        self
    }

    /// Attaches a cache behavior to every request made through the pool.
    #[inline]
    pub fn cache_behavior(&mut self, cache: CacheBehavior) -> &mut Self {
        self.cache = Some(cache);
        self
    }

    /// Finishes the builder.
    pub fn build(&mut self) -> RequestPool {
        RequestPool {
            inner: Arc::new(PoolInner {
                caller: Arc::clone(&self.caller),
                behaviors: take(&mut self.behaviors),
                cache: self.cache.take(),
                requests: Default::default(),
            }),
        }
    }
}

impl Debug for RequestPoolBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPoolBuilder")
            .field("behaviors", &self.behaviors.len())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
