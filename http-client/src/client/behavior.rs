use reqpool_http::{header::HeaderMap, ResponseError, ResponseParts, SyncRequest};
use std::{fmt, sync::Arc};

/// A pluggable hook invoked around a request's lifecycle events.
///
/// Every method defaults to a no-op so implementations pick only the events
/// they care about.
pub trait RequestBehavior: Send + Sync {
    /// Headers this behavior wants on the outgoing request. Merged across
    /// the chain before sending; later behaviors win on conflicting keys.
    fn additional_headers(&self) -> HeaderMap {
        HeaderMap::new()
    }

    /// Called once, immediately before the transport call starts.
    fn before_send(&self, _request: &SyncRequest) {}

    /// Called after the transport call resolved successfully.
    fn after_success(&self, _response: &ResponseParts, _body: &[u8]) {}

    /// Called after the transport call failed (or was cancelled).
    fn after_failure(&self, _error: &ResponseError, _response: Option<&ResponseParts>) {}
}

/// Fans every lifecycle event out to a list of behaviors in registration
/// order.
#[derive(Clone, Default)]
pub struct CombinedBehavior {
    behaviors: Arc<[Arc<dyn RequestBehavior>]>,
}

impl CombinedBehavior {
    #[inline]
    pub fn new(behaviors: Vec<Arc<dyn RequestBehavior>>) -> Self {
        Self {
            behaviors: behaviors.into(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }
}

impl RequestBehavior for CombinedBehavior {
    fn additional_headers(&self) -> HeaderMap {
        let mut merged = HeaderMap::new();
        for behavior in self.behaviors.iter() {
            for (name, value) in behavior.additional_headers().iter() {
                merged.insert(name.to_owned(), value.to_owned());
            }
        }
        merged
    }

    fn before_send(&self, request: &SyncRequest) {
        for behavior in self.behaviors.iter() {
            behavior.before_send(request);
        }
    }

    fn after_success(&self, response: &ResponseParts, body: &[u8]) {
        for behavior in self.behaviors.iter() {
            behavior.after_success(response, body);
        }
    }

    fn after_failure(&self, error: &ResponseError, response: Option<&ResponseParts>) {
        for behavior in self.behaviors.iter() {
            behavior.after_failure(error, response);
        }
    }
}

impl fmt::Debug for CombinedBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedBehavior")
            .field("behaviors", &self.behaviors.len())
            .finish()
    }
}
