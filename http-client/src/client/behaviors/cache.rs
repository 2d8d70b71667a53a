use super::super::cache::ResponseCache;
use log::debug;
use reqpool_http::{SyncRequest, SyncResponse};

/// Records successful responses and falls back to them when a later call
/// for the same method and URL comes back non-2xx.
///
/// Advisory only: whatever the cache evicted stays gone, and a miss leaves
/// the live response untouched.
#[derive(Debug, Clone, Default)]
pub struct CacheBehavior {
    cache: ResponseCache,
}

impl CacheBehavior {
    #[inline]
    pub fn new(cache: ResponseCache) -> Self {
        Self { cache }
    }

    #[inline]
    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    /// Applies the caching policy to a freshly resolved response.
    ///
    /// A 2xx response is recorded and passed through; for anything else a
    /// still-valid cached response for the same request is substituted when
    /// one exists.
    pub(in super::super) fn apply(&self, request: &SyncRequest, response: SyncResponse) -> SyncResponse {
        if response.status_code().is_success() {
            self.cache.set(request.method(), request.uri(), &response);
            return response;
        }
        match self.cache.get(request.method(), request.uri()) {
            Some(cached) => {
                debug!(
                    "substituting cached response for {} after {}",
                    request.parts(),
                    response.status_code()
                );
                cached
            }
            None => response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqpool_http::{Method, RequestParts, StatusCode, Uri};

    fn request(url: &str) -> SyncRequest {
        RequestParts::builder()
            .uri(url.parse::<Uri>().unwrap())
            .method(Method::GET)
            .build_with_body(Vec::new())
    }

    fn response(status_code: StatusCode, body: &str) -> SyncResponse {
        SyncResponse::builder()
            .status_code(status_code)
            .bytes_as_body(body.as_bytes().to_vec())
            .build()
    }

    #[test]
    fn test_success_is_recorded_and_passed_through() {
        env_logger::builder().is_test(true).try_init().ok();

        let behavior = CacheBehavior::default();
        let request = request("https://example.com/data");

        let out = behavior.apply(&request, response(StatusCode::OK, "fresh"));
        assert_eq!(out.body().as_slice(), b"fresh");
        assert_eq!(behavior.cache().len(), 1);
    }

    #[test]
    fn test_failure_substitutes_cached_response() {
        env_logger::builder().is_test(true).try_init().ok();

        let behavior = CacheBehavior::default();
        let request = request("https://example.com/data");

        behavior.apply(&request, response(StatusCode::OK, "remembered"));
        let substituted = behavior.apply(&request, response(StatusCode::INTERNAL_SERVER_ERROR, "oops"));
        assert_eq!(substituted.status_code(), StatusCode::OK);
        assert_eq!(substituted.body().as_slice(), b"remembered");
    }

    #[test]
    fn test_failure_without_cached_entry_passes_through() {
        env_logger::builder().is_test(true).try_init().ok();

        let behavior = CacheBehavior::default();
        let request = request("https://example.com/data");

        let out = behavior.apply(&request, response(StatusCode::NOT_FOUND, "missing"));
        assert_eq!(out.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(out.body().as_slice(), b"missing");
    }
}
