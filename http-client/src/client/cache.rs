use crate::spawn::spawn;
use dashmap::DashMap;
use log::{info, warn};
use reqpool_http::{Method, SyncResponse, Uri};
use std::{
    fmt::{self, Debug},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

/// Default lifetime of a cached response.
pub const DEFAULT_CACHE_LIFETIME: Duration = Duration::from_secs(300);

/// Default interval between shrink passes over the cache.
pub const DEFAULT_SHRINK_INTERVAL: Duration = Duration::from_secs(120);

/// In-memory store of recent responses keyed by method and URL.
///
/// Entries expire after the configured lifetime; expired entries are dropped
/// lazily on lookup and in bulk by a shrink pass that runs on a shared
/// background thread at most once per shrink interval.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    lifetime: Duration,
    shrink_interval: Duration,
    cache: DashMap<CacheKey, CacheValue>,
    locked_data: Mutex<CacheInnerLockedData>,
}

struct CacheInnerLockedData {
    last_shrunk_at: Instant,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: Box<str>,
    url: Box<str>,
}

impl CacheKey {
    fn new(method: &Method, url: &Uri) -> Self {
        Self {
            method: method.as_str().into(),
            url: url.to_string().into(),
        }
    }
}

struct CacheValue {
    response: CachedResponse,
    cached_at: Instant,
}

impl CacheValue {
    fn is_valid(&self, lifetime: Duration) -> bool {
        self.cached_at.elapsed() < lifetime
    }
}

/// Owned copy of a response, rebuildable on demand.
struct CachedResponse {
    parts: reqpool_http::ResponseParts,
    body: Vec<u8>,
}

impl CachedResponse {
    fn of(response: &SyncResponse) -> Self {
        Self {
            parts: response.parts().to_owned(),
            body: response.body().to_owned(),
        }
    }

    fn to_response(&self) -> SyncResponse {
        SyncResponse::from_parts_and_body(self.parts.to_owned(), self.body.to_owned())
    }
}

impl Default for ResponseCache {
    #[inline]
    fn default() -> Self {
        Self::in_memory(DEFAULT_CACHE_LIFETIME, DEFAULT_SHRINK_INTERVAL)
    }
}

impl ResponseCache {
    /// Creates a cache whose entries live for `lifetime` and whose shrink
    /// pass runs at most once per `shrink_interval`.
    pub fn in_memory(lifetime: Duration, shrink_interval: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                lifetime,
                shrink_interval,
                cache: Default::default(),
                locked_data: Mutex::new(CacheInnerLockedData {
                    last_shrunk_at: Instant::now(),
                }),
            }),
        }
    }

    /// Looks up a still-valid cached response for `method` + `url`.
    pub(super) fn get(&self, method: &Method, url: &Uri) -> Option<SyncResponse> {
        let key = CacheKey::new(method, url);
        let found = {
            let value = self.inner.cache.get(&key)?;
            if value.is_valid(self.inner.lifetime) {
                Some(value.response.to_response())
            } else {
                None
            }
        };
        if found.is_none() {
            self.inner.cache.remove(&key);
        }
        do_some_work_async(&self.inner);
        found
    }

    /// Records a response for `method` + `url`.
    pub(super) fn set(&self, method: &Method, url: &Uri, response: &SyncResponse) {
        self.inner.cache.insert(
            CacheKey::new(method, url),
            CacheValue {
                response: CachedResponse::of(response),
                cached_at: Instant::now(),
            },
        );
        do_some_work_async(&self.inner);
    }

    /// Drops the entry for `method` + `url`, if any.
    pub fn remove(&self, method: &Method, url: &Uri) {
        self.inner.cache.remove(&CacheKey::new(method, url));
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.inner.cache.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }
}

fn do_some_work_async(inner: &Arc<CacheInner>) {
    if !is_time_to_shrink(inner) {
        return;
    }
    let inner = Arc::clone(inner);
    if let Err(err) = spawn("reqpool-cache-shrink".to_owned(), move || {
        shrink_cache(&inner);
    }) {
        warn!("failed to start the cache shrink thread: {}", err);
    }
}

fn is_time_to_shrink(inner: &CacheInner) -> bool {
    let mut locked_data = inner.locked_data.lock().unwrap();
    if locked_data.last_shrunk_at.elapsed() >= inner.shrink_interval {
        locked_data.last_shrunk_at = Instant::now();
        return true;
    }
    false
}

fn shrink_cache(inner: &CacheInner) {
    let before = inner.cache.len();
    inner.cache.retain(|_, value| value.is_valid(inner.lifetime));
    let dropped = before.saturating_sub(inner.cache.len());
    if dropped > 0 {
        info!("cache shrink pass dropped {} expired responses", dropped);
    }
}

impl Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("lifetime", &self.inner.lifetime)
            .field("shrink_interval", &self.inner.shrink_interval)
            .field("len", &self.inner.cache.len())
            .finish()
    }
}
