use super::super::behavior::RequestBehavior;
use log::{info, warn};
use reqpool_http::{ResponseError, ResponseParts, SyncRequest};

/// Logs request lifecycle events through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

impl LoggingBehavior {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }
}

impl RequestBehavior for LoggingBehavior {
    fn before_send(&self, request: &SyncRequest) {
        info!("sending {} ({} body bytes)", request.parts(), request.body().len());
    }

    fn after_success(&self, response: &ResponseParts, body: &[u8]) {
        info!(
            "received {} ({} body bytes)",
            response.status_code(),
            body.len()
        );
    }

    fn after_failure(&self, error: &ResponseError, _response: Option<&ResponseParts>) {
        warn!("request failed: {}", error);
    }
}
