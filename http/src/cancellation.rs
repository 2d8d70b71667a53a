use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Explicit cancellation token shared between a request and its transport call.
///
/// Cloning the token yields another handle to the same flag. Firing it is
/// advisory for transports that do not poll it; the pooled request layer
/// still suppresses result delivery after the fact.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    #[inline]
    pub fn new() -> Self {
        Default::default()
    }

    /// Marks the token as cancelled. Irreversible.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        env_logger::builder().is_test(true).try_init().ok();

        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        assert!(!clone.is_cancelled());

        clone.cancel();
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_fresh_tokens_are_independent() {
        env_logger::builder().is_test(true).try_init().ok();

        let token = CancellationToken::new();
        token.cancel();
        assert!(!CancellationToken::new().is_cancelled());
    }
}
