use std::ops::RangeInclusive;

/// Configures transport timeout, hook deadlines and the success status range.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds, enforced by the dispatcher
    /// around every transport call.
    pub timeout_ms: u64,
    /// Upper bound for each interceptor hook in milliseconds.
    ///
    /// `None` waits indefinitely. When set, an overrunning `before_request`
    /// sends the unmodified request and an overrunning `after_request` is
    /// treated as [`RetryDecision::DoNotRetry`](crate::RetryDecision::DoNotRetry).
    pub hook_timeout_ms: Option<u64>,
    /// Status codes classified as success.
    pub success_status: RangeInclusive<u16>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            hook_timeout_ms: None,
            success_status: 200..=299,
        }
    }
}
