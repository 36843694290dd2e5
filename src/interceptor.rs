//! Interceptor capability and the stock implementations.
//!
//! An [`Interceptor`] may rewrite each outgoing attempt and is the only
//! authority on whether another attempt follows. The dispatcher has no
//! retry ceiling of its own; wrap unbounded policies in [`MaxAttempts`].

use std::{fmt, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{Request, ResponseMeta, RetryDecision};

/// Pluggable observer and retry policy.
///
/// `attempt` is 1-based: in `before_request` it numbers the attempt about
/// to be sent, in `after_request` the attempt that just completed.
#[async_trait]
pub trait Interceptor: Send + Sync {
    /// Returns the request to actually send. The default passes it through.
    async fn before_request(&self, request: Request, _attempt: usize) -> Request {
        request
    }

    /// Decides whether another attempt follows.
    ///
    /// `response` is `None` when the transport failed without a response.
    /// The dispatcher suspends the logical request until this resolves.
    async fn after_request(
        &self,
        _request: &Request,
        _response: Option<&ResponseMeta>,
        _attempt: usize,
    ) -> RetryDecision {
        RetryDecision::DoNotRetry
    }
}

#[async_trait]
impl<I: Interceptor + ?Sized> Interceptor for Arc<I> {
    async fn before_request(&self, request: Request, attempt: usize) -> Request {
        (**self).before_request(request, attempt).await
    }

    async fn after_request(
        &self,
        request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        (**self).after_request(request, response, attempt).await
    }
}

/// Runs child interceptors in insertion order.
///
/// `before_request` threads the request through every child.
/// `after_request` calls every child and returns the first decision that
/// is not [`RetryDecision::DoNotRetry`].
#[derive(Clone, Default)]
pub struct InterceptorChain {
    children: Vec<Arc<dyn Interceptor>>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorChain")
            .field("len", &self.children.len())
            .finish()
    }
}

impl InterceptorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an interceptor to the end of the chain.
    pub fn with(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.children.push(Arc::new(interceptor));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

#[async_trait]
impl Interceptor for InterceptorChain {
    async fn before_request(&self, request: Request, attempt: usize) -> Request {
        let mut request = request;
        for child in &self.children {
            request = child.before_request(request, attempt).await;
        }
        request
    }

    async fn after_request(
        &self,
        request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        let mut decision = RetryDecision::DoNotRetry;
        for child in &self.children {
            let next = child.after_request(request, response, attempt).await;
            if !decision.is_retry() {
                decision = next;
            }
        }
        decision
    }
}

/// Caps the total number of attempts an inner policy may cause.
#[derive(Clone, Debug)]
pub struct MaxAttempts<I> {
    inner: I,
    max_attempts: usize,
}

impl<I> MaxAttempts<I> {
    /// `max_attempts` counts the first attempt; `1` disables retries.
    pub fn new(inner: I, max_attempts: usize) -> Self {
        Self {
            inner,
            max_attempts,
        }
    }
}

#[async_trait]
impl<I: Interceptor> Interceptor for MaxAttempts<I> {
    async fn before_request(&self, request: Request, attempt: usize) -> Request {
        self.inner.before_request(request, attempt).await
    }

    async fn after_request(
        &self,
        request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        let decision = self.inner.after_request(request, response, attempt).await;
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry;
        }
        decision
    }
}

/// Retries throttling, server errors and failed connections with
/// exponential backoff.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackoffInterceptor {
    /// Maximum number of retries after the initial attempt.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds.
    pub base_backoff_ms: u64,
}

impl Default for BackoffInterceptor {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 250,
        }
    }
}

impl BackoffInterceptor {
    pub fn new(max_retries: usize, base_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            base_backoff_ms,
        }
    }

    fn should_retry_status(status: u16) -> bool {
        matches!(status, 429 | 500 | 502 | 503 | 504)
    }

    /// Delay before the retry that follows `attempt`.
    pub fn backoff(&self, attempt: usize) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as u32;
        let multiplier = 1u64 << exp;
        Duration::from_millis(self.base_backoff_ms.saturating_mul(multiplier))
    }
}

#[async_trait]
impl Interceptor for BackoffInterceptor {
    async fn after_request(
        &self,
        _request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        if attempt > self.max_retries {
            return RetryDecision::DoNotRetry;
        }
        let retryable = match response {
            Some(meta) => Self::should_retry_status(meta.status),
            None => true,
        };
        if !retryable {
            return RetryDecision::DoNotRetry;
        }

        let delay = self.backoff(attempt);
        #[cfg(feature = "tracing")]
        tracing::debug!("scheduling retry after attempt {} in {:?}", attempt, delay);
        RetryDecision::RetryWithDelay(delay)
    }
}

/// Logs every attempt at debug level and never retries.
#[cfg(feature = "tracing")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggingInterceptor;

#[cfg(feature = "tracing")]
#[async_trait]
impl Interceptor for LoggingInterceptor {
    async fn before_request(&self, request: Request, attempt: usize) -> Request {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt,
            "sending request"
        );
        request
    }

    async fn after_request(
        &self,
        request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        match response {
            Some(meta) => tracing::debug!(
                url = %request.url,
                status = meta.status,
                attempt,
                "response received"
            ),
            None => tracing::debug!(url = %request.url, attempt, "request failed without response"),
        }
        RetryDecision::DoNotRetry
    }
}
