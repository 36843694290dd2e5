use std::{fmt, future::Future, io, ops::RangeInclusive, sync::Arc, time::Duration};

use tokio::{task::JoinHandle, time::sleep};

use crate::{
    ClientOptions, Interceptor, NetworkError, Request, ReqwestTransport, ResponseMeta, Result,
    RetryDecision, Transport, TransportError, TransportReply,
};

/// Drives each logical request through one or more transport attempts.
///
/// Attempts for one request are strictly sequential; independent requests
/// run concurrently on the tokio runtime. Before every attempt the
/// interceptor's `before_request` receives a fresh clone of the caller's
/// request, so rewrites never accumulate across retries. Without an
/// interceptor exactly one attempt is made.
///
/// Outcomes are delivered exactly once: async entry points resolve on the
/// awaiting task, [`Dispatcher::submit`] invokes its callback on the task
/// it spawns. The same finalization runs for first and retried attempts.
pub struct Dispatcher<T = ReqwestTransport> {
    transport: Arc<T>,
    interceptor: Option<Arc<dyn Interceptor>>,
    options: ClientOptions,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            interceptor: self.interceptor.clone(),
            options: self.options.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Dispatcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("transport", &self.transport)
            .field(
                "interceptor",
                &self.interceptor.as_ref().map(|_| "<interceptor>"),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl Dispatcher<ReqwestTransport> {
    /// Creates a dispatcher over a default `reqwest` client.
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }
}

impl Default for Dispatcher<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport + 'static> Dispatcher<T> {
    pub fn with_transport(transport: T) -> Self {
        Self::with_shared_transport(Arc::new(transport))
    }

    /// Creates a dispatcher over a transport that is also held elsewhere.
    pub fn with_shared_transport(transport: Arc<T>) -> Self {
        Self {
            transport,
            interceptor: None,
            options: ClientOptions::default(),
        }
    }

    /// Attaches an interceptor, replacing any previous one.
    ///
    /// Use [`InterceptorChain`](crate::InterceptorChain) to combine several.
    pub fn with_interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptor = Some(Arc::new(interceptor));
        self
    }

    /// Applies the per-attempt timeout, hook deadlines and the success range.
    ///
    /// The timeout wraps every `Transport::execute` call, whatever the
    /// transport; an overrun is reported as a timed-out transport error.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends a GET request and classifies the final attempt.
    pub async fn get(&self, url: &str, headers: &[(&str, &str)]) -> Result<Vec<u8>> {
        let request = Request::get(url)?.with_headers(headers.iter().copied())?;
        self.send(request).await
    }

    /// Sends a POST request and classifies the final attempt.
    pub async fn post(
        &self,
        url: &str,
        body: impl Into<Vec<u8>>,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>> {
        let request = Request::post(url, body)?.with_headers(headers.iter().copied())?;
        self.send(request).await
    }

    /// Dispatches `request` and classifies the final attempt.
    pub async fn send(&self, request: Request) -> Result<Vec<u8>> {
        let reply = self.dispatch(request).await;
        self.finalize(reply)
    }

    /// Like [`Dispatcher::send`], but stops once `cancel` resolves.
    ///
    /// Cancellation is honored while waiting on the transport, on an
    /// interceptor hook or on a retry delay; no attempt starts afterwards.
    pub async fn send_until<F>(&self, request: Request, cancel: F) -> Result<Vec<u8>>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            reply = self.dispatch(request) => self.finalize(reply),
            () = cancel => {
                #[cfg(feature = "tracing")]
                tracing::debug!("dispatch cancelled by caller");
                Err(NetworkError::Cancelled)
            }
        }
    }

    /// Spawns the dispatch onto the current tokio runtime and hands the
    /// outcome to `on_complete` exactly once, on the spawned task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit<F>(&self, request: Request, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(Result<Vec<u8>>) + Send + 'static,
    {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.send(request).await;
            on_complete(outcome);
        })
    }

    /// Runs the attempt loop and returns the final attempt's raw reply.
    pub async fn dispatch(&self, request: Request) -> TransportReply {
        let Some(interceptor) = self.interceptor.as_deref() else {
            return self.execute(request).await;
        };

        let mut attempt = 1usize;
        loop {
            let sent = self.before(interceptor, request.clone(), attempt).await;

            #[cfg(feature = "tracing")]
            tracing::debug!("sending {} {} (attempt {})", sent.method, sent.url, attempt);

            let reply = self.execute(sent.clone()).await;
            let decision = self
                .after(interceptor, &sent, reply.response.as_ref(), attempt)
                .await;

            let Some(delay) = decision.delay() else {
                return reply;
            };

            #[cfg(feature = "tracing")]
            tracing::debug!("retrying {} after {:?}", sent.url, delay);

            if !delay.is_zero() {
                sleep(delay).await;
            }
            attempt += 1;
        }
    }

    fn finalize(&self, reply: TransportReply) -> Result<Vec<u8>> {
        classify(reply, &self.options.success_status)
    }

    async fn execute(&self, request: Request) -> TransportReply {
        let limit = Duration::from_millis(self.options.timeout_ms);
        match tokio::time::timeout(limit, self.transport.execute(request)).await {
            Ok(reply) => reply,
            Err(_) => TransportReply::failed(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("attempt exceeded {limit:?}"),
            )),
        }
    }

    fn hook_timeout(&self) -> Option<Duration> {
        self.options.hook_timeout_ms.map(Duration::from_millis)
    }

    async fn before(
        &self,
        interceptor: &dyn Interceptor,
        request: Request,
        attempt: usize,
    ) -> Request {
        let Some(limit) = self.hook_timeout() else {
            return interceptor.before_request(request, attempt).await;
        };

        let fallback = request.clone();
        match tokio::time::timeout(limit, interceptor.before_request(request, attempt)).await {
            Ok(request) => request,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "before_request exceeded {:?}; sending unmodified request",
                    limit
                );
                fallback
            }
        }
    }

    async fn after(
        &self,
        interceptor: &dyn Interceptor,
        request: &Request,
        response: Option<&ResponseMeta>,
        attempt: usize,
    ) -> RetryDecision {
        let Some(limit) = self.hook_timeout() else {
            return interceptor.after_request(request, response, attempt).await;
        };

        match tokio::time::timeout(limit, interceptor.after_request(request, response, attempt))
            .await
        {
            Ok(decision) => decision,
            Err(_) => {
                #[cfg(feature = "tracing")]
                tracing::warn!("after_request exceeded {:?}; not retrying", limit);
                RetryDecision::DoNotRetry
            }
        }
    }
}

/// Classifies a raw reply into the caller-facing outcome.
///
/// A status outside `success` wins over any body; otherwise a body wins
/// over a transport error.
pub fn classify(reply: TransportReply, success: &RangeInclusive<u16>) -> Result<Vec<u8>> {
    if let Some(meta) = &reply.response {
        if !meta.is_success_in(success) {
            return Err(NetworkError::InvalidResponse {
                status: meta.status,
            });
        }
    }

    match (reply.body, reply.error) {
        (Some(body), _) => Ok(body),
        (None, Some(err)) => Err(NetworkError::RequestFailed(err)),
        (None, None) if reply.response.is_some() => Ok(Vec::new()),
        (None, None) => Err(NetworkError::RequestFailed(TransportError::Other(
            "transport returned no response".to_owned(),
        ))),
    }
}
