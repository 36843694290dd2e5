use std::{fmt, time::Duration};

use async_trait::async_trait;

use crate::{ClientOptions, Request, ResponseMeta, TransportError, TransportReply};

/// Executes a prepared request and reports body, metadata and/or error.
///
/// Implementations are shared across concurrent dispatches.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> TransportReply;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    timeout: Option<Duration>,
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::from_client(reqwest::Client::new())
    }

    /// Wraps an already configured client.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self {
            http,
            timeout: None,
        }
    }

    /// Sets a client-side request timeout from `opts`.
    ///
    /// Only needed when the transport is used without a [`Dispatcher`](crate::Dispatcher),
    /// which already bounds each attempt by `timeout_ms`.
    pub fn with_options(mut self, opts: &ClientOptions) -> Self {
        self.timeout = Some(Duration::from_millis(opts.timeout_ms));
        self
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> TransportReply {
        let mut builder = self
            .http
            .request(request.method.into(), request.url)
            .headers(request.headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(err) => return TransportReply::failed(err),
        };

        let meta = ResponseMeta {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
        };

        match response.bytes().await {
            Ok(bytes) => TransportReply {
                body: Some(bytes.to_vec()),
                response: Some(meta),
                error: None,
            },
            Err(err) => TransportReply {
                body: None,
                response: Some(meta),
                error: Some(TransportError::Http(err)),
            },
        }
    }
}
