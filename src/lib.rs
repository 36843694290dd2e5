//! `intercept-http` dispatches HTTP requests asynchronously through
//! pluggable interceptors that may rewrite each attempt and decide,
//! after every response, whether to retry.
//!
//! Entry points live on [`Dispatcher`]:
//! - [`Dispatcher::get`] / [`Dispatcher::post`]
//! - [`Dispatcher::send`] and [`Dispatcher::send_until`]
//! - [`Dispatcher::dispatch`] for the raw transport triple
//! - [`Dispatcher::submit`] for callback delivery

mod dispatcher;
mod error;
pub mod interceptor;
mod options;
mod request;
mod retry;
mod transport;
mod types;

pub use dispatcher::{classify, Dispatcher};
pub use error::{NetworkError, TransportError};
pub use interceptor::{BackoffInterceptor, Interceptor, InterceptorChain, MaxAttempts};
pub use options::ClientOptions;
pub use request::{Method, Request};
pub use retry::RetryDecision;
pub use transport::{ReqwestTransport, Transport};
pub use types::{ResponseMeta, TransportReply};

#[cfg(feature = "tracing")]
pub use interceptor::LoggingInterceptor;

pub type Result<T> = std::result::Result<T, NetworkError>;
