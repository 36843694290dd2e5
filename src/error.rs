/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// The request address could not be parsed. Raised before any attempt.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    /// A header name or value could not be encoded. Raised before any attempt.
    #[error("invalid header: {0}")]
    InvalidHeader(String),
    /// Response status code outside the configured success range.
    #[error("invalid response: http status {status}")]
    InvalidResponse { status: u16 },
    /// Transport-level failure (DNS, connect, timeout, body read).
    #[error("request failed: {0}")]
    RequestFailed(#[source] TransportError),
    /// The caller's cancellation future resolved before a terminal outcome.
    #[error("request cancelled")]
    Cancelled,
}

/// Failure reported by a [`Transport`](crate::Transport) implementation.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Network or request execution error from `reqwest`.
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),
    /// Raw I/O error, typically from custom transports.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// Any other transport failure, described by text.
    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns true when the failure was a timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout(),
            Self::Io(err) => err.kind() == std::io::ErrorKind::TimedOut,
            Self::Other(_) => false,
        }
    }

    /// Returns true when the connection could not be established.
    pub fn is_connect(&self) -> bool {
        match self {
            Self::Http(err) => err.is_connect(),
            Self::Io(err) => matches!(
                err.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
            ),
            Self::Other(_) => false,
        }
    }
}
