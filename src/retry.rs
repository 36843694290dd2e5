use std::time::Duration;

/// Outcome of an interceptor's post-response hook for one attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the request again immediately.
    Retry,
    /// Send the request again once the delay has elapsed.
    RetryWithDelay(Duration),
    /// Stop and deliver the current attempt's result.
    DoNotRetry,
}

impl RetryDecision {
    /// Builds a delayed retry from float seconds.
    ///
    /// Negative, NaN and infinite inputs are clamped to a zero delay;
    /// values too large for a `Duration` saturate to `Duration::MAX`.
    pub fn after_secs_f64(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self::RetryWithDelay(Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX))
        } else {
            Self::RetryWithDelay(Duration::ZERO)
        }
    }

    /// Builds a delayed retry from milliseconds.
    pub fn after_millis(ms: u64) -> Self {
        Self::RetryWithDelay(Duration::from_millis(ms))
    }

    /// Returns true for both retry variants.
    pub fn is_retry(&self) -> bool {
        !matches!(self, Self::DoNotRetry)
    }

    /// Wait before the next attempt, or `None` when no attempt follows.
    pub fn delay(&self) -> Option<Duration> {
        match self {
            Self::Retry => Some(Duration::ZERO),
            Self::RetryWithDelay(delay) => Some(*delay),
            Self::DoNotRetry => None,
        }
    }
}
