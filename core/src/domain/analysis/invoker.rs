use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::common::{
    StageSettings,
    entities::app_errors::{CoreError, InvocationError},
};

/// Attempt bookkeeping for one invocation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryContext {
    /// 0-based index of the current attempt.
    pub attempt: u32,
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryContext {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.attempt + 1 < self.max_attempts
    }

    /// Delay to wait after the current attempt failed: `base * 2^attempt`.
    pub fn backoff(&self) -> Duration {
        let factor = 2u32.saturating_pow(self.attempt);
        self.base_delay.saturating_mul(factor)
    }
}

/// Runs a fallible call under a per-attempt deadline and retries transient
/// failures with exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryingInvoker {
    timeout: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl RetryingInvoker {
    pub fn new(timeout: Duration, max_retries: u32, base_delay: Duration) -> Self {
        Self {
            timeout,
            max_retries,
            base_delay,
        }
    }

    pub fn from_settings(settings: &StageSettings) -> Self {
        Self::new(settings.timeout, settings.max_retries, settings.base_delay)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Invokes `call` until it succeeds, fails with a non-retryable error, or
    /// the attempt budget is spent. The last error is returned on failure.
    ///
    /// A call that exceeds the deadline is dropped and reported as a
    /// retryable timeout; nothing is signalled to the remote side.
    pub async fn invoke<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, CoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let mut context = RetryContext::new(self.max_retries.saturating_add(1), self.base_delay);

        loop {
            let started = tokio::time::Instant::now();
            let outcome = match tokio::time::timeout(self.timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(InvocationError::timeout(operation, self.timeout).into()),
            };

            let error = match outcome {
                Ok(value) => {
                    debug!(
                        operation,
                        attempt = context.attempt + 1,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Invocation succeeded"
                    );
                    return Ok(value);
                }
                Err(error) => error,
            };

            warn!(
                operation,
                attempt = context.attempt + 1,
                max_attempts = context.max_attempts,
                code = error.code(),
                error = %error,
                "Invocation attempt failed"
            );

            if !error.is_retryable() || !context.can_retry() {
                return Err(error);
            }

            let delay = context.backoff();
            debug!(
                operation,
                delay_ms = delay.as_millis() as u64,
                "Retrying after backoff"
            );
            tokio::time::sleep(delay).await;
            context.attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::common::entities::app_errors::{InvocationErrorKind, ValidationError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn retryable() -> CoreError {
        InvocationError::new(InvocationErrorKind::ConnectionReset, "read ECONNRESET").into()
    }

    #[test]
    fn test_backoff_doubles() {
        let mut context = RetryContext::new(4, Duration::from_millis(100));
        assert_eq!(context.backoff(), Duration::from_millis(100));
        context.attempt = 1;
        assert_eq!(context.backoff(), Duration::from_millis(200));
        context.attempt = 2;
        assert_eq!(context.backoff(), Duration::from_millis(400));
        assert!(context.can_retry());
        context.attempt = 3;
        assert!(!context.can_retry());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds_after_two_backoffs() {
        let invoker = RetryingInvoker::new(Duration::from_secs(30), 5, Duration::from_millis(1000));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = invoker
            .invoke("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(retryable())
                    } else {
                        Ok("done".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 1000ms * 2^0 + 1000ms * 2^1
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_fails_immediately() {
        let invoker = RetryingInvoker::new(Duration::from_secs(30), 5, Duration::from_millis(1000));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<String, CoreError> = invoker
            .invoke("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(ValidationError::NoFile.into()) }
            })
            .await;

        assert_eq!(result.unwrap_err().code(), "NO_FILE");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let invoker = RetryingInvoker::new(Duration::from_secs(30), 3, Duration::from_millis(10));
        let calls = AtomicU32::new(0);

        let result: Result<String, CoreError> = invoker
            .invoke("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(retryable()) }
            })
            .await;

        assert_eq!(result.unwrap_err().code(), "CONNECTION_RESET");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retryable() {
        let invoker = RetryingInvoker::new(Duration::from_secs(30), 1, Duration::from_millis(1000));
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = invoker
            .invoke("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n == 0 {
                        std::future::pending::<()>().await;
                    }
                    Ok::<_, CoreError>(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(started.elapsed(), Duration::from_millis(31_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_error_code_when_exhausted() {
        let invoker = RetryingInvoker::new(Duration::from_secs(90), 0, Duration::from_millis(1000));

        let result: Result<(), CoreError> = invoker
            .invoke("health analysis", || std::future::pending())
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.code(), "REQUEST_TIMEOUT");
        assert!(err.to_string().contains("health analysis timeout"));
    }
}
