//! Timeout and retry around agent calls
//!
//! This is the only place that decides whether a failure is retried or how
//! long to wait for an attempt. The protocol layer above never retries on its
//! own.

mod backoff;
mod classify;
mod delay;

pub use backoff::{apply_jitter, calculate_backoff_delay, ExponentialBackoff};
pub use classify::{
    classify_any, classify_error, classify_message, classify_transport, is_transient_error,
    ErrorClass, TRANSIENT_CLOSE_CODES,
};
pub use delay::{cancellable_delay, CancellableDelay, DelayCancel};

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use sb_core::config::ResilienceConfig;
use sb_core::SignError;

/// Decides whether a failed attempt may be retried
pub type RetryPredicate = Arc<dyn Fn(&SignError) -> bool + Send + Sync>;

/// Called before each backoff wait with (operation, failed attempt number, error)
pub type AttemptObserver = Arc<dyn Fn(&str, u32, &SignError) + Send + Sync>;

/// Timeout and retry settings for one call site
#[derive(Clone)]
pub struct ResilienceOptions {
    pub timeout_enabled: bool,
    pub timeout: Duration,
    pub retry_enabled: bool,
    /// Attempts after the first; total attempts are `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub jitter: f64,
    pub should_retry: RetryPredicate,
    pub on_retry: Option<AttemptObserver>,
    /// Cancels pending backoff waits
    pub cancel: Option<CancellationToken>,
}

impl Default for ResilienceOptions {
    fn default() -> Self {
        Self::from(&ResilienceConfig::default())
    }
}

impl From<&ResilienceConfig> for ResilienceOptions {
    fn from(config: &ResilienceConfig) -> Self {
        Self {
            timeout_enabled: config.timeout_enabled,
            timeout: config.timeout,
            retry_enabled: config.retry_enabled,
            max_retries: config.max_retries,
            base_delay: config.base_delay,
            max_delay: config.max_delay,
            multiplier: config.multiplier,
            jitter: config.jitter,
            should_retry: Arc::new(is_transient_error),
            on_retry: None,
            cancel: None,
        }
    }
}

impl ResilienceOptions {
    /// Replace the retry predicate
    pub fn with_retry_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&SignError) -> bool + Send + Sync + 'static,
    {
        self.should_retry = Arc::new(predicate);
        self
    }

    /// Observe every failed attempt that is about to be retried
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&str, u32, &SignError) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(observer));
        self
    }

    /// Abandon backoff waits when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Set the retry budget
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the per-attempt timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.timeout_enabled = true;
        self
    }

    /// Run each operation exactly once
    pub fn without_retry(mut self) -> Self {
        self.retry_enabled = false;
        self
    }

    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff::new(self.base_delay, self.max_delay, self.multiplier, self.jitter)
    }
}

impl fmt::Debug for ResilienceOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilienceOptions")
            .field("timeout_enabled", &self.timeout_enabled)
            .field("timeout", &self.timeout)
            .field("retry_enabled", &self.retry_enabled)
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .field("multiplier", &self.multiplier)
            .field("jitter", &self.jitter)
            .field("on_retry", &self.on_retry.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Wait for `operation` at most `timeout`.
///
/// On expiry the future is dropped, which releases whatever connection it
/// held, and [`SignError::Timeout`] is returned.
pub async fn with_timeout<F, T>(operation: F, timeout: Duration) -> Result<T, SignError>
where
    F: Future<Output = Result<T, SignError>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(SignError::Timeout { timeout }),
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
///
/// Rejected credentials are returned at once whatever the predicate says.
/// Attempts are strictly sequential, separated by jittered exponential
/// backoff.
pub async fn with_retry<F, Fut, T>(
    name: &str,
    mut operation: F,
    options: &ResilienceOptions,
) -> Result<T, SignError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SignError>>,
{
    let max_attempts = options.max_retries.saturating_add(1);
    let mut backoff = options.backoff();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(operation = name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if error.is_credential_failure() || !(options.should_retry)(&error) {
            return Err(error);
        }

        if attempt >= max_attempts {
            tracing::warn!(operation = name, attempts = attempt, error = %error, "Retries exhausted");
            return Err(SignError::RetryExhausted {
                attempts: attempt,
                last_error: Box::new(error),
            });
        }

        let delay = backoff.next_delay();
        if let Some(observer) = &options.on_retry {
            observer(name, attempt, &error);
        }
        tracing::warn!(
            operation = name,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Attempt failed, retrying"
        );

        match &options.cancel {
            Some(token) => CancellableDelay::with_token(delay, token.clone()).wait().await?,
            None => tokio::time::sleep(delay).await,
        }
        attempt += 1;
    }
}

/// Per-attempt timeout inside the retry loop, each independently switchable
pub async fn with_resilience<F, Fut, T>(
    name: &str,
    mut operation: F,
    options: &ResilienceOptions,
) -> Result<T, SignError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SignError>>,
{
    let timeout = options.timeout_enabled.then_some(options.timeout);
    let mut attempt = move || {
        let fut = operation();
        async move {
            match timeout {
                Some(timeout) => with_timeout(fut, timeout).await,
                None => fut.await,
            }
        }
    };

    if options.retry_enabled {
        with_retry(name, attempt, options).await
    } else {
        attempt().await
    }
}
