//! Delays that can be abandoned from outside

use std::time::Duration;
use tokio_util::sync::CancellationToken;

use sb_core::SignError;

/// A sleep that resolves early with [`SignError::Cancelled`] when its token fires
#[derive(Debug)]
pub struct CancellableDelay {
    duration: Duration,
    token: CancellationToken,
}

/// Handle that cancels the delay it was created with
#[derive(Debug, Clone)]
pub struct DelayCancel(CancellationToken);

impl DelayCancel {
    /// Cancel the delay; it resolves immediately with `Cancelled`
    pub fn cancel(&self) {
        self.0.cancel();
    }
}

/// Create a delay together with the handle that cancels it
pub fn cancellable_delay(duration: Duration) -> (CancellableDelay, DelayCancel) {
    let token = CancellationToken::new();
    let cancel = DelayCancel(token.clone());
    (CancellableDelay { duration, token }, cancel)
}

impl CancellableDelay {
    /// A delay tied to an existing token
    pub fn with_token(duration: Duration, token: CancellationToken) -> Self {
        Self { duration, token }
    }

    /// Wait out the delay
    pub async fn wait(self) -> Result<(), SignError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(SignError::Cancelled),
            _ = tokio::time::sleep(self.duration) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_delay_completes() {
        let (delay, _cancel) = cancellable_delay(Duration::from_millis(500));
        let started = tokio::time::Instant::now();
        delay.wait().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_rejects_immediately() {
        let (delay, cancel) = cancellable_delay(Duration::from_secs(3600));
        let waiter = tokio::spawn(delay.wait());
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(SignError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_token() {
        let token = CancellationToken::new();
        token.cancel();
        let result = CancellableDelay::with_token(Duration::ZERO, token).wait().await;
        assert!(matches!(result, Err(SignError::Cancelled)));
    }
}
