//! Cancellation and deadline for one dial.

use std::future::Future;
use std::io;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// The caller's bound on a dial and its handshakes.
///
/// Dropping the raced future on expiry releases any partially built socket.
#[derive(Debug, Clone, Default)]
pub struct DialContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl DialContext {
    /// No deadline, never cancelled unless the token is.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Race `fut` against cancellation and the deadline.
    ///
    /// Expiry yields `TimedOut`, cancellation `Interrupted`.
    pub async fn run<F: Future>(&self, fut: F) -> io::Result<F::Output> {
        if self.cancel.is_cancelled() {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "dial cancelled"));
        }
        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::select! {
            out = fut => Ok(out),
            _ = self.cancel.cancelled() => {
                Err(io::Error::new(io::ErrorKind::Interrupted, "dial cancelled"))
            }
            _ = expired => Err(io::Error::new(io::ErrorKind::TimedOut, "dial timed out")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = DialContext::with_timeout(Duration::from_secs(5));
        let err = ctx
            .run(tokio::time::sleep(Duration::from_secs(10)))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[tokio::test]
    async fn cancellation_interrupts() {
        let token = CancellationToken::new();
        let ctx = DialContext::new().with_cancel(token.clone());
        let cancel = tokio::spawn(async move { token.cancel() });
        let err = ctx.run(std::future::pending::<()>()).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Interrupted);
        cancel.await.unwrap();
    }

    #[tokio::test]
    async fn completes_within_bounds() {
        let ctx = DialContext::with_timeout(Duration::from_secs(5));
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }
}
