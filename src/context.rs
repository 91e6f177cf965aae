/// Per-request cancellation and deadline scope
/// Carried through every balance lookup down to the backend call
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Reason a backend call was cut short by its request context
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CallInterrupted {
    #[error("request context cancelled")]
    Cancelled,

    #[error("request context deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation token plus optional deadline for a single request
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// Context that is never cancelled and has no deadline
    pub fn background() -> Self {
        Self::default()
    }

    /// Context expiring `timeout` from now
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Time left before the deadline, `None` when unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Check the context without awaiting anything
    pub fn check(&self) -> Result<(), CallInterrupted> {
        if self.cancel.is_cancelled() {
            return Err(CallInterrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(CallInterrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Drive `operation` until it finishes or the context is cancelled or expires,
    /// whichever comes first
    pub async fn run<F, T>(&self, operation: F) -> anyhow::Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        self.check()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(CallInterrupted::Cancelled.into()),
            _ = expired => Err(CallInterrupted::DeadlineExceeded.into()),
            result = operation => result,
        }
    }
}
