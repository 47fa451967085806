//! cooperative cancellation
//!
//! A [Cancellation] is threaded through loading and resolution. A cancelled token makes the next load or import
//! step fail with [crate::Error::Cancelled], unwinding the whole include tree.

/// Clones share state: cancelling one cancels all.
#[derive(Clone, Debug, Default)]
pub struct Cancellation {
    inner: tokio_util::sync::CancellationToken,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// Fail with [crate::Error::Cancelled] once cancelled
    pub fn check(&self) -> crate::Result<()> {
        if self.is_cancelled() {
            tracing::debug!("cancellation requested");
            return Err(crate::Error::Cancelled);
        }

        Ok(())
    }
}
