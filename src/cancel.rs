use std::sync::Arc;

use tokio::{sync::watch, time::Instant};

/// Cancellation signal for one or more calls.
///
/// Clones share the same flag. A token may also carry a deadline, after which
/// it behaves as if [`CancelToken::cancel`] had been called.
#[derive(Clone, Debug)]
pub struct CancelToken {
    flag: Arc<watch::Sender<bool>>,
    deadline: Option<Instant>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// Creates a token that only fires when canceled explicitly.
    pub fn new() -> Self {
        let (flag, _) = watch::channel(false);
        Self {
            flag: Arc::new(flag),
            deadline: None,
        }
    }

    /// Returns a clone of this token that also fires at `deadline`.
    ///
    /// If the token already has an earlier deadline, that one is kept.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    /// Fires the token for every clone.
    pub fn cancel(&self) {
        self.flag.send_replace(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.flag.borrow() || self.deadline.is_some_and(|at| Instant::now() >= at)
    }

    /// Completes once the token is canceled or its deadline passes.
    pub async fn canceled(&self) {
        let mut rx = self.flag.subscribe();
        let flagged = async move {
            // The sender lives as long as `self`, so this only returns on `true`.
            let _ = rx.wait_for(|canceled| *canceled).await;
        };

        match self.deadline {
            Some(at) => {
                tokio::select! {
                    _ = flagged => {}
                    _ = tokio::time::sleep_until(at) => {}
                }
            }
            None => flagged.await,
        }
    }
}
