//! Call contexts: deadlines and cancellation for a single call.
//!
//! A [`Context`] is a cheap value that carries an optional deadline and any
//! number of cancellation signals. Derived contexts inherit everything from
//! their parent, so cancelling a parent cancels every child.

use futures_util::future::select_all;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::error::{Error, Result};

/// Deadline and cancellation carried through a call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Vec<watch::Receiver<bool>>,
}

/// Cancels the context it was created with (and all contexts derived from it).
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that never expires and is never cancelled.
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a context that expires `timeout` from now, or earlier if the
    /// parent already expires earlier.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context that expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            cancel: self.cancel.clone(),
        }
    }

    /// Derive a cancellable context.
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        let mut cancel = self.cancel.clone();
        cancel.push(rx);
        (
            Self {
                deadline: self.deadline,
                cancel,
            },
            CancelHandle { tx: Arc::new(tx) },
        )
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline (zero once it has passed).
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }

    /// Fail fast if the context is already done.
    pub(crate) fn check(&self) -> Result<()> {
        if self.is_canceled() {
            return Err(Error::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub(crate) async fn done(&self) -> Error {
        let canceled = async {
            if self.cancel.is_empty() {
                pending::<()>().await;
            }
            let waits = self
                .cancel
                .iter()
                .cloned()
                .map(|rx| Box::pin(wait_canceled(rx)));
            select_all(waits).await;
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = canceled => Error::Canceled,
            _ = expired => Error::DeadlineExceeded,
        }
    }
}

async fn wait_canceled(mut rx: watch::Receiver<bool>) {
    // A dropped handle never cancels.
    if rx.wait_for(|canceled| *canceled).await.is_err() {
        pending::<()>().await;
    }
}
