//! Execution Context
//!
//! TigerStyle: Every backend call is bounded by an explicit context.
//!
//! A [`Context`] carries an optional cancellation signal, an optional
//! deadline, and an optional trace id. [`Context::run`] races a backend
//! future against both; the backend future is dropped when it loses, which
//! aborts the in-flight driver call.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{StorageError, StorageResult};

// =============================================================================
// Context
// =============================================================================

/// Cancellation, deadline and trace id for one facade call.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Own signal last, inherited ones before it
    cancel: Vec<watch::Receiver<bool>>,
    deadline: Option<Instant>,
    trace_id: Option<String>,
}

/// Cancels the [`Context`] returned with it and everything derived from that.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    /// Signal cancellation. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }
}

impl Context {
    /// A context that never cancels and has no deadline.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Derive a cancellable context.
    ///
    /// The child is cancelled by its own handle or by any ancestor's.
    #[must_use]
    pub fn with_cancel(&self) -> (Self, CancelHandle) {
        let (sender, receiver) = watch::channel(false);
        let mut ctx = self.clone();
        ctx.cancel.push(receiver);
        (ctx, CancelHandle { sender })
    }

    /// Derive a context expiring after `timeout`.
    #[must_use]
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a context expiring at `deadline`; an earlier parent deadline wins.
    #[must_use]
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            deadline: Some(deadline),
            ..self.clone()
        }
    }

    /// Attach a trace id, recorded on every statement log line.
    #[must_use]
    pub fn with_trace_id(&self, trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: Some(trace_id.into()),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once this context's or an ancestor's cancel handle fired.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.iter().any(|rx| *rx.borrow())
    }

    /// Fail fast when the context is already done.
    pub fn check(&self) -> StorageResult<()> {
        if self.is_cancelled() {
            return Err(StorageError::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Err(StorageError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Run `fut` until it completes, the context is cancelled, or the deadline passes.
    pub async fn run<F, T>(&self, fut: F) -> StorageResult<T>
    where
        F: Future<Output = StorageResult<T>>,
    {
        self.check()?;

        tokio::select! {
            result = fut => result,
            () = cancelled(self.cancel.clone()) => Err(StorageError::Cancelled),
            () = expired(self.deadline) => Err(StorageError::DeadlineExceeded),
        }
    }
}

/// Resolves once any of `receivers` is cancelled.
fn cancelled(
    mut receivers: Vec<watch::Receiver<bool>>,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    match receivers.pop() {
        None => Box::pin(std::future::pending()),
        Some(rx) => Box::pin(async move {
            tokio::select! {
                () = signalled(rx) => {}
                () = cancelled(receivers) => {}
            }
        }),
    }
}

async fn signalled(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|cancelled| *cancelled).await.is_ok() {
        return;
    }
    // The handle was dropped without cancelling.
    std::future::pending::<()>().await;
}

async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}

// =============================================================================
// Tests
// =============================================================================
