//! Outbound call throttle.
//!
//! Admits at most one operation per interval, in FIFO order. A background
//! task owns the queue of admission tickets and only sleeps while tickets
//! are waiting; it exits once the `RateLimiter` handle is dropped.

use crate::error::AppError;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant};

/// Handle to a running rate limiter.
///
/// Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct RateLimiter {
    /// Admission ticket queue.
    ticket_tx: mpsc::UnboundedSender<oneshot::Sender<()>>,

    /// Number of operations admitted so far.
    admitted: Arc<AtomicUsize>,
}

impl RateLimiter {
    /// Start a limiter admitting one operation per `interval`.
    pub fn start(interval: Duration) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<oneshot::Sender<()>>();
        let admitted = Arc::new(AtomicUsize::new(0));
        let admitted_for_task = admitted.clone();

        tokio::spawn(async move {
            let mut last_admission: Option<Instant> = None;

            while let Some(ticket) = rx.recv().await {
                if let Some(last) = last_admission {
                    time::sleep_until(last + interval).await;
                }

                // A dropped caller gave up its slot; the next ticket may go now.
                if ticket.send(()).is_ok() {
                    last_admission = Some(Instant::now());
                    admitted_for_task.fetch_add(1, Ordering::Relaxed);
                }
            }

            log::debug!("[limiter] queue closed, stopping");
        });

        Self {
            ticket_tx: tx,
            admitted,
        }
    }

    /// Wait for admission, then run `operation` to completion.
    ///
    /// The operation's own result is returned unchanged; a failing operation
    /// never holds up the operations queued behind it.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.admit().await?;
        operation.await
    }

    /// Wait for this caller's turn.
    pub async fn admit(&self) -> Result<(), AppError> {
        let (ticket, admission) = oneshot::channel();
        self.ticket_tx
            .send(ticket)
            .map_err(|_| AppError::internal("Rate limiter is not running"))?;
        admission
            .await
            .map_err(|_| AppError::internal("Rate limiter stopped before admission"))
    }

    /// Number of operations admitted so far.
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::Relaxed)
    }
}
