//! Caller-facing handle for one in-flight fetch.
//!
//! Every request owns a [`RequestCell`]: a status byte plus the sending half of
//! the outcome channel. The only way out of `Pending` is [`RequestCell::finish`],
//! a single compare-and-swap. Whoever wins the swap (the completion timer, a
//! cancel call, or a caller deadline) is the only party that ever sends an
//! outcome. Everyone else observes a no-op.
//!
//! The completion task holds its end through a [`Completion`] guard. If the
//! task is dropped before deciding (aborted, or its runtime shut down), the
//! guard finishes the request as `Cancelled` so no handle waits forever.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tokio::time::timeout;

use mockfetch_types::{FetchError, FetchOutcome, FetchResult, FetchStatus, RequestId};

const PENDING: u8 = 0;
const RESOLVED: u8 = 1;
const REJECTED: u8 = 2;
const CANCELLED: u8 = 3;

const fn encode(status: FetchStatus) -> u8 {
    match status {
        FetchStatus::Pending => PENDING,
        FetchStatus::Resolved => RESOLVED,
        FetchStatus::Rejected => REJECTED,
        FetchStatus::Cancelled => CANCELLED,
    }
}

const fn decode(raw: u8) -> FetchStatus {
    match raw {
        RESOLVED => FetchStatus::Resolved,
        REJECTED => FetchStatus::Rejected,
        CANCELLED => FetchStatus::Cancelled,
        _ => FetchStatus::Pending,
    }
}

#[derive(Debug)]
pub(crate) struct RequestCell {
    id: RequestId,
    created_at: SystemTime,
    status: AtomicU8,
    reply: Mutex<Option<oneshot::Sender<FetchOutcome>>>,
    task: Mutex<Option<AbortHandle>>,
}

impl RequestCell {
    pub(crate) fn new(id: RequestId) -> (Arc<Self>, oneshot::Receiver<FetchOutcome>) {
        let (tx, rx) = oneshot::channel();
        let cell = Arc::new(Self {
            id,
            created_at: SystemTime::now(),
            status: AtomicU8::new(PENDING),
            reply: Mutex::new(Some(tx)),
            task: Mutex::new(None),
        });
        (cell, rx)
    }

    pub(crate) fn id(&self) -> RequestId {
        self.id
    }

    pub(crate) fn status(&self) -> FetchStatus {
        decode(self.status.load(Ordering::Acquire))
    }

    /// Remember the completion task so a cancellation can stop its timer.
    pub(crate) fn attach_task(&self, task: AbortHandle) {
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Move from `Pending` to `status` and deliver `outcome`.
    ///
    /// Returns `false` without side effects if the request already left `Pending`.
    pub(crate) fn finish(&self, status: FetchStatus, outcome: FetchOutcome) -> bool {
        debug_assert!(status.is_terminal(), "finish requires a terminal status");
        if self
            .status
            .compare_exchange(PENDING, encode(status), Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let sender = self
            .reply
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            // Receiver gone means nobody is listening; the status still counts.
            let _ = sender.send(outcome);
        }

        if status == FetchStatus::Cancelled {
            let task = self
                .task
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            // The timer has nothing left to decide.
            if let Some(task) = task {
                task.abort();
            }
        }

        tracing::debug!(request_id = %self.id, status = %status, "Fetch request finished");
        true
    }

    fn cancel(&self) -> bool {
        let cancelled = self.finish(FetchStatus::Cancelled, Err(FetchError::Cancelled));
        if !cancelled {
            tracing::debug!(
                request_id = %self.id,
                status = %self.status(),
                "Cancellation ignored; request already finished"
            );
        }
        cancelled
    }
}

/// The completion task's claim on a request.
///
/// Dropping it without calling [`resolve`](Self::resolve) or
/// [`reject`](Self::reject) cancels the request.
#[derive(Debug)]
pub(crate) struct Completion {
    cell: Arc<RequestCell>,
}

impl Completion {
    pub(crate) fn new(cell: Arc<RequestCell>) -> Self {
        Self { cell }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.cell.status().is_terminal()
    }

    pub(crate) fn resolve(&self, result: FetchResult) -> bool {
        self.cell.finish(FetchStatus::Resolved, Ok(result))
    }

    pub(crate) fn reject(&self) -> bool {
        self.cell
            .finish(FetchStatus::Rejected, Err(FetchError::SimulatedFailure))
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self
            .cell
            .finish(FetchStatus::Cancelled, Err(FetchError::Cancelled))
        {
            tracing::debug!(
                request_id = %self.cell.id,
                "Completion dropped before deciding; request cancelled"
            );
        }
    }
}

/// Awaitable, cancellable handle returned by
/// [`AsyncFetchSource::fetch`](crate::AsyncFetchSource::fetch).
///
/// The outcome is cached once delivered, so awaiting it again (or cancelling
/// afterwards) always yields the same value.
#[derive(Debug)]
pub struct FetchHandle {
    cell: Arc<RequestCell>,
    reply: oneshot::Receiver<FetchOutcome>,
    delivered: Option<FetchOutcome>,
}

impl FetchHandle {
    pub(crate) fn new(cell: Arc<RequestCell>, reply: oneshot::Receiver<FetchOutcome>) -> Self {
        Self {
            cell,
            reply,
            delivered: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> RequestId {
        self.cell.id
    }

    #[must_use]
    pub fn created_at(&self) -> SystemTime {
        self.cell.created_at
    }

    #[must_use]
    pub fn status(&self) -> FetchStatus {
        self.cell.status()
    }

    /// Cancel the request if it is still pending.
    ///
    /// Returns `true` if this call moved the request to `Cancelled`. Calling it
    /// on a finished request is a no-op that returns `false`.
    pub fn cancel(&self) -> bool {
        self.cell.cancel()
    }

    /// A cloneable cancel-only view, for cancelling from another task while
    /// this handle is being awaited.
    #[must_use]
    pub fn canceller(&self) -> FetchCanceller {
        FetchCanceller {
            cell: Arc::clone(&self.cell),
        }
    }

    /// Wait for the request to reach a terminal state.
    pub async fn outcome(&mut self) -> FetchOutcome {
        if let Some(outcome) = &self.delivered {
            return outcome.clone();
        }
        // The cell owns the sender and only drops it after sending, so the
        // channel cannot close early while this handle holds the cell.
        let outcome = (&mut self.reply)
            .await
            .unwrap_or(Err(FetchError::Cancelled));
        self.delivered = Some(outcome.clone());
        outcome
    }

    /// Like [`outcome`](Self::outcome), but give up after `limit`.
    ///
    /// If the deadline passes while the request is still pending, the request is
    /// terminated as `Cancelled` and the outcome is [`FetchError::Timeout`]. If
    /// the completion wins that race, its real outcome is returned instead.
    pub async fn outcome_within(&mut self, limit: Duration) -> FetchOutcome {
        if let Ok(outcome) = timeout(limit, self.outcome()).await {
            return outcome;
        }
        if self
            .cell
            .finish(FetchStatus::Cancelled, Err(FetchError::Timeout))
        {
            tracing::debug!(
                request_id = %self.cell.id,
                limit_ms = limit.as_millis(),
                "Fetch deadline elapsed"
            );
        }
        self.outcome().await
    }
}

/// Cancel-only view of a [`FetchHandle`].
#[derive(Debug, Clone)]
pub struct FetchCanceller {
    cell: Arc<RequestCell>,
}

impl FetchCanceller {
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.cell.id()
    }

    #[must_use]
    pub fn status(&self) -> FetchStatus {
        self.cell.status()
    }

    /// See [`FetchHandle::cancel`].
    pub fn cancel(&self) -> bool {
        self.cell.cancel()
    }
}
