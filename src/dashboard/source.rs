//! Data-source binding: parameterized asynchronous fetches with
//! stale-response discard.
//!
//! Overlapping fetches are not aborted. Every issued fetch carries a
//! monotonically increasing sequence number; the receiving side drops any
//! outcome older than the latest issued, so a slow early response can
//! never overwrite a fresher one.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

/// Normalized fetch failure: one human-readable message, constructed once
/// at the boundary where the remote call was issued.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchError {
    pub message: String,
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type BoxedFetch<R> = Pin<Box<dyn Future<Output = Result<Vec<R>, FetchError>> + Send>>;

/// A single remote mutation or lookup returning one value.
pub type BoxedOp<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;

/// A parameterized remote lookup returning row collections.
pub trait RowSource<P, R>: Send + Sync {
    fn fetch(&self, param: &P) -> BoxedFetch<R>;
}

/// Expense mutations, delegated to the service layer. The manager
/// components stay thin CRUD wrappers over this.
pub trait ExpenseStore: Send + Sync {
    fn create(&self, new: crate::models::NewExpense) -> BoxedOp<crate::models::Expense>;
    fn update(
        &self,
        id: i64,
        update: crate::models::ExpenseUpdate,
    ) -> BoxedOp<crate::models::Expense>;
    fn delete(&self, id: i64) -> BoxedOp<()>;
}

/// Budget period creation, delegated to the service layer.
pub trait PeriodStore: Send + Sync {
    fn create(&self, new: crate::models::NewBudgetPeriod) -> BoxedOp<crate::models::BudgetPeriod>;
}

/// Adapter turning an async closure into a [`RowSource`].
pub struct FnSource<F>(pub F);

impl<P, R, F, Fut> RowSource<P, R> for FnSource<F>
where
    F: Fn(&P) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<R>, FetchError>> + Send + 'static,
{
    fn fetch(&self, param: &P) -> BoxedFetch<R> {
        Box::pin((self.0)(param))
    }
}

struct TaggedOutcome<R> {
    seq: u64,
    outcome: Result<Vec<R>, FetchError>,
}

/// Issues fetches against a [`RowSource`], tagging each with its sequence
/// number. Pair of [`FetchEvents`].
pub struct QueryBinding<P, R> {
    source: Arc<dyn RowSource<P, R>>,
    latest: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<TaggedOutcome<R>>,
}

/// Receiving half of a binding: yields fetch outcomes in completion order,
/// silently dropping ones superseded by a later `issue`.
pub struct FetchEvents<R> {
    latest: Arc<AtomicU64>,
    rx: mpsc::UnboundedReceiver<TaggedOutcome<R>>,
}

impl<P, R> QueryBinding<P, R>
where
    R: Send + 'static,
{
    pub fn new(source: Arc<dyn RowSource<P, R>>) -> (Self, FetchEvents<R>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let latest = Arc::new(AtomicU64::new(0));
        (
            Self {
                source,
                latest: latest.clone(),
                tx,
            },
            FetchEvents { latest, rx },
        )
    }

    /// Issue a fetch for `param`. Returns the request's sequence number.
    /// Any outcome from an earlier still-in-flight fetch becomes stale.
    pub fn issue(&self, param: &P) -> u64 {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let fut = self.source.fetch(param);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = fut.await;
            // Receiver dropped means the component is gone; nothing to do.
            let _ = tx.send(TaggedOutcome { seq, outcome });
        });

        seq
    }
}

impl<R> FetchEvents<R> {
    /// Next outcome that has not been superseded. `None` once the binding
    /// is dropped and the channel drained.
    pub async fn next(&mut self) -> Option<Result<Vec<R>, FetchError>> {
        while let Some(tagged) = self.rx.recv().await {
            let latest = self.latest.load(Ordering::SeqCst);
            if tagged.seq < latest {
                tracing::debug!(seq = tagged.seq, latest, "Discarding stale fetch response");
                continue;
            }
            return Some(tagged.outcome);
        }
        None
    }
}
