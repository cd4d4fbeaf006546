use std::sync::Arc;

use bar_shared::{ChangeEvent, Collection};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::grid::{GridController, GridRow, RefreshOutcome};

/// Fan-out point for row change notifications.
///
/// The store pushes every event it hears from the database in here; each open
/// view holds its own subscription.
#[derive(Clone)]
pub struct ChangeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns how many subscriptions received the event.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn subscribe(&self, collection: Collection) -> ChangeSubscription {
        ChangeSubscription {
            collection,
            rx: self.tx.subscribe(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    Changed(ChangeEvent),
    /// Events were dropped because this subscriber fell behind.
    Lagged(u64),
}

/// Change notifications for one collection. Dropping it unsubscribes.
pub struct ChangeSubscription {
    collection: Collection,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl ChangeSubscription {
    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Next signal for this collection, or `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<FeedSignal> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.collection == self.collection => {
                    return Some(FeedSignal::Changed(event));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(collection = %self.collection, skipped, "Change feed subscriber lagged");
                    return Some(FeedSignal::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Background task refetching a grid whenever its collection changes.
///
/// Lives as long as the page view that owns it; dropping it stops the task and
/// releases the subscription.
pub struct RealtimeListener {
    collection: Collection,
    handle: Option<JoinHandle<()>>,
}

impl RealtimeListener {
    /// Starts listening. The receiver yields the outcome of every triggered refetch;
    /// the listener stops on its own once the receiver is dropped.
    pub fn spawn<R: GridRow>(
        mut subscription: ChangeSubscription,
        grid: Arc<GridController<R>>,
    ) -> (Self, mpsc::Receiver<RefreshOutcome>) {
        let collection = subscription.collection();
        let (tx, rx) = mpsc::channel(16);

        let handle = tokio::spawn(async move {
            info!(%collection, "Realtime listener started");
            while let Some(signal) = subscription.next().await {
                debug!(%collection, ?signal, "Refetching after change");
                let outcome = grid.refresh().await;
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
            info!(%collection, "Realtime listener stopped");
        });

        (
            Self {
                collection,
                handle: Some(handle),
            },
            rx,
        )
    }

    pub fn collection(&self) -> Collection {
        self.collection
    }

    /// Stops the task and waits until its subscription is released.
    pub async fn shutdown(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for RealtimeListener {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
