use std::{collections::HashMap, future::Future, sync::Arc};

use dashmap::DashMap;
use futures::future::join_all;
use tokio::{runtime::Handle, sync::watch::Receiver};

use crate::{
    queue::{QueueState, Slot},
    BatchLoader, CoalescerConfig, Error,
};

pub use crate::queue::Outcome;

type Queue<L> = QueueState<
    <L as BatchLoader>::ItemKey,
    <L as BatchLoader>::Value,
    <L as BatchLoader>::Error,
>;

/// Merges single item requests issued close together into as few loader calls as possible.
///
/// Requests are grouped per batch key. At most one batch per key is in flight at a time,
/// requests for an item that is already in flight attach to it instead of queueing again.
/// Queues are dropped as soon as they go idle.
pub struct BatchCoalescer<L: BatchLoader> {
    inner: Arc<Inner<L>>,
}

struct Inner<L: BatchLoader> {
    loader: L,
    config: CoalescerConfig,
    queues: DashMap<L::BatchKey, Queue<L>>,
}

impl<L: BatchLoader> Clone for BatchCoalescer<L> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<L: BatchLoader> BatchCoalescer<L> {
    pub fn new(loader: L) -> Self {
        Self::from_config(loader, CoalescerConfig::default())
    }

    pub fn from_config(loader: L, config: CoalescerConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                loader,
                config,
                queues: DashMap::new(),
            }),
        }
    }

    pub fn loader(&self) -> &L {
        &self.inner.loader
    }

    /// Request a single item.
    ///
    /// The request is queued as soon as this is called, the returned future only waits
    /// for the batch it ended up in. Resolves to `None` if the batch succeeded without
    /// returning the item.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn get(
        &self,
        batch: L::BatchKey,
        item: L::ItemKey,
    ) -> impl Future<Output = Outcome<L::Value, L::Error>> + Send + 'static {
        let receiver = self.inner.enqueue(batch, item);
        wait_for(receiver)
    }

    /// Request many items in the same batch, outcomes are returned in input order
    pub async fn get_many(
        &self,
        batch: L::BatchKey,
        items: impl IntoIterator<Item = L::ItemKey>,
    ) -> Vec<Outcome<L::Value, L::Error>> {
        let requests: Vec<_> = items
            .into_iter()
            .map(|item| self.get(batch.clone(), item))
            .collect();

        join_all(requests).await
    }

    /// Number of batch keys with queued or in-flight work
    pub fn queue_count(&self) -> usize {
        self.inner.queues.len()
    }

    /// Number of items waiting for the next batch of a key
    pub fn pending_count(&self, batch: &L::BatchKey) -> usize {
        self.inner
            .queues
            .get(batch)
            .map(|queue| queue.pending.len())
            .unwrap_or_default()
    }

    /// Number of items in the batch currently being loaded for a key
    pub fn in_flight_count(&self, batch: &L::BatchKey) -> usize {
        self.inner
            .queues
            .get(batch)
            .and_then(|queue| queue.in_flight.as_ref().map(|requests| requests.len()))
            .unwrap_or_default()
    }
}

async fn wait_for<V, E: Clone>(mut receiver: Receiver<Slot<V, E>>) -> Outcome<V, E> {
    receiver
        .wait_for(|slot| slot.is_some())
        .await
        .map_err(|_| Error::RecvError)
        .and_then(|slot| slot.clone().unwrap_or(Err(Error::RecvError)))
}

impl<L: BatchLoader> Inner<L> {
    fn enqueue(
        self: &Arc<Self>,
        batch: L::BatchKey,
        item: L::ItemKey,
    ) -> Receiver<Slot<L::Value, L::Error>> {
        let (receiver, should_flush) = {
            let mut queue = self.queues.entry(batch.clone()).or_default();
            let receiver = queue.enqueue(item);
            (receiver, queue.claim_flush())
        };

        if should_flush {
            self.schedule(batch);
        }

        receiver
    }

    /// Spawn the deferred flush for a queue that has claimed one
    fn schedule(self: &Arc<Self>, batch: L::BatchKey) {
        let Ok(handle) = Handle::try_current() else {
            error!("No runtime to flush {batch:?} on, aborting its pending requests.");
            self.abort_pending(&batch);
            return;
        };

        debug!("Scheduled flush for {batch:?}.");

        let inner = self.clone();
        handle.spawn(async move {
            match inner.config.flush_delay {
                Some(delay) => tokio::time::sleep(delay).await,
                None => tokio::task::yield_now().await,
            }

            inner.run_batch(batch).await;
        });
    }

    async fn run_batch(self: Arc<Self>, batch: L::BatchKey) {
        let items = {
            let Some(mut queue) = self.queues.get_mut(&batch) else {
                return;
            };

            queue.flush_scheduled = false;

            // The in-flight batch reschedules once it completes
            if queue.in_flight.is_some() {
                debug!("Batch for {batch:?} is already in flight, deferring flush.");
                return;
            }

            if queue.pending.is_empty() {
                drop(queue);
                self.remove_if_idle(&batch);
                return;
            }

            queue.snapshot(self.config.batch_limit())
        };

        debug!("Dispatching {} item(s) for {batch:?}.", items.len());

        let guard = FlushGuard {
            inner: self.clone(),
            batch: Some(batch.clone()),
        };

        let result = self.loader.load(&batch, &items).await.map_err(Error::Fetch);

        guard.release(result);
    }

    /// Settle every waiter of the in-flight batch, then reschedule or clean up
    fn complete(
        self: &Arc<Self>,
        batch: &L::BatchKey,
        result: Result<Vec<L::Value>, Error<L::Error>>,
    ) {
        let mut found: HashMap<L::ItemKey, Arc<L::Value>> = HashMap::new();
        let result = result.map(|values| {
            for value in values {
                found.insert(self.loader.key_of(&value), Arc::new(value));
            }
        });

        let should_flush = {
            let Some(mut queue) = self.queues.get_mut(batch) else {
                return;
            };

            let requests = queue.in_flight.take().unwrap_or_default();
            let waiters: usize = requests.values().map(|request| request.waiters()).sum();

            match &result {
                Ok(()) => {
                    info!(
                        "Batch for {batch:?} settled: {} of {} item(s) found, {waiters} waiter(s).",
                        requests.keys().filter(|key| found.contains_key(*key)).count(),
                        requests.len(),
                    );

                    for (key, request) in requests {
                        request.settle(Ok(found.get(&key).cloned()));
                    }
                }
                Err(err) => {
                    warn!(
                        "Batch for {batch:?} failed for {} item(s), {waiters} waiter(s): {err}",
                        requests.len(),
                    );

                    for request in requests.into_values() {
                        request.settle(Err(err.clone()));
                    }
                }
            }

            queue.claim_flush()
        };

        if should_flush {
            self.schedule(batch.clone());
        } else {
            self.remove_if_idle(batch);
        }
    }

    /// Reject everything queued for a key and drop its state
    fn abort_pending(&self, batch: &L::BatchKey) {
        if let Some(mut queue) = self.queues.get_mut(batch) {
            queue.flush_scheduled = false;
            for request in std::mem::take(&mut queue.pending).into_values() {
                request.settle(Err(Error::Aborted));
            }
        }

        self.remove_if_idle(batch);
    }

    fn remove_if_idle(&self, batch: &L::BatchKey) {
        if self
            .queues
            .remove_if(batch, |_, queue| queue.is_idle())
            .is_some()
        {
            debug!("Queue for {batch:?} is idle, removed.");
        }
    }
}

/// Owns the in-flight batch of a key until it is released.
///
/// Dropping the guard without releasing it (flush task cancelled or loader panicked)
/// rejects the batch so its waiters never hang.
struct FlushGuard<L: BatchLoader> {
    inner: Arc<Inner<L>>,
    batch: Option<L::BatchKey>,
}

impl<L: BatchLoader> FlushGuard<L> {
    fn release(mut self, result: Result<Vec<L::Value>, Error<L::Error>>) {
        if let Some(batch) = self.batch.take() {
            self.inner.complete(&batch, result);
        }
    }
}

impl<L: BatchLoader> Drop for FlushGuard<L> {
    fn drop(&mut self) {
        if let Some(batch) = self.batch.take() {
            error!("Batch for {batch:?} was dropped before it settled.");
            self.inner.complete(&batch, Err(Error::Aborted));
        }
    }
}
