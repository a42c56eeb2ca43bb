use std::{hash::Hash, mem, sync::Arc};

use indexmap::IndexMap;
use tokio::sync::watch::{channel as watch_channel, Receiver, Sender};

use crate::Error;

/// What every waiter on one item eventually receives
pub type Outcome<V, E> = Result<Option<Arc<V>>, Error<E>>;

pub(crate) type Slot<V, E> = Option<Outcome<V, E>>;

/// Outstanding request for one item, every caller subscribes to the same channel
pub(crate) struct PendingRequest<V, E> {
    sender: Sender<Slot<V, E>>,
}

impl<V, E> PendingRequest<V, E> {
    pub fn new() -> Self {
        let (sender, _) = watch_channel(None);
        Self { sender }
    }

    /// Attach another waiter
    pub fn subscribe(&self) -> Receiver<Slot<V, E>> {
        self.sender.subscribe()
    }

    pub fn waiters(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publish the outcome, consuming the sender so it is sent exactly once
    pub fn settle(self, outcome: Outcome<V, E>) {
        self.sender.send_replace(Some(outcome));
    }
}

pub(crate) type Requests<K, V, E> = IndexMap<K, PendingRequest<V, E>>;

/// Per batch key state
pub(crate) struct QueueState<K, V, E> {
    pub pending: Requests<K, V, E>,
    pub in_flight: Option<Requests<K, V, E>>,
    pub flush_scheduled: bool,
}

impl<K: Hash + Eq, V, E> Default for QueueState<K, V, E> {
    fn default() -> Self {
        Self {
            pending: IndexMap::new(),
            in_flight: None,
            flush_scheduled: false,
        }
    }
}

impl<K: Hash + Eq, V, E> QueueState<K, V, E> {
    /// Subscribe to an item, attaching to the in-flight batch when it already covers it
    pub fn enqueue(&mut self, item: K) -> Receiver<Slot<V, E>> {
        if let Some(request) = self.in_flight.as_ref().and_then(|batch| batch.get(&item)) {
            return request.subscribe();
        }

        self.pending
            .entry(item)
            .or_insert_with(PendingRequest::new)
            .subscribe()
    }

    /// Mark a flush as scheduled if one is needed and allowed
    ///
    /// Returns whether the caller must spawn the flush.
    pub fn claim_flush(&mut self) -> bool {
        if self.in_flight.is_some() || self.flush_scheduled || self.pending.is_empty() {
            return false;
        }

        self.flush_scheduled = true;
        true
    }

    /// Move pending requests into the in-flight slot, at most `limit` of them
    pub fn snapshot(&mut self, limit: Option<usize>) -> Vec<K>
    where
        K: Clone,
    {
        let batch = match limit {
            Some(limit) if self.pending.len() > limit => {
                let rest = self.pending.split_off(limit);
                mem::replace(&mut self.pending, rest)
            }
            _ => mem::take(&mut self.pending),
        };

        let items = batch.keys().cloned().collect();
        self.in_flight = Some(batch);
        items
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.in_flight.is_none() && !self.flush_scheduled
    }
}
