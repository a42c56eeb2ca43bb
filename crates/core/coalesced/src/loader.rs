use std::{fmt::Debug, fmt::Display, hash::Hash};

use async_trait::async_trait;

/// Multi-get capability a [`BatchCoalescer`](crate::BatchCoalescer) fans single requests into.
#[async_trait]
pub trait BatchLoader: Send + Sync + 'static {
    /// Request-invariant parameters, items are only merged when these are equal
    type BatchKey: Hash + Eq + Clone + Debug + Send + Sync + 'static;
    /// Identifies one item within a batch
    type ItemKey: Hash + Eq + Clone + Debug + Send + Sync + 'static;
    type Value: Send + Sync + 'static;
    /// Handed to every waiter of a failed batch, hence `Clone`
    type Error: Display + Clone + Send + Sync + 'static;

    /// Fetch every item of one batch in a single call.
    ///
    /// Items missing from the returned list resolve to `None`.
    async fn load(
        &self,
        batch: &Self::BatchKey,
        items: &[Self::ItemKey],
    ) -> Result<Vec<Self::Value>, Self::Error>;

    /// Key a returned value is matched back to its waiters by
    fn key_of(&self, value: &Self::Value) -> Self::ItemKey;
}
