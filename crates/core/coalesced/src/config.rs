use std::time::Duration;

#[derive(Clone, PartialEq, Eq, Debug)]
/// Config values for [`BatchCoalescer`](crate::BatchCoalescer).
pub struct CoalescerConfig {
    /// Most items sent to the loader in a single call, leftovers form the next batch
    pub max_batch_size: Option<usize>,
    /// How long a scheduled flush waits before snapshotting, `None` yields a single tick
    pub flush_delay: Option<Duration>,
}

impl CoalescerConfig {
    pub(crate) fn batch_limit(&self) -> Option<usize> {
        self.max_batch_size.map(|max| max.max(1))
    }
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(10),
            flush_delay: None,
        }
    }
}
