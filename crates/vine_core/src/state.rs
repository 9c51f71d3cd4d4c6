use std::collections::BTreeMap;
use std::time::Duration;

use crate::{QueueId, QueueSnapshot};

/// Scheduler bookkeeping persisted alongside the snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchedulerBook {
    pub interval: Duration,
    pub quiet_cycles: u32,
    /// RFC 3339 timestamp of the last cycle that fetched at least one queue.
    pub last_poll_utc: Option<String>,
}

/// Everything the monitor needs to resume after a restart.
///
/// A queue without a snapshot has never been fetched successfully. Its first
/// successful fetch becomes the baseline and produces no notifications.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineState {
    snapshots: BTreeMap<QueueId, QueueSnapshot>,
    pub scheduler: SchedulerBook,
}

impl EngineState {
    /// State with every queue unseeded.
    pub fn cold() -> Self {
        Self::default()
    }

    pub fn is_seeded(&self, queue: QueueId) -> bool {
        self.snapshots.contains_key(&queue)
    }

    pub fn is_cold(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshot(&self, queue: QueueId) -> Option<&QueueSnapshot> {
        self.snapshots.get(&queue)
    }

    /// Replaces the queue snapshot wholesale, returning the previous one.
    pub fn replace(&mut self, queue: QueueId, snapshot: QueueSnapshot) -> Option<QueueSnapshot> {
        self.snapshots.insert(queue, snapshot)
    }

    pub fn total_items(&self) -> usize {
        self.snapshots.values().map(QueueSnapshot::len).sum()
    }

    pub fn item_counts(&self) -> BTreeMap<QueueId, usize> {
        self.snapshots
            .iter()
            .map(|(queue, snapshot)| (*queue, snapshot.len()))
            .collect()
    }
}
