use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use crate::{Item, QueueId, SessionState};

/// How many recent events the status keeps per list.
pub const RECENT_EVENTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub time_utc: String,
    pub id: String,
    pub title: String,
    pub queue: QueueId,
}

impl StatusEntry {
    pub fn from_item(item: &Item, time_utc: impl Into<String>) -> Self {
        Self {
            time_utc: time_utc.into(),
            id: item.id.clone(),
            title: item.title.clone(),
            queue: item.source_queue,
        }
    }
}

/// Read-only view of the monitor published after every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorStatus {
    pub cycle: u64,
    pub last_poll_utc: Option<String>,
    pub interval: Duration,
    pub quiet_cycles: u32,
    pub session: SessionState,
    pub item_counts: BTreeMap<QueueId, usize>,
    /// Newest first.
    pub recent_new_items: VecDeque<StatusEntry>,
    /// Newest first.
    pub recent_priority_matches: VecDeque<StatusEntry>,
}

impl MonitorStatus {
    pub fn total_items(&self) -> usize {
        self.item_counts.values().sum()
    }

    pub fn push_new_item(&mut self, entry: StatusEntry) {
        push_capped(&mut self.recent_new_items, entry);
    }

    pub fn push_priority_match(&mut self, entry: StatusEntry) {
        push_capped(&mut self.recent_priority_matches, entry);
    }
}

fn push_capped(list: &mut VecDeque<StatusEntry>, entry: StatusEntry) {
    list.push_front(entry);
    list.truncate(RECENT_EVENTS);
}
