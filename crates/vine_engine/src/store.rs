use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use serde::{Deserialize, Serialize};
use vine_core::{EngineState, Item, QueueId, QueueSnapshot, SchedulerBook};

use crate::persist::{write_atomic, PersistError};

pub const DEFAULT_STATE_FILE: &str = "vine_monitor_state.json";

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("no state file at {0:?}")]
    NotFound(PathBuf),
    #[error("could not read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("corrupt state file {path:?}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedItem {
    id: String,
    title: String,
    url: String,
    image_url: Option<String>,
    source_queue: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PersistedScheduler {
    interval_ms: u64,
    quiet_cycles: u32,
    last_poll_utc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rfy_list: Option<Vec<PersistedItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    your_queue_list: Option<Vec<PersistedItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vine_for_all_list: Option<Vec<PersistedItem>>,
    #[serde(default)]
    scheduler: PersistedScheduler,
}

impl PersistedState {
    fn list(&self, queue: QueueId) -> Option<&Vec<PersistedItem>> {
        match queue {
            QueueId::Recommended => self.rfy_list.as_ref(),
            QueueId::Additional => self.your_queue_list.as_ref(),
            QueueId::AvailableForAll => self.vine_for_all_list.as_ref(),
        }
    }

    fn list_mut(&mut self, queue: QueueId) -> &mut Option<Vec<PersistedItem>> {
        match queue {
            QueueId::Recommended => &mut self.rfy_list,
            QueueId::Additional => &mut self.your_queue_list,
            QueueId::AvailableForAll => &mut self.vine_for_all_list,
        }
    }

    fn from_state(state: &EngineState) -> Self {
        let mut persisted = PersistedState {
            scheduler: PersistedScheduler {
                interval_ms: state.scheduler.interval.as_millis() as u64,
                quiet_cycles: state.scheduler.quiet_cycles,
                last_poll_utc: state.scheduler.last_poll_utc.clone(),
            },
            ..PersistedState::default()
        };
        for queue in QueueId::ALL {
            if let Some(snapshot) = state.snapshot(queue) {
                *persisted.list_mut(queue) = Some(snapshot.iter().map(PersistedItem::from).collect());
            }
        }
        persisted
    }

    fn into_state(self) -> Result<EngineState, String> {
        let mut state = EngineState::cold();
        for queue in QueueId::ALL {
            let Some(list) = self.list(queue) else {
                continue;
            };
            let mut snapshot = QueueSnapshot::new();
            for entry in list {
                let source_queue = QueueId::parse(&entry.source_queue).ok_or_else(|| {
                    format!("item {} has unknown source_queue {:?}", entry.id, entry.source_queue)
                })?;
                snapshot.insert(Item::new(
                    entry.id.clone(),
                    entry.title.clone(),
                    entry.url.clone(),
                    entry.image_url.clone(),
                    source_queue,
                ));
            }
            state.replace(queue, snapshot);
        }
        state.scheduler = SchedulerBook {
            interval: Duration::from_millis(self.scheduler.interval_ms),
            quiet_cycles: self.scheduler.quiet_cycles,
            last_poll_utc: self.scheduler.last_poll_utc,
        };
        Ok(state)
    }
}

impl From<&Item> for PersistedItem {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            url: item.url.clone(),
            image_url: item.image_url.clone(),
            source_queue: item.source_queue.as_str().to_string(),
        }
    }
}

/// Durable home of the [`EngineState`]: one JSON document, replaced whole on
/// every save.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<EngineState, LoadError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(LoadError::NotFound(self.path.clone()));
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        let persisted: PersistedState =
            serde_json::from_str(&content).map_err(|err| self.corrupt(err.to_string()))?;
        persisted.into_state().map_err(|reason| self.corrupt(reason))
    }

    /// Loads the persisted state, falling back to a cold state with every
    /// queue unseeded. The flag tells whether anything was restored.
    pub fn load_or_cold(&self) -> (EngineState, bool) {
        match self.load() {
            Ok(state) => {
                engine_info!(
                    "Loaded {} known items from {:?}",
                    state.total_items(),
                    self.path
                );
                (state, true)
            }
            Err(LoadError::NotFound(_)) => {
                engine_info!("No state file at {:?}; starting cold", self.path);
                (EngineState::cold(), false)
            }
            Err(err) => {
                engine_warn!("{}; starting cold", err);
                (EngineState::cold(), false)
            }
        }
    }

    pub fn save(&self, state: &EngineState) -> Result<(), PersistError> {
        let content = render(state)?;
        write_atomic(&self.path, &content)
    }

    fn corrupt(&self, reason: String) -> LoadError {
        LoadError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }
}

/// Exact bytes `save` writes for `state`.
pub fn render(state: &EngineState) -> Result<String, PersistError> {
    let mut text = serde_json::to_string_pretty(&PersistedState::from_state(state))?;
    text.push('\n');
    Ok(text)
}
