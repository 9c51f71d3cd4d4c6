//! Vine monitor core: pure domain types and state machines, no IO.
mod backoff;
mod interval;
mod item;
mod priority;
mod session;
mod snapshot;
mod state;
mod status;

pub use backoff::ReauthBackoff;
pub use interval::{draw_between, CycleActivity, IntervalMode, IntervalPolicy, MIN_DELAY};
pub use item::{Category, Item, QueueId};
pub use priority::PriorityTerms;
pub use session::{SessionMachine, SessionState};
pub use snapshot::{diff, QueueSnapshot};
pub use state::{EngineState, SchedulerBook};
pub use status::{MonitorStatus, StatusEntry, RECENT_EVENTS};
