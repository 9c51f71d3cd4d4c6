use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info, engine_warn, set_poll_cycle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use vine_core::{
    diff, Category, CycleActivity, EngineState, IntervalMode, IntervalPolicy, Item,
    MonitorStatus, PriorityTerms, QueueId, QueueSnapshot, ReauthBackoff, SchedulerBook,
    SessionState, StatusEntry, MIN_DELAY,
};

use crate::auth::Authenticator;
use crate::clock::{Clock, Sleeper};
use crate::digest::ContentDigest;
use crate::extract::ItemParser;
use crate::fetch::{PageSource, Session};
use crate::notify::Notifier;
use crate::session::{SessionController, SessionError};
use crate::snapshot::{FetchFailure, FetcherSettings, QueueFetch, SnapshotFetcher};
use crate::store::StateStore;

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub interval: IntervalMode,
    pub reauth_min: Duration,
    pub reauth_max: Duration,
    /// Pause after a recovered or interrupted session before polling again.
    pub resume_delay: Duration,
    pub fetcher: FetcherSettings,
    /// Upper bound for one notification call.
    pub notify_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: IntervalMode::default(),
            reauth_min: Duration::from_secs(120),
            reauth_max: Duration::from_secs(300),
            resume_delay: Duration::from_secs(5),
            fetcher: FetcherSettings::default(),
            notify_timeout: Duration::from_secs(20),
        }
    }
}

/// Everything a [`Monitor`] is assembled from.
pub struct MonitorParts {
    pub authenticator: Arc<dyn Authenticator>,
    pub pages: Arc<dyn PageSource>,
    pub parser: Arc<dyn ItemParser>,
    pub notifier: Arc<dyn Notifier>,
    pub sleeper: Arc<dyn Sleeper>,
    pub clock: Clock,
    pub store: StateStore,
    pub terms: PriorityTerms,
    pub settings: MonitorSettings,
}

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("initial authentication failed with no saved state to resume: {0}")]
    NoSession(#[source] SessionError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Queues were fetched. `failed_queues` kept their previous snapshot.
    Polled {
        new_items: usize,
        priority_matches: usize,
        failed_queues: Vec<QueueId>,
    },
    /// A fetch hit the sign-in page; the remaining queues were skipped.
    SessionLost { queue: QueueId },
    /// Authentication failed; `attempt` counts consecutive failures.
    AuthFailed { attempt: u32 },
    /// Authentication succeeded after failures; polling resumes next cycle.
    Recovered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cycle: u64,
    pub outcome: CycleOutcome,
    pub next_delay: Duration,
}

/// The poll scheduler. Owns the engine state and is the only writer of it.
pub struct Monitor {
    session: SessionController,
    fetcher: SnapshotFetcher,
    notifier: Arc<dyn Notifier>,
    sleeper: Arc<dyn Sleeper>,
    clock: Clock,
    store: StateStore,
    terms: PriorityTerms,
    settings: MonitorSettings,
    state: EngineState,
    digests: BTreeMap<QueueId, ContentDigest>,
    interval: IntervalPolicy,
    backoff: ReauthBackoff,
    /// Consecutive cycles cut short by a session-invalid fetch.
    lost_sessions: u32,
    cycle: u64,
    status: MonitorStatus,
    status_tx: watch::Sender<MonitorStatus>,
    rng: StdRng,
}

impl Monitor {
    /// Loads the persisted state and, on a cold start, authenticates once.
    /// A cold start that cannot authenticate has nothing to fall back on and
    /// fails; a restored state is resumed and authentication happens in the
    /// first cycle.
    pub async fn start(parts: MonitorParts) -> Result<Self, StartupError> {
        let (state, restored) = parts.store.load_or_cold();
        let mut monitor = Self::with_state(parts, state);
        if !restored {
            monitor
                .session
                .ensure_valid()
                .await
                .map_err(StartupError::NoSession)?;
        }
        Ok(monitor)
    }

    /// Builds a monitor around `state` without touching the network or disk.
    pub fn with_state(parts: MonitorParts, state: EngineState) -> Self {
        let MonitorParts {
            authenticator,
            pages,
            parser,
            notifier,
            sleeper,
            clock,
            store,
            terms,
            settings,
        } = parts;

        let interval = IntervalPolicy::restore(settings.interval, state.scheduler.quiet_cycles);
        let backoff = ReauthBackoff::new(settings.reauth_min, settings.reauth_max);
        let fetcher = SnapshotFetcher::new(pages, parser, sleeper.clone(), settings.fetcher);

        let status = MonitorStatus {
            last_poll_utc: state.scheduler.last_poll_utc.clone(),
            interval: interval.current(),
            quiet_cycles: interval.quiet_cycles(),
            item_counts: state.item_counts(),
            ..MonitorStatus::default()
        };
        let (status_tx, _) = watch::channel(status.clone());

        Self {
            session: SessionController::new(authenticator),
            fetcher,
            notifier,
            sleeper,
            clock,
            store,
            terms,
            settings,
            state,
            digests: BTreeMap::new(),
            interval,
            backoff,
            lost_sessions: 0,
            cycle: 0,
            status,
            status_tx,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Status published after every cycle.
    pub fn subscribe(&self) -> watch::Receiver<MonitorStatus> {
        self.status_tx.subscribe()
    }

    /// Polls until `cancel` fires. Cancellation is observed before each
    /// cycle and while sleeping; a running cycle, including its save,
    /// always completes.
    pub async fn run(&mut self, cancel: CancellationToken) -> EngineState {
        engine_info!("Monitor started");
        while !cancel.is_cancelled() {
            let report = self.run_cycle().await;
            engine_debug!("Sleeping {:?} before the next cycle", report.next_delay);
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.sleeper.sleep(report.next_delay) => {}
            }
        }
        engine_info!("Monitor stopped after {} cycle(s)", self.cycle);
        self.state.clone()
    }

    /// Runs one cycle and returns how long to wait before the next.
    pub async fn run_cycle(&mut self) -> CycleReport {
        self.cycle += 1;
        set_poll_cycle(self.cycle);

        let recovering = self.backoff.is_backing_off();
        let (outcome, next_delay) = match self.session.ensure_valid().await {
            Err(err) => {
                let delay = self.backoff.next_delay(&mut self.rng);
                let attempt = self.backoff.attempts();
                engine_error!(
                    "Re-authentication attempt {} failed: {}. Retrying in {:?}",
                    attempt,
                    err,
                    delay
                );
                (CycleOutcome::AuthFailed { attempt }, delay)
            }
            Ok(_) if recovering => {
                engine_info!(
                    "Session re-established after {} failed attempt(s); resuming",
                    self.backoff.attempts()
                );
                self.backoff.reset();
                (CycleOutcome::Recovered, self.settings.resume_delay)
            }
            Ok(session) => self.poll(&session).await,
        };

        let next_delay = next_delay.max(MIN_DELAY);
        self.publish(next_delay);
        CycleReport {
            cycle: self.cycle,
            outcome,
            next_delay,
        }
    }

    async fn poll(&mut self, session: &Session) -> (CycleOutcome, Duration) {
        let mut fetched_any = false;
        let mut changed = false;
        let mut new_items = 0;
        let mut priority_matches = 0;
        let mut failed_queues = Vec::new();
        let mut session_lost = None;

        for queue in QueueId::ALL {
            let previous = self.digests.get(&queue).copied();
            match self
                .fetcher
                .fetch(session, queue, previous.as_ref(), &mut self.rng)
                .await
            {
                Ok(QueueFetch::Unchanged { .. }) => fetched_any = true,
                Ok(QueueFetch::Changed {
                    snapshot, digest, ..
                }) => {
                    fetched_any = true;
                    changed = true;
                    self.digests.insert(queue, digest);
                    let (fresh, priority) = self.absorb(queue, snapshot).await;
                    new_items += fresh;
                    priority_matches += priority;
                }
                Err(FetchFailure::SessionInvalid(reason)) => {
                    self.session.invalidate(&reason);
                    session_lost = Some(queue);
                    break;
                }
                Err(FetchFailure::Transient(reason)) => {
                    engine_warn!("{}: {}; keeping the previous snapshot", queue, reason);
                    failed_queues.push(queue);
                }
            }
        }

        let activity = match (changed, fetched_any) {
            (true, _) => CycleActivity::Changed,
            (false, true) if session_lost.is_none() => CycleActivity::Quiet,
            _ => CycleActivity::Inconclusive,
        };
        self.interval.record(activity);
        let mut next_delay = self.interval.next_delay(&mut self.rng);
        if fetched_any {
            self.state.scheduler.last_poll_utc = Some((self.clock)());
        }
        self.persist();

        let outcome = match session_lost {
            Some(queue) => {
                self.lost_sessions = self.lost_sessions.saturating_add(1);
                next_delay = if self.lost_sessions == 1 {
                    self.settings.resume_delay
                } else {
                    let delay = self.backoff.delay(&mut self.rng);
                    engine_warn!(
                        "Session lost in {} consecutive cycles; waiting {:?}",
                        self.lost_sessions,
                        delay
                    );
                    delay
                };
                CycleOutcome::SessionLost { queue }
            }
            None => {
                self.lost_sessions = 0;
                engine_info!(
                    "Cycle complete: {} new, {} priority, {} known items",
                    new_items,
                    priority_matches,
                    self.state.total_items()
                );
                CycleOutcome::Polled {
                    new_items,
                    priority_matches,
                    failed_queues,
                }
            }
        };
        (outcome, next_delay)
    }

    /// Stores a fresh snapshot and announces what it adds. An unseeded queue
    /// only records its baseline.
    async fn absorb(&mut self, queue: QueueId, snapshot: QueueSnapshot) -> (usize, usize) {
        let fresh = match self.state.snapshot(queue) {
            None => {
                engine_info!(
                    "{}: recorded baseline of {} items without notifying",
                    queue,
                    snapshot.len()
                );
                Vec::new()
            }
            Some(previous) => diff(previous, &snapshot),
        };
        self.state.replace(queue, snapshot);

        let mut priority_matches = 0;
        for item in &fresh {
            if self.announce(item).await {
                priority_matches += 1;
            }
        }
        (fresh.len(), priority_matches)
    }

    /// Notifies one new item; returns whether it matched a priority term.
    async fn announce(&mut self, item: &Item) -> bool {
        engine_info!("New item in {}: {} ({})", item.source_queue, item.title, item.id);
        self.dispatch(item, item.source_queue.category()).await;
        let now = (self.clock)();
        self.status.push_new_item(StatusEntry::from_item(item, now.clone()));

        if !self.terms.matches(&item.title) {
            return false;
        }
        engine_info!("Priority match: {} ({})", item.title, item.id);
        self.dispatch(item, Category::Priority).await;
        self.status.push_priority_match(StatusEntry::from_item(item, now));
        true
    }

    async fn dispatch(&self, item: &Item, category: Category) {
        let call = self.notifier.notify(item, category);
        if tokio::time::timeout(self.settings.notify_timeout, call)
            .await
            .is_err()
        {
            engine_warn!(
                "{} notification for {} timed out after {:?}",
                category,
                item.id,
                self.settings.notify_timeout
            );
        }
    }

    fn persist(&mut self) {
        self.state.scheduler = SchedulerBook {
            interval: self.interval.current(),
            quiet_cycles: self.interval.quiet_cycles(),
            last_poll_utc: self.state.scheduler.last_poll_utc.clone(),
        };
        match self.store.save(&self.state) {
            Ok(()) => engine_debug!("Saved state to {:?}", self.store.path()),
            Err(err) => engine_error!(
                "Failed to save state to {:?}: {}; will retry next cycle",
                self.store.path(),
                err
            ),
        }
    }

    fn publish(&mut self, next_delay: Duration) {
        self.status.cycle = self.cycle;
        self.status.last_poll_utc = self.state.scheduler.last_poll_utc.clone();
        self.status.interval = next_delay;
        self.status.quiet_cycles = self.interval.quiet_cycles();
        self.status.session = self.session.state();
        self.status.item_counts = self.state.item_counts();
        self.status_tx.send_replace(self.status.clone());
    }
}
