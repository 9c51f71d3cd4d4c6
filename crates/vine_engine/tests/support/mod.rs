#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vine_core::{Category, Item, QueueId};
use vine_engine::{
    build_client, AuthError, Authenticator, Clock, FailureKind, FetchError, FetchSettings,
    ItemParser, Notifier, Page, PageSource, Session, Sleeper,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

pub fn test_session() -> Session {
    Session::new(build_client(&FetchSettings::default(), None).unwrap())
}

pub fn fixed_clock() -> Clock {
    Arc::new(|| "2026-01-01T00:00:00Z".to_string())
}

/// Page bodies are lines of `ID|Title`.
pub fn body(items: &[(&str, &str)]) -> String {
    items
        .iter()
        .map(|(id, title)| format!("{id}|{title}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
pub struct FakePages {
    pages: Mutex<HashMap<(QueueId, u32), Result<String, FetchError>>>,
    calls: Mutex<Vec<(QueueId, u32)>>,
}

impl FakePages {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, queue: QueueId, page: u32, items: &[(&str, &str)]) {
        self.pages
            .lock()
            .unwrap()
            .insert((queue, page), Ok(body(items)));
    }

    pub fn fail(&self, queue: QueueId, page: u32, kind: FailureKind) {
        self.pages
            .lock()
            .unwrap()
            .insert((queue, page), Err(FetchError::new(kind, "scripted failure")));
    }

    /// Every page of every queue answers with an empty listing.
    pub fn all_empty(&self) {
        for queue in QueueId::ALL {
            for page in 1..=queue.page_count() {
                self.set(queue, page, &[]);
            }
        }
    }

    pub fn calls(&self) -> Vec<(QueueId, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PageSource for FakePages {
    async fn fetch_page(
        &self,
        _session: &Session,
        queue: QueueId,
        page: u32,
    ) -> Result<Page, FetchError> {
        self.calls.lock().unwrap().push((queue, page));
        let scripted = self.pages.lock().unwrap().get(&(queue, page)).cloned();
        let html = scripted
            .unwrap_or_else(|| Err(FetchError::new(FailureKind::HttpStatus(500), "not scripted")))?;
        Ok(Page {
            queue,
            number: page,
            final_url: format!(
                "https://www.amazon.com/vine/vine-items?queue={}",
                queue.query_value()
            ),
            body: html.as_bytes().to_vec(),
            html,
        })
    }
}

pub struct LineParser;

impl ItemParser for LineParser {
    fn parse(&self, page: &Page) -> Vec<Item> {
        page.html
            .lines()
            .filter_map(|line| line.split_once('|'))
            .map(|(id, title)| {
                Item::new(
                    id,
                    title,
                    format!("https://www.amazon.com/dp/{id}"),
                    None,
                    page.queue,
                )
            })
            .collect()
    }
}

/// Fails for each queued `false`, then succeeds.
#[derive(Default)]
pub struct ScriptedAuth {
    script: Mutex<VecDeque<bool>>,
    calls: AtomicUsize,
}

impl ScriptedAuth {
    pub fn succeeding() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_times(n: usize) -> Arc<Self> {
        let auth = Self::default();
        auth.script.lock().unwrap().extend(std::iter::repeat(false).take(n));
        Arc::new(auth)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Authenticator for ScriptedAuth {
    async fn authenticate(&self) -> Result<Session, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(false) => Err(AuthError::NotLoggedIn("scripted".to_string())),
            _ => Ok(test_session()),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, Category)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn sent(&self) -> Vec<(String, Category)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn ids_for(&self, category: Category) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(_, c)| *c == category)
            .map(|(id, _)| id)
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, item: &Item, category: Category) {
        self.sent.lock().unwrap().push((item.id.clone(), category));
    }
}

/// Records requested delays and returns immediately. Optionally cancels a
/// token once a given number of non-zero sleeps has been requested; the
/// tests run with zero page delays so only scheduler sleeps count.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingSleeper {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cancelling_after(sleeps: usize, token: CancellationToken) -> Arc<Self> {
        Arc::new(Self {
            delays: Mutex::new(Vec::new()),
            cancel_after: Some((sleeps, token)),
        })
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    /// Delays between cycles, without the zero-length page pauses.
    pub fn cycle_delays(&self) -> Vec<Duration> {
        self.delays()
            .into_iter()
            .filter(|delay| !delay.is_zero())
            .collect()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut delays = self.delays.lock().unwrap();
            delays.push(duration);
            delays.iter().filter(|delay| !delay.is_zero()).count()
        };
        if duration.is_zero() {
            return;
        }
        if let Some((limit, token)) = &self.cancel_after {
            if count >= *limit {
                token.cancel();
            }
        }
    }
}
