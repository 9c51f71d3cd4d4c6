use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use rand::Rng;
use vine_core::{draw_between, QueueId, QueueSnapshot};

use crate::clock::Sleeper;
use crate::digest::ContentDigest;
use crate::extract::ItemParser;
use crate::fetch::{PageSource, Session};
use crate::{FailureKind, FetchError, Page};

/// Result of fetching every page of one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueFetch {
    /// Raw content matches the previous digest; nothing was parsed.
    Unchanged { digest: ContentDigest },
    Changed {
        snapshot: QueueSnapshot,
        digest: ContentDigest,
        /// Pages that failed while at least one other page succeeded.
        lost_pages: Vec<u32>,
    },
}

impl QueueFetch {
    pub fn digest(&self) -> ContentDigest {
        match self {
            QueueFetch::Unchanged { digest } | QueueFetch::Changed { digest, .. } => *digest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    #[error("session invalid: {0}")]
    SessionInvalid(String),
    #[error("transient failure: {0}")]
    Transient(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FetcherSettings {
    pub page_delay_min: Duration,
    pub page_delay_max: Duration,
    /// Upper bound for a single page request.
    pub call_timeout: Duration,
}

impl Default for FetcherSettings {
    fn default() -> Self {
        Self {
            page_delay_min: Duration::from_secs(2),
            page_delay_max: Duration::from_secs(4),
            call_timeout: Duration::from_secs(20),
        }
    }
}

/// Downloads a queue page by page and aggregates the items into a snapshot.
pub struct SnapshotFetcher {
    pages: Arc<dyn PageSource>,
    parser: Arc<dyn ItemParser>,
    sleeper: Arc<dyn Sleeper>,
    settings: FetcherSettings,
}

impl SnapshotFetcher {
    pub fn new(
        pages: Arc<dyn PageSource>,
        parser: Arc<dyn ItemParser>,
        sleeper: Arc<dyn Sleeper>,
        settings: FetcherSettings,
    ) -> Self {
        Self {
            pages,
            parser,
            sleeper,
            settings,
        }
    }

    /// Fetches every page of `queue`. When the raw content hashes to
    /// `previous`, parsing is skipped and [`QueueFetch::Unchanged`] returned.
    /// Pauses between pages are drawn from `rng`.
    pub async fn fetch<R: Rng + Send + ?Sized>(
        &self,
        session: &Session,
        queue: QueueId,
        previous: Option<&ContentDigest>,
        rng: &mut R,
    ) -> Result<QueueFetch, FetchFailure> {
        let page_count = queue.page_count().max(1);
        let mut pages: Vec<Page> = Vec::with_capacity(page_count as usize);
        let mut lost_pages = Vec::new();
        let mut last_error = None;

        for number in 1..=page_count {
            if number > 1 {
                let pause = draw_between(
                    rng,
                    self.settings.page_delay_min,
                    self.settings.page_delay_max,
                );
                self.sleeper.sleep(pause).await;
            }
            engine_debug!("Fetching {} page {}/{}", queue, number, page_count);
            match self.fetch_one(session, queue, number).await {
                Ok(page) => pages.push(page),
                Err(err) if err.is_session_invalid() => {
                    return Err(FetchFailure::SessionInvalid(err.message));
                }
                Err(err) => {
                    engine_warn!("Failed to fetch {} page {}: {}", queue, number, err);
                    lost_pages.push(number);
                    last_error = Some(err);
                }
            }
        }

        if pages.is_empty() {
            let reason = last_error
                .map(|err| err.to_string())
                .unwrap_or_else(|| "no pages fetched".to_string());
            return Err(FetchFailure::Transient(reason));
        }
        if !lost_pages.is_empty() {
            engine_warn!(
                "Partial fetch of {}: lost pages {:?}, keeping {} of {}",
                queue,
                lost_pages,
                pages.len(),
                page_count
            );
        }

        let digest = ContentDigest::of_pages(&pages);
        if lost_pages.is_empty() && previous == Some(&digest) {
            engine_debug!("{} unchanged (digest {})", queue, digest.short_hex());
            return Ok(QueueFetch::Unchanged { digest });
        }

        let mut snapshot = QueueSnapshot::new();
        for page in &pages {
            for item in self.parser.parse(page) {
                let id = item.id.clone();
                if snapshot.insert(item).is_some() {
                    engine_warn!("Duplicate item {} in {}; keeping the last one", id, queue);
                }
            }
        }
        engine_info!("{}: {} items across {} page(s)", queue, snapshot.len(), pages.len());

        Ok(QueueFetch::Changed {
            snapshot,
            digest,
            lost_pages,
        })
    }

    async fn fetch_one(
        &self,
        session: &Session,
        queue: QueueId,
        number: u32,
    ) -> Result<Page, FetchError> {
        let call = self.pages.fetch_page(session, queue, number);
        match tokio::time::timeout(self.settings.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::new(
                FailureKind::Timeout,
                format!("page {number} took longer than {:?}", self.settings.call_timeout),
            )),
        }
    }
}
