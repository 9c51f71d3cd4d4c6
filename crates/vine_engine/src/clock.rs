use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};

/// Produces RFC 3339 timestamps; injectable so tests get stable values.
pub type Clock = Arc<dyn Fn() -> String + Send + Sync>;

pub fn utc_clock() -> Clock {
    Arc::new(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// The scheduler's only suspension point goes through this, so tests can
/// observe requested delays without waiting for them.
#[async_trait::async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait::async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
