use std::collections::BTreeMap;
use std::time::Duration;

use engine_logging::{engine_debug, engine_error, engine_info};
use reqwest::header::CONTENT_TYPE;
use serde_json::{json, Value};
use vine_core::{Category, Item, QueueId};

use crate::clock::Clock;
use crate::fetch::map_reqwest_error;
use crate::site::SiteUrls;
use crate::FetchError;

const EMBED_COLOR: u32 = 5_814_783;
const FOOTER: &str = "Vine Monitor";
const SEARCH_WORDS: usize = 3;

/// Outbound alert channel. Best effort: implementations log failures and
/// never retry.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, item: &Item, category: Category);
}

/// Webhook URL per category. Categories without one are not notified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    urls: BTreeMap<Category, String>,
}

impl Destinations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, url: impl Into<String>) -> Self {
        self.set(category, url);
        self
    }

    /// Blank URLs clear the destination.
    pub fn set(&mut self, category: Category, url: impl Into<String>) {
        let url = url.into();
        let url = url.trim();
        if url.is_empty() {
            self.urls.remove(&category);
        } else {
            self.urls.insert(category, url.to_string());
        }
    }

    pub fn get(&self, category: Category) -> Option<&str> {
        self.urls.get(&category).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }
}

pub struct DiscordNotifier {
    client: reqwest::Client,
    destinations: Destinations,
    site: SiteUrls,
    clock: Clock,
}

impl DiscordNotifier {
    /// Every webhook call is bounded by `timeout`.
    pub fn new(
        destinations: Destinations,
        site: SiteUrls,
        timeout: Duration,
        clock: Clock,
    ) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(map_reqwest_error)?;
        Ok(Self {
            client,
            destinations,
            site,
            clock,
        })
    }

    async fn post(&self, url: &str, payload: &Value) -> Result<u16, String> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload.to_string())
            .send()
            .await
            .map_err(|err| map_reqwest_error(err).to_string())?;
        Ok(response.status().as_u16())
    }
}

#[async_trait::async_trait]
impl Notifier for DiscordNotifier {
    async fn notify(&self, item: &Item, category: Category) {
        let Some(url) = self.destinations.get(category) else {
            engine_debug!("No webhook configured for {}; skipping {}", category, item.id);
            return;
        };

        let embed = build_embed(item, category, &self.site, &(self.clock)());
        let payload = json!({ "embeds": [embed] });

        match self.post(url, &payload).await {
            Ok(200 | 204) => {
                engine_info!("Sent {} notification for {}: {}", category, item.id, item.title);
            }
            Ok(status) => {
                engine_error!(
                    "Failed to send {} notification for {}: HTTP {}",
                    category,
                    item.id,
                    status
                );
            }
            Err(err) => {
                engine_error!("Failed to send {} notification for {}: {}", category, item.id, err);
            }
        }
    }
}

/// Discord embed describing one item.
pub fn build_embed(item: &Item, category: Category, site: &SiteUrls, timestamp: &str) -> Value {
    let title = if item.title.trim().is_empty() {
        format!("New Item (ASIN: {})", item.id)
    } else {
        item.title.clone()
    };
    let queue = item.source_queue.display_name();
    let description = match category {
        Category::Priority => format!("Priority match in **{queue}**!"),
        _ => format!("New item found in **{queue}**!"),
    };

    let mut fields = vec![json!({ "name": "ASIN", "value": item.id, "inline": true })];
    if item.source_queue == QueueId::Additional {
        if let Some(prefix) = item.title_prefix(SEARCH_WORDS) {
            let search = site.search_url(&prefix);
            fields.push(json!({
                "name": "Search",
                "value": format!("[Search Vine for \"{prefix}\"]({search})"),
                "inline": false,
            }));
        }
    }

    let mut embed = json!({
        "title": title,
        "url": item.url,
        "description": description,
        "color": EMBED_COLOR,
        "fields": fields,
        "footer": { "text": FOOTER },
        "timestamp": timestamp,
    });
    if let (Some(image), Value::Object(map)) = (&item.image_url, &mut embed) {
        map.insert("thumbnail".to_string(), json!({ "url": image }));
    }
    embed
}
