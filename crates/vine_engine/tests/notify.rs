use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use vine_core::{Category, Item, QueueId};
use vine_engine::{build_embed, Clock, Destinations, DiscordNotifier, Notifier, SiteUrls};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STAMP: &str = "2026-03-01T12:00:00Z";

fn clock() -> Clock {
    Arc::new(|| STAMP.to_string())
}

fn mouse(queue: QueueId) -> Item {
    Item::new(
        "B0MOUSE001",
        "Wireless Bluetooth Mouse Silent",
        "https://www.amazon.com/dp/B0MOUSE001",
        Some("https://m.media-amazon.com/images/I/mouse.jpg".to_string()),
        queue,
    )
}

#[test]
fn embed_describes_the_item() {
    let embed = build_embed(
        &mouse(QueueId::Recommended),
        Category::Recommended,
        &SiteUrls::default(),
        STAMP,
    );

    assert_eq!(
        embed,
        json!({
            "title": "Wireless Bluetooth Mouse Silent",
            "url": "https://www.amazon.com/dp/B0MOUSE001",
            "description": "New item found in **Recommended for you**!",
            "color": 5814783,
            "fields": [{ "name": "ASIN", "value": "B0MOUSE001", "inline": true }],
            "footer": { "text": "Vine Monitor" },
            "timestamp": STAMP,
            "thumbnail": { "url": "https://m.media-amazon.com/images/I/mouse.jpg" },
        })
    );
}

#[test]
fn additional_items_link_a_title_search() {
    let embed = build_embed(
        &mouse(QueueId::Additional),
        Category::Additional,
        &SiteUrls::default(),
        STAMP,
    );
    let search = &embed["fields"][1];
    assert_eq!(search["name"], "Search");
    let value = search["value"].as_str().unwrap();
    assert!(value.contains("Wireless Bluetooth Mouse"));
    assert!(value.contains("search=Wireless+Bluetooth+Mouse"));
}

#[test]
fn untitled_item_and_priority_wording() {
    let item = Item::new("B0EMPTY", "", "https://www.amazon.com/dp/B0EMPTY", None, QueueId::AvailableForAll);
    let embed = build_embed(&item, Category::Priority, &SiteUrls::default(), STAMP);
    assert_eq!(embed["title"], "New Item (ASIN: B0EMPTY)");
    assert_eq!(embed["description"], "Priority match in **Available for all**!");
    assert!(embed.get("thumbnail").is_none());
}

#[test]
fn blank_destination_is_not_configured() {
    let mut destinations = Destinations::new().with(Category::Priority, "https://hook");
    destinations.set(Category::Priority, "   ");
    assert!(destinations.is_empty());
}

#[tokio::test]
async fn posts_embed_to_the_category_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/rfy"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "embeds": [{ "title": "Wireless Bluetooth Mouse Silent", "timestamp": STAMP }]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        Destinations::new().with(Category::Recommended, format!("{}/hooks/rfy", server.uri())),
        SiteUrls::default(),
        Duration::from_secs(5),
        clock(),
    )
    .unwrap();
    notifier.notify(&mouse(QueueId::Recommended), Category::Recommended).await;
}

#[tokio::test]
async fn missing_destination_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        Destinations::new().with(Category::Recommended, format!("{}/hooks/rfy", server.uri())),
        SiteUrls::default(),
        Duration::from_secs(5),
        clock(),
    )
    .unwrap();
    notifier.notify(&mouse(QueueId::Additional), Category::Priority).await;
}

#[tokio::test]
async fn webhook_failure_is_absorbed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        Destinations::new().with(Category::Additional, format!("{}/hooks/ai", server.uri())),
        SiteUrls::default(),
        Duration::from_secs(5),
        clock(),
    )
    .unwrap();
    // Completes without error and without retrying.
    notifier.notify(&mouse(QueueId::Additional), Category::Additional).await;
}

#[tokio::test]
async fn slow_webhook_is_abandoned_after_the_configured_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let notifier = DiscordNotifier::new(
        Destinations::new().with(Category::Recommended, format!("{}/hooks/rfy", server.uri())),
        SiteUrls::default(),
        Duration::from_millis(200),
        clock(),
    )
    .unwrap();

    let started = std::time::Instant::now();
    notifier.notify(&mouse(QueueId::Recommended), Category::Recommended).await;
    assert!(started.elapsed() < Duration::from_secs(3));
}
