mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tabsync_core::WorkItem;
use tabsync_engine::CacheEntry;

use common::{direct_url, engine_with, init_logging, lookup_url, StubFetcher, PNG};

const CDN_ICON: &str = "https://cdn.example/a.png";

fn window() -> Vec<WorkItem> {
    vec![
        WorkItem::new(1, "A", "https://a.example/").with_favicon(CDN_ICON),
        WorkItem::new(2, "B", "https://b.example/"),
        WorkItem::new(3, "B again", "https://b.example/more"),
        WorkItem::new(4, "Settings", "chrome://settings"),
    ]
}

#[tokio::test(start_paused = true)]
async fn prewarm_seeds_known_icons_and_resolves_the_rest() {
    init_logging();
    let fetcher = Arc::new(StubFetcher::new().respond(CDN_ICON, PNG));
    let (_host, engine) = engine_with(window(), fetcher.clone());

    assert_eq!(engine.prewarm_from_host().await, 1);
    assert_eq!(engine.cache().entry("https://b.example"), CacheEntry::Unavailable);
    assert_eq!(fetcher.calls(&direct_url("b.example")), 1);
    assert_eq!(fetcher.calls(&lookup_url("b.example")), 1);
    assert_eq!(fetcher.calls(&direct_url("a.example")), 0);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fetcher.calls(CDN_ICON), 1);
    assert!(matches!(
        engine.cache().entry("https://a.example"),
        CacheEntry::Resolved(data) if data.starts_with("data:image/png")
    ));
}

#[tokio::test(start_paused = true)]
async fn silent_observers_are_reloaded() {
    init_logging();
    let (host, engine) = engine_with(window(), Arc::new(StubFetcher::new()));
    host.silence_observer(2);
    host.silence_observer(4);

    assert_eq!(engine.reinject_observers().await, vec![2]);
    assert_eq!(host.reloads(), vec![2]);

    // Reloading revived the observer.
    assert!(engine.reinject_observers().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn startup_pushes_reinjects_and_resyncs() {
    init_logging();
    let fetcher = Arc::new(StubFetcher::new().respond(CDN_ICON, PNG));
    let (host, engine) = engine_with(window(), fetcher);
    host.silence_observer(3);

    engine.startup().await;
    assert_eq!(host.reloads(), vec![3]);
    assert!(host.deliveries().iter().all(|(id, _)| *id != 3));

    // Inline upgrade plus the delayed resync.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(engine.push_count(), 3);
    assert!(host.deliveries().iter().any(|(id, _)| *id == 3));
}
