mod common;

use std::sync::Arc;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tabsync_core::{ChangeInfo, CoalescerState, IconState, LoadStatus, WorkItem};
use tabsync_engine::SyncSettings;
use tokio::sync::Barrier;
use tokio::time::sleep;

use common::{
    direct_url, engine_with, engine_with_settings, init_logging, last_icons, lookup_url, settle,
    StubFetcher, PNG,
};

const INLINE: &str = "data:image/png;base64,iVBORw0KGgo=";

fn settled_items() -> Vec<WorkItem> {
    vec![
        WorkItem::new(1, "One", "https://one.example/").with_favicon(INLINE),
        WorkItem::new(2, "Two", "https://two.example/").with_favicon(INLINE),
        WorkItem::new(3, "Settings", "chrome://settings"),
    ]
}

#[tokio::test(start_paused = true)]
async fn burst_inside_window_yields_one_cycle() {
    init_logging();
    let (_host, engine) = engine_with(settled_items(), Arc::new(StubFetcher::new()));

    for _ in 0..5 {
        engine.schedule_broadcast();
        sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(engine.push_count(), 0);

    sleep(Duration::from_millis(500)).await;
    assert_eq!(engine.push_count(), 1);
    assert_eq!(engine.coalescer_state(), CoalescerState::Idle);
}

#[tokio::test(start_paused = true)]
async fn spaced_requests_each_get_a_cycle() {
    init_logging();
    let (_host, engine) = engine_with(settled_items(), Arc::new(StubFetcher::new()));

    for _ in 0..3 {
        engine.schedule_broadcast();
        sleep(Duration::from_millis(300)).await;
    }
    assert_eq!(engine.push_count(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_requests_always_settle() {
    init_logging();
    let settings = SyncSettings {
        debounce_ms: 2,
        follow_up_ms: Vec::new(),
        ..SyncSettings::default()
    };
    let (_host, engine) =
        engine_with_settings(settled_items(), Arc::new(StubFetcher::new()), settings);

    for round in 0..100 {
        let before = engine.push_count();
        let barrier = Arc::new(Barrier::new(8));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let engine = engine.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    engine.schedule_broadcast();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        sleep(Duration::from_millis(40)).await;
        assert!(engine.push_count() > before, "round {round} never synced");
        assert_eq!(engine.coalescer_state(), CoalescerState::Idle, "round {round}");
    }
}

#[tokio::test(start_paused = true)]
async fn host_events_are_coalesced() {
    init_logging();
    let (host, engine) = engine_with(settled_items(), Arc::new(StubFetcher::new()));

    engine.handle_host_event(host.open(WorkItem::new(4, "New", "chrome://newtab")));
    engine.handle_host_event(tabsync_core::HostEvent::Activated { id: 4 });
    engine.handle_host_event(tabsync_core::HostEvent::Moved { id: 4 });
    engine.handle_host_event(host.remove(4).unwrap());
    sleep(Duration::from_millis(150)).await;

    assert_eq!(engine.push_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn pending_origins_take_exactly_two_pushes() {
    init_logging();
    let fetcher = Arc::new(
        StubFetcher::new()
            .respond(direct_url("a.example"), PNG)
            .respond(lookup_url("b.example"), &[1u8; 40]),
    );
    let items = vec![
        WorkItem::new(1, "A", "https://a.example/page"),
        WorkItem::new(2, "A again", "https://a.example/other"),
        WorkItem::new(3, "B", "https://b.example/"),
        WorkItem::new(4, "C", "https://c.example/"),
    ];
    let (host, engine) = engine_with(items, fetcher.clone());

    let report = engine.run_cycle().await;
    assert_eq!(report.pushes, 2);
    assert_eq!(report.resolved_origins, 3);
    assert_eq!(host.deliveries().len(), 8);

    let icons = last_icons(&host);
    assert!(matches!(&icons[0].1, IconState::Resolved(data) if data.starts_with("data:image/png")));
    assert_eq!(icons[0].1, icons[1].1);
    assert_eq!(icons[2].1, IconState::Unavailable);
    assert_eq!(icons[3].1, IconState::Unavailable);

    // Everything is terminal now: one push, no network.
    let calls = fetcher.total_calls();
    let report = engine.run_cycle().await;
    assert_eq!(report.pushes, 1);
    assert_eq!(report.resolved_origins, 0);
    assert_eq!(fetcher.total_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn first_push_reports_pending_icons() {
    init_logging();
    let fetcher = Arc::new(StubFetcher::new().respond(direct_url("a.example"), PNG));
    let (host, engine) = engine_with(
        vec![WorkItem::new(1, "A", "https://a.example/")],
        fetcher,
    );

    engine.run_cycle().await;
    let deliveries = host.deliveries();
    let tabsync_core::PushMessage::UpdateTabs { data } = &deliveries[0].1;
    assert_eq!(data.regular[0].icon, IconState::Pending);
    assert_eq!(data.regular[0].origin, "https://a.example");
}

#[tokio::test(start_paused = true)]
async fn silent_observers_do_not_break_the_push() {
    init_logging();
    let (host, engine) = engine_with(settled_items(), Arc::new(StubFetcher::new()));
    host.silence_observer(2);

    let report = engine.run_cycle().await;
    assert_eq!(report.pushes, 1);
    let observers: Vec<_> = host.deliveries().into_iter().map(|(id, _)| id).collect();
    assert_eq!(observers, vec![1, 3]);
}

#[tokio::test(start_paused = true)]
async fn favicon_arrival_pushes_immediately_then_follows_up() {
    init_logging();
    let fetcher = Arc::new(StubFetcher::new());
    let (host, engine) = engine_with(
        vec![WorkItem::new(1, "News", "https://news.example/")],
        fetcher.clone(),
    );

    let change = ChangeInfo {
        favicon_url: Some(INLINE.to_string()),
        ..ChangeInfo::default()
    };
    engine.handle_host_event(host.update(1, change).unwrap());
    settle().await;

    assert_eq!(engine.push_count(), 1);
    assert_eq!(last_icons(&host), vec![(1, IconState::Resolved(INLINE.to_string()))]);
    assert_eq!(fetcher.total_calls(), 0);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(engine.push_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn favicon_arrival_leaves_armed_timer_running() {
    init_logging();
    let (host, engine) = engine_with(
        vec![WorkItem::new(1, "News", "https://news.example/")],
        Arc::new(StubFetcher::new()),
    );

    engine.schedule_broadcast();
    let change = ChangeInfo {
        favicon_url: Some(INLINE.to_string()),
        ..ChangeInfo::default()
    };
    engine.handle_host_event(host.update(1, change).unwrap());
    settle().await;

    assert_eq!(engine.push_count(), 1);
    assert!(matches!(
        engine.coalescer_state(),
        CoalescerState::TimerArmed { .. }
    ));

    sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.push_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn remote_favicon_is_upgraded_and_pushed_again() {
    init_logging();
    let icon_url = "https://cdn.example/news.png";
    let fetcher = Arc::new(StubFetcher::new().respond(icon_url, PNG));
    let (host, engine) = engine_with(
        vec![WorkItem::new(1, "News", "https://news.example/")],
        fetcher.clone(),
    );

    let change = ChangeInfo {
        favicon_url: Some(icon_url.to_string()),
        ..ChangeInfo::default()
    };
    engine.handle_host_event(host.update(1, change).unwrap());
    settle().await;

    assert_eq!(engine.push_count(), 2);
    assert_eq!(fetcher.calls(icon_url), 1);
    let icons = last_icons(&host);
    assert!(matches!(&icons[0].1, IconState::Resolved(data) if data.starts_with("data:image/png")));
}

#[tokio::test(start_paused = true)]
async fn load_complete_schedules_follow_ups() {
    init_logging();
    let (host, engine) = engine_with(settled_items(), Arc::new(StubFetcher::new()));

    let change = ChangeInfo {
        status: Some(LoadStatus::Complete),
        ..ChangeInfo::default()
    };
    engine.handle_host_event(host.update(1, change).unwrap());

    sleep(Duration::from_millis(150)).await;
    assert_eq!(engine.push_count(), 1);
    sleep(Duration::from_millis(1_000)).await;
    assert_eq!(engine.push_count(), 2);
    sleep(Duration::from_millis(3_000)).await;
    assert_eq!(engine.push_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn snapshot_never_fetches() {
    init_logging();
    let fetcher = Arc::new(StubFetcher::new());
    let (_host, engine) = engine_with(
        vec![
            WorkItem::new(1, "Pinned", "https://p.example/").pinned(true),
            WorkItem::new(2, "Regular", "https://r.example/"),
        ],
        fetcher.clone(),
    );

    let snapshot = engine.snapshot().await.unwrap();
    assert_eq!(snapshot.pinned.len(), 1);
    assert_eq!(snapshot.regular.len(), 1);
    assert_eq!(
        snapshot.pending_origins(),
        vec!["https://p.example".to_string(), "https://r.example".to_string()]
    );
    assert_eq!(fetcher.total_calls(), 0);
}
