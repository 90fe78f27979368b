#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use tabsync_core::{IconState, PushMessage, TabId, WorkItem};
use tabsync_engine::{
    FailureKind, FetchError, FetchOutput, IconFetcher, MemoryHost, SyncEngine, SyncSettings,
};

pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x10\0\0\0\x10\x08\x06\0\0\0\x1f\xf3\xffa\0\0\0\x19tEXtSoftware\0Adobe ImageReadyq\xc9e<\0\0\0\x0cIDATx\xdac\xf8\xff\xff?\0\x05\xfe\x02\xfe\xa7\x35\x81\x84\0\0\0\0IEND\xaeB`\x82";

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(tabsync_logging::initialize_for_tests);
}

pub fn direct_url(host: &str) -> String {
    format!("https://{host}/favicon.ico")
}

pub fn lookup_url(host: &str) -> String {
    format!("https://www.google.com/s2/favicons?domain={host}&sz=32")
}

/// Scripted fetcher: unknown URLs answer 404. Counts every call.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Result<Vec<u8>, FailureKind>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn respond(self, url: impl Into<String>, body: &[u8]) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), Ok(body.to_vec()));
        self
    }

    pub fn fail(self, url: impl Into<String>, kind: FailureKind) -> Self {
        self.responses.lock().unwrap().insert(url.into(), Err(kind));
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl IconFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or(Err(FailureKind::HttpStatus(404)));
        match response {
            Ok(bytes) => Ok(FetchOutput {
                bytes,
                content_type: None,
                final_url: url.to_string(),
            }),
            Err(kind) => Err(FetchError::new(kind, "stubbed failure")),
        }
    }
}

pub fn engine_with(
    items: Vec<WorkItem>,
    fetcher: Arc<StubFetcher>,
) -> (Arc<MemoryHost>, SyncEngine) {
    engine_with_settings(items, fetcher, SyncSettings::default())
}

pub fn engine_with_settings(
    items: Vec<WorkItem>,
    fetcher: Arc<StubFetcher>,
    settings: SyncSettings,
) -> (Arc<MemoryHost>, SyncEngine) {
    let host = Arc::new(MemoryHost::new(items));
    let engine = SyncEngine::new(host.clone(), fetcher, settings);
    (host, engine)
}

/// Icon states of the most recent push, in absolute order.
pub fn last_icons(host: &MemoryHost) -> Vec<(TabId, IconState)> {
    let deliveries = host.deliveries();
    let Some((_, PushMessage::UpdateTabs { data })) = deliveries.last() else {
        return Vec::new();
    };
    data.iter().map(|view| (view.id, view.icon.clone())).collect()
}

/// Let spawned work finish without crossing the coalescing window.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
