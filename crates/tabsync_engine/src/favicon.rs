//! Origin-keyed favicon cache with tiered resolution and in-flight deduplication.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use tabsync_core::{is_reserved_url, CachedIcon, IconLookup};
use tabsync_logging::{sync_debug, sync_trace};
use tokio::task::JoinHandle;
use url::Url;

use crate::config::Tier;
use crate::fetch::IconFetcher;
use crate::inline::{is_data_url, to_data_url};

/// Minimum body size accepted when upgrading a host-supplied icon URL.
const UPGRADE_MIN_BYTES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntry {
    Unresolved,
    InFlight,
    Resolved(String),
    Unavailable,
}

impl CacheEntry {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CacheEntry::Resolved(_) | CacheEntry::Unavailable)
    }
}

type InFlightTask = Shared<BoxFuture<'static, ()>>;

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    in_flight: HashMap<String, InFlightTask>,
}

struct CacheInner {
    fetcher: Arc<dyn IconFetcher>,
    tiers: Vec<Tier>,
    state: Mutex<CacheState>,
}

/// Cheaply cloneable handle; clones share one cache.
#[derive(Clone)]
pub struct FaviconCache {
    inner: Arc<CacheInner>,
}

impl FaviconCache {
    pub fn new(fetcher: Arc<dyn IconFetcher>, tiers: Vec<Tier>) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                tiers,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn entry(&self, origin: &str) -> CacheEntry {
        self.inner
            .lock()
            .entries
            .get(origin)
            .cloned()
            .unwrap_or(CacheEntry::Unresolved)
    }

    pub fn in_flight_count(&self) -> usize {
        self.inner.lock().in_flight.len()
    }

    /// Fill the cache entry for `origin`, joining a running resolution if there is one.
    pub async fn resolve(&self, origin: &str) {
        let task = {
            let mut state = self.inner.lock();
            if state.entries.get(origin).is_some_and(CacheEntry::is_terminal) {
                return;
            }
            match state.in_flight.get(origin) {
                Some(task) => {
                    sync_trace!("joining in-flight favicon resolution for {}", origin);
                    task.clone()
                }
                None => {
                    let task = self.spawn_resolution(origin.to_string());
                    state
                        .entries
                        .insert(origin.to_string(), CacheEntry::InFlight);
                    state.in_flight.insert(origin.to_string(), task.clone());
                    task
                }
            }
        };
        task.await;
    }

    fn spawn_resolution(&self, origin: String) -> InFlightTask {
        let inner = Arc::clone(&self.inner);
        // Spawned so the work finishes even if every waiter goes away.
        let handle = tokio::spawn(async move {
            let outcome = inner.run_tiers(&origin).await;
            inner.settle(&origin, outcome);
        });
        async move {
            let _ = handle.await;
        }
        .boxed()
        .shared()
    }

    /// Seed `origin` with an icon the host already knows about.
    ///
    /// Returns a handle when an inline upgrade was started; it yields `true`
    /// once the seeded reference has been replaced by a `data:` copy.
    pub fn prewarm(&self, origin: &str, icon_ref: &str) -> Option<JoinHandle<bool>> {
        let icon_ref = icon_ref.trim();
        if origin.is_empty() || icon_ref.is_empty() || is_reserved_url(icon_ref) {
            return None;
        }
        self.inner
            .lock()
            .entries
            .insert(origin.to_string(), CacheEntry::Resolved(icon_ref.to_string()));
        if is_data_url(icon_ref) {
            return None;
        }

        let inner = Arc::clone(&self.inner);
        let origin = origin.to_string();
        let icon_ref = icon_ref.to_string();
        Some(tokio::spawn(async move {
            let Some(data_url) = inner.fetch_inline(&icon_ref, UPGRADE_MIN_BYTES).await else {
                return false;
            };
            let mut state = inner.lock();
            match state.entries.get(&origin) {
                // Only replace what we seeded; a fresher icon may have landed meanwhile.
                Some(CacheEntry::Resolved(current)) if *current == icon_ref => {
                    state.entries.insert(origin, CacheEntry::Resolved(data_url));
                    true
                }
                _ => false,
            }
        }))
    }

    /// Ask the first lookup-service tier about a bare hostname and cache any hit
    /// under `https://{hostname}`.
    pub async fn lookup_hostname(&self, hostname: &str) -> Option<String> {
        let hostname = hostname.trim();
        if hostname.is_empty() {
            return None;
        }
        let tier = self
            .inner
            .tiers
            .iter()
            .find(|tier| matches!(tier, Tier::LookupService { .. }))?;
        let origin = format!("https://{hostname}");
        let url = tier.url_for(&origin, hostname);
        let data_url = self.inner.fetch_inline(&url, tier.min_bytes()).await?;
        self.inner
            .lock()
            .entries
            .insert(origin, CacheEntry::Resolved(data_url.clone()));
        Some(data_url)
    }
}

impl CacheInner {
    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_tiers(&self, origin: &str) -> Option<String> {
        let hostname = match Url::parse(origin) {
            Ok(parsed) => parsed.host_str()?.to_string(),
            Err(err) => {
                sync_debug!("malformed origin {}: {}", origin, err);
                return None;
            }
        };
        for tier in &self.tiers {
            let url = tier.url_for(origin, &hostname);
            if let Some(data_url) = self.fetch_inline(&url, tier.min_bytes()).await {
                return Some(data_url);
            }
        }
        None
    }

    async fn fetch_inline(&self, url: &str, min_bytes: usize) -> Option<String> {
        match self.fetcher.fetch(url).await {
            Ok(output) if output.bytes.len() >= min_bytes => {
                if output.final_url != url {
                    sync_debug!("icon at {} served from {}", url, output.final_url);
                }
                Some(to_data_url(&output.bytes, output.content_type.as_deref()))
            }
            Ok(output) => {
                sync_debug!(
                    "icon at {} too small ({} < {} bytes)",
                    url,
                    output.bytes.len(),
                    min_bytes
                );
                None
            }
            Err(err) => {
                sync_debug!("icon fetch {} failed: {}", url, err);
                None
            }
        }
    }

    /// Record the outcome and leave the in-flight registry in one step.
    fn settle(&self, origin: &str, outcome: Option<String>) {
        let mut state = self.lock();
        state.in_flight.remove(origin);
        let entry = state
            .entries
            .entry(origin.to_string())
            .or_insert(CacheEntry::Unresolved);
        if let CacheEntry::Resolved(_) = entry {
            // The host seeded an icon while we were fetching; keep it.
            return;
        }
        *entry = match outcome {
            Some(data_url) => CacheEntry::Resolved(data_url),
            None => CacheEntry::Unavailable,
        };
        sync_debug!("favicon for {} settled as {}", origin, entry_label(entry));
    }
}

fn entry_label(entry: &CacheEntry) -> &'static str {
    match entry {
        CacheEntry::Unresolved => "unresolved",
        CacheEntry::InFlight => "in-flight",
        CacheEntry::Resolved(_) => "resolved",
        CacheEntry::Unavailable => "unavailable",
    }
}

impl IconLookup for FaviconCache {
    fn cached_icon(&self, origin: &str) -> CachedIcon {
        match self.entry(origin) {
            CacheEntry::Resolved(data) => CachedIcon::Resolved(data),
            CacheEntry::Unavailable => CachedIcon::Unavailable,
            CacheEntry::Unresolved | CacheEntry::InFlight => CachedIcon::Missing,
        }
    }
}
