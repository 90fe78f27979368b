use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tabsync_core::{update, CoalescerState, Effect, HostEvent, Msg, SyncState};
use tabsync_logging::{current_cycle, sync_debug, sync_trace};
use tokio::task::JoinHandle;

use crate::config::SyncSettings;
use crate::favicon::FaviconCache;
use crate::fetch::{IconFetcher, ReqwestIconFetcher};
use crate::host::TabHost;

pub(crate) struct EngineInner {
    pub(crate) host: Arc<dyn TabHost>,
    pub(crate) cache: FaviconCache,
    pub(crate) settings: SyncSettings,
    pub(crate) pushes: AtomicUsize,
    state: Mutex<SyncState>,
    /// Pending debounce timer, tagged with the generation it will report.
    timer: Mutex<Option<(u64, JoinHandle<()>)>>,
}

/// The background sync service: owns the favicon cache and the debounce timer.
///
/// Cloning is cheap and every clone drives the same engine. All methods that
/// spawn work must be called from inside a tokio runtime.
#[derive(Clone)]
pub struct SyncEngine {
    pub(crate) inner: Arc<EngineInner>,
}

impl SyncEngine {
    pub fn new(
        host: Arc<dyn TabHost>,
        fetcher: Arc<dyn IconFetcher>,
        settings: SyncSettings,
    ) -> Self {
        let cache = FaviconCache::new(fetcher, settings.tiers.clone());
        let state = SyncState::with_timing(settings.timing());
        Self {
            inner: Arc::new(EngineInner {
                host,
                cache,
                settings,
                pushes: AtomicUsize::new(0),
                state: Mutex::new(state),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Engine backed by the reqwest icon fetcher configured from `settings.fetch`.
    pub fn with_http(host: Arc<dyn TabHost>, settings: SyncSettings) -> Self {
        let fetcher = Arc::new(ReqwestIconFetcher::new(settings.fetch.clone()));
        Self::new(host, fetcher, settings)
    }

    pub fn cache(&self) -> &FaviconCache {
        &self.inner.cache
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.inner.settings
    }

    /// Snapshot pushes performed since the engine was created.
    pub fn push_count(&self) -> usize {
        self.inner.pushes.load(Ordering::Relaxed)
    }

    pub fn coalescer_state(&self) -> CoalescerState {
        self.lock_state().coalescer()
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn handle_host_event(&self, event: HostEvent) {
        sync_trace!("host event {:?}", event);
        self.dispatch(Msg::Host(event));
    }

    /// Request a coalesced broadcast.
    pub fn schedule_broadcast(&self) {
        self.dispatch(Msg::BroadcastRequested);
    }

    /// Run one message through the state machine and carry out its effects.
    pub fn dispatch(&self, msg: Msg) {
        let effects = {
            let mut guard = self.lock_state();
            let state = std::mem::take(&mut *guard);
            let (state, effects) = update(state, msg);
            *guard = state;
            effects
        };
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    pub(crate) fn execute_effect(&self, effect: Effect) {
        match effect {
            Effect::ArmTimer { generation, delay } => self.arm_timer(generation, delay),
            Effect::SyncNow => self.sync_now(),
            Effect::FollowUp { delay } => {
                let engine = self.clone();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    engine.dispatch(Msg::BroadcastRequested);
                });
            }
            Effect::SeedIcon { origin, icon_ref } => self.seed_icon(&origin, &icon_ref),
        }
    }

    /// Effects run after the state lock is released, so concurrent dispatches
    /// can reach this out of order. Only a newer generation replaces the slot.
    fn arm_timer(&self, generation: u64, delay: Duration) {
        let mut slot = self.inner.timer.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(&*slot, Some((armed, _)) if *armed >= generation) {
            sync_trace!("stale arm for generation {} ignored", generation);
            return;
        }
        let engine = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            engine.dispatch(Msg::TimerFired { generation });
        });
        if let Some((_, previous)) = slot.replace((generation, handle)) {
            previous.abort();
        }
        sync_trace!("debounce timer armed, generation {}", generation);
    }

    /// Start a full sync cycle in the background, bypassing the coalescing window.
    pub fn sync_now(&self) {
        let engine = self.clone();
        tokio::spawn(async move {
            engine.run_cycle().await;
        });
    }

    /// Seed a host-reported icon; re-broadcast once its inline copy is ready.
    pub(crate) fn seed_icon(&self, origin: &str, icon_ref: &str) {
        let Some(upgrade) = self.inner.cache.prewarm(origin, icon_ref) else {
            return;
        };
        let engine = self.clone();
        let origin = origin.to_string();
        tokio::spawn(async move {
            if matches!(upgrade.await, Ok(true)) {
                sync_debug!("inline icon ready for {} (last cycle {})", origin, current_cycle());
                engine.sync_now();
            }
        });
    }
}
