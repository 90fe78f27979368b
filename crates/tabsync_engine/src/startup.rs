//! Process start: warm the icon cache and revive silent observers.
use futures_util::future::join_all;
use tabsync_core::{is_reserved_url, usable_host_icon, Effect, TabId};
use tabsync_logging::{sync_debug, sync_info, sync_warn};

use crate::SyncEngine;

impl SyncEngine {
    /// Prewarm, broadcast, re-inject observers, then schedule one more
    /// broadcast after the configured delay.
    pub async fn startup(&self) {
        self.prewarm_from_host().await;
        self.run_cycle().await;
        self.reinject_observers().await;
        self.execute_follow_up();
    }

    /// Seed the cache from icons the host already knows; resolve the rest.
    /// Returns the number of origins that needed a lookup.
    pub async fn prewarm_from_host(&self) -> usize {
        let items = match self.inner.host.list_work_items().await {
            Ok(items) => items,
            Err(err) => {
                sync_warn!("prewarm: cannot list work-items: {}", err);
                return 0;
            }
        };

        let mut origins: Vec<String> = Vec::new();
        for item in &items {
            let origin = item.origin();
            if origin.is_empty() {
                continue;
            }
            match usable_host_icon(item) {
                Some(icon_ref) => self.seed_icon(&origin, icon_ref),
                None if !origins.contains(&origin) => origins.push(origin),
                None => {}
            }
        }

        if !origins.is_empty() {
            sync_info!("prewarm: resolving {} origin(s)", origins.len());
            join_all(origins.iter().map(|origin| self.inner.cache.resolve(origin))).await;
        }
        origins.len()
    }

    /// Ping each observer and reload items whose observer does not answer.
    /// Returns the ids that were reloaded.
    pub async fn reinject_observers(&self) -> Vec<TabId> {
        let items = match self.inner.host.list_work_items().await {
            Ok(items) => items,
            Err(err) => {
                sync_warn!("reinject: cannot list work-items: {}", err);
                return Vec::new();
            }
        };

        let mut reloaded = Vec::new();
        for item in items.iter().filter(|item| !is_reserved_url(&item.url)) {
            match self.inner.host.ping(item.id).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(err) => sync_debug!("ping {} failed: {}", item.id, err),
            }
            match self.inner.host.reload(item.id).await {
                Ok(()) => reloaded.push(item.id),
                Err(err) => sync_debug!("reload {} failed: {}", item.id, err),
            }
        }
        if !reloaded.is_empty() {
            sync_info!("re-injected {} observer(s)", reloaded.len());
        }
        reloaded
    }

    fn execute_follow_up(&self) {
        let delay = self.inner.settings.startup_resync();
        self.execute_effect(Effect::FollowUp { delay });
    }
}
