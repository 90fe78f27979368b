//! Snapshot aggregation and the two-phase sync cycle.
use std::collections::HashSet;
use std::sync::atomic::Ordering;

use futures_util::future::join_all;
use tabsync_core::{build_snapshot, PushMessage, TabSnapshot};
use tabsync_logging::{begin_cycle, sync_debug, sync_info, sync_warn};

use crate::{CycleReport, HostError, SyncEngine};

impl SyncEngine {
    /// Current host state, partitioned and classified against the cache.
    /// Never starts a favicon fetch.
    pub async fn snapshot(&self) -> Result<TabSnapshot, HostError> {
        let items = self.inner.host.list_work_items().await?;
        Ok(build_snapshot(&items, &self.inner.cache))
    }

    /// Phase 1 pushes the current snapshot; phase 2 resolves its pending
    /// origins and pushes again. Phase 2 repeats only for origins not yet
    /// attempted in this cycle, so it ends once the cache has answered.
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = begin_cycle();
        let mut report = CycleReport::default();

        let Some(mut snapshot) = self.push_snapshot(cycle).await else {
            return report;
        };
        report.pushes += 1;

        let mut attempted: HashSet<String> = HashSet::new();
        loop {
            let pending: Vec<String> = snapshot
                .pending_origins()
                .into_iter()
                .filter(|origin| attempted.insert(origin.clone()))
                .collect();
            if pending.is_empty() {
                break;
            }

            sync_debug!("cycle {}: resolving {} origin(s)", cycle, pending.len());
            join_all(pending.iter().map(|origin| self.inner.cache.resolve(origin))).await;
            report.resolved_origins += pending.len();

            match self.push_snapshot(cycle).await {
                Some(next) => {
                    snapshot = next;
                    report.pushes += 1;
                }
                None => break,
            }
        }

        sync_info!(
            "cycle {} done: {} push(es), {} origin(s) resolved",
            cycle,
            report.pushes,
            report.resolved_origins
        );
        report
    }

    /// Snapshot the host and deliver it to every observer; `None` if the host
    /// could not be enumerated.
    async fn push_snapshot(&self, cycle: u64) -> Option<TabSnapshot> {
        let items = match self.inner.host.list_work_items().await {
            Ok(items) => items,
            Err(err) => {
                sync_warn!("cycle {}: cannot list work-items: {}", cycle, err);
                return None;
            }
        };
        let snapshot = build_snapshot(&items, &self.inner.cache);
        let message = PushMessage::UpdateTabs {
            data: snapshot.clone(),
        };

        for item in &items {
            // Observers that are not ready simply miss this push.
            if let Err(err) = self.inner.host.deliver(item.id, &message).await {
                sync_debug!("cycle {}: skipped observer {}: {}", cycle, item.id, err);
            }
        }
        self.inner.pushes.fetch_add(1, Ordering::Relaxed);
        Some(snapshot)
    }
}
