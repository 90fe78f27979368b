//! Observer command processing.
use tabsync_core::{hostname_of, plan_move, ObserverCommand, ObserverReply, TabId};
use tabsync_logging::{sync_debug, sync_info, sync_warn};

use crate::{HostError, SyncEngine};

impl SyncEngine {
    /// Carry out an observer command. Mutating commands finish with an
    /// immediate sync; failures are logged, never returned.
    pub async fn handle_command(&self, command: ObserverCommand) -> Option<ObserverReply> {
        let kind = command.kind();
        let result = match command {
            ObserverCommand::Ping => return Some(ObserverReply::pong()),
            ObserverCommand::FetchFavicon { hostname } => {
                let data_url = self.inner.cache.lookup_hostname(&hostname).await;
                return Some(ObserverReply::Favicon { data_url });
            }
            ObserverCommand::ReloadSite { hostname } => {
                self.reload_site(&hostname).await;
                return None;
            }
            ObserverCommand::SwitchTab { tab_id, url } => {
                self.activate(tab_id, url.as_deref()).await
            }
            ObserverCommand::PinTab { tab_id, pin } => {
                self.inner.host.set_pinned(tab_id, pin).await
            }
            ObserverCommand::CloseTab { tab_id } => self.inner.host.close(tab_id).await,
            ObserverCommand::MoveTab {
                tab_id,
                new_index,
                pin,
            } => self.reorder(tab_id, new_index, pin).await,
        };

        match result {
            Ok(()) => self.sync_now(),
            Err(err) => sync_warn!("{} failed: {}", kind, err),
        }
        None
    }

    /// Activate `id`; when the host no longer knows it, fall back to the item
    /// currently showing `url`.
    async fn activate(&self, id: TabId, url: Option<&str>) -> Result<(), HostError> {
        let err = match self.inner.host.activate(id).await {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };
        let Some(url) = url else {
            return Err(err);
        };

        let items = self.inner.host.list_work_items().await?;
        let Some(fallback) = items.iter().find(|item| item.url == url) else {
            return Err(err);
        };
        sync_info!("stale id {} re-matched by url to {}", id, fallback.id);
        self.inner.host.activate(fallback.id).await
    }

    async fn reorder(
        &self,
        id: TabId,
        target_index: i64,
        pin_override: Option<bool>,
    ) -> Result<(), HostError> {
        if let Some(pinned) = pin_override {
            self.inner.host.set_pinned(id, pinned).await?;
        }
        let items = self.inner.host.list_work_items().await?;
        let plan = plan_move(&items, id, target_index, pin_override);
        sync_debug!(
            "move {} to {:?}[{}] (absolute {})",
            id,
            plan.partition,
            plan.partition_index,
            plan.absolute_index
        );
        self.inner.host.move_to(id, plan.absolute_index).await
    }

    async fn reload_site(&self, hostname: &str) {
        let items = match self.inner.host.list_work_items().await {
            Ok(items) => items,
            Err(err) => {
                sync_warn!("RELOAD_SITE {}: cannot list work-items: {}", hostname, err);
                return;
            }
        };
        for item in items
            .iter()
            .filter(|item| hostname_of(&item.url).as_deref() == Some(hostname))
        {
            if let Err(err) = self.inner.host.reload(item.id).await {
                sync_debug!("reload of {} failed: {}", item.id, err);
            }
        }
    }
}
