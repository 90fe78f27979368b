use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tabsync_core::{ChangeInfo, HostEvent, PushMessage, TabId, WorkItem};
use tokio::sync::mpsc;

use crate::HostError;

/// The host tab-management service, as seen by the sync engine.
#[async_trait::async_trait]
pub trait TabHost: Send + Sync {
    /// All work-items of the current window, in host order.
    async fn list_work_items(&self) -> Result<Vec<WorkItem>, HostError>;
    async fn activate(&self, id: TabId) -> Result<(), HostError>;
    async fn set_pinned(&self, id: TabId, pinned: bool) -> Result<(), HostError>;
    async fn close(&self, id: TabId) -> Result<(), HostError>;
    /// Move to an absolute position in the full list.
    async fn move_to(&self, id: TabId, index: usize) -> Result<(), HostError>;
    async fn reload(&self, id: TabId) -> Result<(), HostError>;
    /// Deliver a push to the observer surface living in work-item `observer`.
    async fn deliver(&self, observer: TabId, message: &PushMessage) -> Result<(), HostError>;
    /// Liveness probe; `Ok(false)` means the observer needs re-injection.
    async fn ping(&self, observer: TabId) -> Result<bool, HostError>;
}

#[derive(Debug, Default)]
struct MemoryHostState {
    items: Vec<WorkItem>,
    deaf_observers: HashSet<TabId>,
    deliveries: Vec<(TabId, PushMessage)>,
    reloads: Vec<TabId>,
    moves: Vec<(TabId, usize)>,
}

/// In-process host that behaves like a single browser window.
///
/// Pinned items are always kept ahead of regular ones. Mutations made through
/// [`TabHost`] do not emit events; the `open`/`remove`/`update` helpers return
/// the event a real host would have sent, for the caller to dispatch.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<MemoryHostState>,
    outlet: Option<mpsc::UnboundedSender<(TabId, PushMessage)>>,
}

impl MemoryHost {
    pub fn new(items: Vec<WorkItem>) -> Self {
        let host = Self::default();
        host.lock().items = items;
        host.normalize_order();
        host
    }

    /// Also forward every successful delivery to `outlet`.
    pub fn with_outlet(mut self, outlet: mpsc::UnboundedSender<(TabId, PushMessage)>) -> Self {
        self.outlet = Some(outlet);
        self
    }

    fn lock(&self) -> MutexGuard<'_, MemoryHostState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn normalize_order(&self) {
        // Stable sort keeps relative order inside each partition.
        self.lock().items.sort_by_key(|item| !item.pinned);
    }

    pub fn items(&self) -> Vec<WorkItem> {
        self.lock().items.clone()
    }

    pub fn item(&self, id: TabId) -> Option<WorkItem> {
        self.lock().items.iter().find(|item| item.id == id).cloned()
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.lock()
            .items
            .iter()
            .find(|item| item.active)
            .map(|item| item.id)
    }

    pub fn deliveries(&self) -> Vec<(TabId, PushMessage)> {
        self.lock().deliveries.clone()
    }

    pub fn reloads(&self) -> Vec<TabId> {
        self.lock().reloads.clone()
    }

    pub fn moves(&self) -> Vec<(TabId, usize)> {
        self.lock().moves.clone()
    }

    /// Make the observer in `id` stop answering pings and deliveries.
    pub fn silence_observer(&self, id: TabId) {
        self.lock().deaf_observers.insert(id);
    }

    pub fn open(&self, item: WorkItem) -> HostEvent {
        let id = item.id;
        {
            let mut state = self.lock();
            if item.active {
                state.items.iter_mut().for_each(|other| other.active = false);
            }
            state.items.push(item);
        }
        self.normalize_order();
        HostEvent::Created { id }
    }

    pub fn remove(&self, id: TabId) -> Option<HostEvent> {
        let mut state = self.lock();
        let position = state.items.iter().position(|item| item.id == id)?;
        state.items.remove(position);
        state.deaf_observers.remove(&id);
        Some(HostEvent::Removed { id })
    }

    /// Apply `change` to an item and return the matching update event.
    pub fn update(&self, id: TabId, change: ChangeInfo) -> Option<HostEvent> {
        let url = {
            let mut state = self.lock();
            let item = state.items.iter_mut().find(|item| item.id == id)?;
            if let Some(title) = &change.title {
                item.title = title.clone();
            }
            if let Some(url) = &change.url {
                item.url = url.clone();
            }
            if let Some(favicon_url) = &change.favicon_url {
                item.favicon_url = Some(favicon_url.clone());
            }
            if let Some(pinned) = change.pinned {
                item.pinned = pinned;
            }
            item.url.clone()
        };
        if change.pinned.is_some() {
            self.normalize_order();
        }
        Some(HostEvent::Updated { id, url, change })
    }

    fn reposition(state: &mut MemoryHostState, id: TabId, index: usize) -> Result<(), HostError> {
        let position = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(HostError::NotFound(id))?;
        let item = state.items.remove(position);
        let pinned_len = state.items.iter().filter(|other| other.pinned).count();
        // A browser refuses to interleave partitions, so clamp into the item's own.
        let index = if item.pinned {
            index.min(pinned_len)
        } else {
            index.clamp(pinned_len, state.items.len())
        };
        state.items.insert(index, item);
        Ok(())
    }
}

#[async_trait::async_trait]
impl TabHost for MemoryHost {
    async fn list_work_items(&self) -> Result<Vec<WorkItem>, HostError> {
        Ok(self.items())
    }

    async fn activate(&self, id: TabId) -> Result<(), HostError> {
        let mut state = self.lock();
        if !state.items.iter().any(|item| item.id == id) {
            return Err(HostError::NotFound(id));
        }
        for item in &mut state.items {
            item.active = item.id == id;
        }
        Ok(())
    }

    async fn set_pinned(&self, id: TabId, pinned: bool) -> Result<(), HostError> {
        let mut state = self.lock();
        let position = state
            .items
            .iter()
            .position(|item| item.id == id)
            .ok_or(HostError::NotFound(id))?;
        if state.items[position].pinned == pinned {
            return Ok(());
        }
        let mut item = state.items.remove(position);
        item.pinned = pinned;
        // Newly pinned items go to the end of the pinned partition, unpinned
        // ones to the front of the regular partition: the same slot either way.
        let boundary = state.items.iter().filter(|other| other.pinned).count();
        state.items.insert(boundary, item);
        Ok(())
    }

    async fn close(&self, id: TabId) -> Result<(), HostError> {
        self.remove(id).map(|_| ()).ok_or(HostError::NotFound(id))
    }

    async fn move_to(&self, id: TabId, index: usize) -> Result<(), HostError> {
        let mut state = self.lock();
        Self::reposition(&mut state, id, index)?;
        state.moves.push((id, index));
        Ok(())
    }

    async fn reload(&self, id: TabId) -> Result<(), HostError> {
        let mut state = self.lock();
        if !state.items.iter().any(|item| item.id == id) {
            return Err(HostError::NotFound(id));
        }
        state.reloads.push(id);
        // A reload re-injects the observer surface.
        state.deaf_observers.remove(&id);
        Ok(())
    }

    async fn deliver(&self, observer: TabId, message: &PushMessage) -> Result<(), HostError> {
        {
            let mut state = self.lock();
            if state.deaf_observers.contains(&observer) {
                return Err(HostError::ObserverUnavailable(observer));
            }
            state.deliveries.push((observer, message.clone()));
        }
        if let Some(outlet) = &self.outlet {
            let _ = outlet.send((observer, message.clone()));
        }
        Ok(())
    }

    async fn ping(&self, observer: TabId) -> Result<bool, HostError> {
        let state = self.lock();
        if !state.items.iter().any(|item| item.id == observer) {
            return Err(HostError::NotFound(observer));
        }
        Ok(!state.deaf_observers.contains(&observer))
    }
}
