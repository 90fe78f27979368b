use serde::{Deserialize, Serialize};

use crate::model::TabId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Change notification from the host.
    Host(HostEvent),
    /// Something wants a coalesced broadcast (follow-ups, startup).
    BroadcastRequested,
    /// The debounce timer armed under `generation` elapsed.
    TimerFired { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Created { id: TabId },
    Removed { id: TabId },
    Updated {
        id: TabId,
        /// Current URL of the item, used to key any favicon that arrived.
        url: String,
        change: ChangeInfo,
    },
    Activated { id: TabId },
    Moved { id: TabId },
}

/// Fields the host reports as changed in an update notification.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangeInfo {
    pub favicon_url: Option<String>,
    pub status: Option<LoadStatus>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub pinned: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    Loading,
    Complete,
}
