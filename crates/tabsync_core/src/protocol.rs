//! Wire messages exchanged with observer surfaces.
use serde::{Deserialize, Serialize};

use crate::model::{TabId, TabSnapshot};

/// Pushed to every observer after a sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PushMessage {
    UpdateTabs { data: TabSnapshot },
}

/// Requests sent by observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ObserverCommand {
    SwitchTab {
        tab_id: TabId,
        #[serde(default)]
        url: Option<String>,
    },
    PinTab {
        tab_id: TabId,
        pin: bool,
    },
    CloseTab {
        tab_id: TabId,
    },
    MoveTab {
        tab_id: TabId,
        #[serde(default)]
        new_index: i64,
        #[serde(default)]
        pin: Option<bool>,
    },
    ReloadSite {
        hostname: String,
    },
    Ping,
    FetchFavicon {
        hostname: String,
    },
}

impl ObserverCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            ObserverCommand::SwitchTab { .. } => "SWITCH_TAB",
            ObserverCommand::PinTab { .. } => "PIN_TAB",
            ObserverCommand::CloseTab { .. } => "CLOSE_TAB",
            ObserverCommand::MoveTab { .. } => "MOVE_TAB",
            ObserverCommand::ReloadSite { .. } => "RELOAD_SITE",
            ObserverCommand::Ping => "PING",
            ObserverCommand::FetchFavicon { .. } => "FETCH_FAVICON",
        }
    }
}

/// Synchronous answers to the few commands that have one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObserverReply {
    Pong {
        pong: bool,
    },
    Favicon {
        #[serde(rename = "dataUrl")]
        data_url: Option<String>,
    },
}

impl ObserverReply {
    pub fn pong() -> Self {
        ObserverReply::Pong { pong: true }
    }
}
