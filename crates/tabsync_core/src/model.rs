use serde::{Deserialize, Serialize};

use crate::origin::origin_of;

/// Host-assigned work-item identifier.
pub type TabId = i64;

/// A work-item as reported by the host. The core only ever holds copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub id: TabId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Icon reference the host already knows for this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon_url: Option<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub active: bool,
}

impl WorkItem {
    pub fn new(id: TabId, title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            url: url.into(),
            favicon_url: None,
            pinned: false,
            active: false,
        }
    }

    pub fn pinned(mut self, pinned: bool) -> Self {
        self.pinned = pinned;
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    pub fn with_favicon(mut self, favicon_url: impl Into<String>) -> Self {
        self.favicon_url = Some(favicon_url.into());
        self
    }

    /// Scheme+host identity of the item, empty for non-network URLs.
    pub fn origin(&self) -> String {
        origin_of(&self.url).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "data", rename_all = "camelCase")]
pub enum IconState {
    /// Host-reserved page; the panel draws its built-in glyph.
    Default,
    /// Network item whose icon is still being resolved.
    Pending,
    /// Every tier failed; the panel draws a generated placeholder.
    Unavailable,
    /// Image reference, normally a `data:` URL.
    Resolved(String),
}

impl IconState {
    pub fn is_pending(&self) -> bool {
        matches!(self, IconState::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemView {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub origin: String,
    pub pinned: bool,
    pub active: bool,
    pub icon: IconState,
}

/// The full ordered list, split into its two partitions.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TabSnapshot {
    pub pinned: Vec<WorkItemView>,
    pub regular: Vec<WorkItemView>,
}

impl TabSnapshot {
    /// Views in absolute host order (pinned partition first).
    pub fn iter(&self) -> impl Iterator<Item = &WorkItemView> {
        self.pinned.iter().chain(self.regular.iter())
    }

    pub fn len(&self) -> usize {
        self.pinned.len() + self.regular.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pinned.is_empty() && self.regular.is_empty()
    }

    /// Distinct origins of `Pending` items, in snapshot order.
    pub fn pending_origins(&self) -> Vec<String> {
        let mut origins: Vec<String> = Vec::new();
        for view in self.iter() {
            if view.icon.is_pending()
                && !view.origin.is_empty()
                && !origins.contains(&view.origin)
            {
                origins.push(view.origin.clone());
            }
        }
        origins
    }
}
