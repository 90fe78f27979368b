use crate::model::{IconState, TabSnapshot, WorkItem, WorkItemView};
use crate::origin::{is_network_url, is_reserved_url};

const UNTITLED: &str = "Untitled";

/// What the favicon cache currently knows about an origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedIcon {
    /// Never resolved, or a resolution is still running.
    Missing,
    Resolved(String),
    Unavailable,
}

/// Read-only view of the favicon cache. Implementations must not start fetches.
pub trait IconLookup {
    fn cached_icon(&self, origin: &str) -> CachedIcon;
}

/// Lookup that knows nothing; every network item classifies as pending.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyIconLookup;

impl IconLookup for EmptyIconLookup {
    fn cached_icon(&self, _origin: &str) -> CachedIcon {
        CachedIcon::Missing
    }
}

/// Partition host items into pinned/regular (host order preserved) and classify icons.
pub fn build_snapshot(items: &[WorkItem], icons: &dyn IconLookup) -> TabSnapshot {
    let mut snapshot = TabSnapshot::default();
    for item in items {
        let view = view_of(item, icons);
        if item.pinned {
            snapshot.pinned.push(view);
        } else {
            snapshot.regular.push(view);
        }
    }
    snapshot
}

pub fn view_of(item: &WorkItem, icons: &dyn IconLookup) -> WorkItemView {
    let origin = item.origin();
    let title = if item.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        item.title.clone()
    };
    WorkItemView {
        id: item.id,
        icon: classify_icon(item, &origin, icons),
        title,
        url: item.url.clone(),
        origin,
        pinned: item.pinned,
        active: item.active,
    }
}

/// Icon classification; `origin` is `item.origin()`, passed in to avoid reparsing.
pub fn classify_icon(item: &WorkItem, origin: &str, icons: &dyn IconLookup) -> IconState {
    if is_reserved_url(&item.url) {
        return IconState::Default;
    }

    let cached = if origin.is_empty() {
        CachedIcon::Missing
    } else {
        icons.cached_icon(origin)
    };
    if let CachedIcon::Resolved(data) = cached {
        return IconState::Resolved(data);
    }

    if let Some(host_icon) = usable_host_icon(item) {
        return IconState::Resolved(host_icon.to_string());
    }

    // A terminal failure must never go back to Pending, or every cycle would
    // schedule another resolution pass.
    if cached == CachedIcon::Unavailable {
        return IconState::Unavailable;
    }

    if is_network_url(&item.url) {
        IconState::Pending
    } else {
        IconState::Unavailable
    }
}

/// Host-supplied icon reference, unless empty or itself on a reserved scheme.
pub fn usable_host_icon(item: &WorkItem) -> Option<&str> {
    item.favicon_url
        .as_deref()
        .map(str::trim)
        .filter(|icon| !icon.is_empty() && !is_reserved_url(icon))
}
