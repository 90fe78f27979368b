//! Tab sync core: data model, icon classification, reorder math and the pure
//! broadcast coalescer state machine.
mod effect;
mod model;
mod msg;
mod origin;
mod prefs;
mod protocol;
mod reorder;
mod snapshot;
mod state;
mod update;

pub use effect::Effect;
pub use model::{IconState, TabId, TabSnapshot, WorkItem, WorkItemView};
pub use msg::{ChangeInfo, HostEvent, LoadStatus, Msg};
pub use origin::{hostname_of, is_network_url, is_reserved_url, origin_of, RESERVED_SCHEMES};
pub use prefs::{DisplayMode, EffectiveSetting, Preferences, SiteMode, SiteSetting};
pub use protocol::{ObserverCommand, ObserverReply, PushMessage};
pub use reorder::{clamp_index, plan_move, MovePlan, Partition};
pub use snapshot::{
    build_snapshot, classify_icon, usable_host_icon, view_of, CachedIcon, EmptyIconLookup,
    IconLookup,
};
pub use state::{CoalescerState, SyncState, Timing};
pub use update::update;
