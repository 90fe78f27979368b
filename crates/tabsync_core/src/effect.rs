use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Replace any pending debounce timer with one tagged `generation`.
    ArmTimer { generation: u64, delay: Duration },
    /// Run a full sync cycle now.
    SyncNow,
    /// Request a coalesced broadcast after `delay`.
    FollowUp { delay: Duration },
    /// Seed the favicon cache with an icon the host just reported.
    SeedIcon { origin: String, icon_ref: String },
}
