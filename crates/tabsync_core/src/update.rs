use crate::origin::{is_reserved_url, origin_of};
use crate::{ChangeInfo, Effect, HostEvent, LoadStatus, Msg, SyncState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SyncState, msg: Msg) -> (SyncState, Vec<Effect>) {
    let effects = match msg {
        Msg::BroadcastRequested => vec![schedule(&mut state)],
        Msg::TimerFired { generation } => {
            if state.fire(generation) {
                vec![Effect::SyncNow]
            } else {
                Vec::new()
            }
        }
        Msg::Host(event) => match event {
            HostEvent::Created { .. }
            | HostEvent::Removed { .. }
            | HostEvent::Activated { .. }
            | HostEvent::Moved { .. } => vec![schedule(&mut state)],
            HostEvent::Updated { url, change, .. } => on_updated(&mut state, &url, change),
        },
    };

    (state, effects)
}

fn schedule(state: &mut SyncState) -> Effect {
    let generation = state.arm();
    Effect::ArmTimer {
        generation,
        delay: state.timing().debounce,
    }
}

fn follow_ups(state: &SyncState) -> impl Iterator<Item = Effect> + '_ {
    state
        .timing()
        .follow_ups
        .iter()
        .map(|delay| Effect::FollowUp { delay: *delay })
}

fn on_updated(state: &mut SyncState, url: &str, change: ChangeInfo) -> Vec<Effect> {
    let icon_ref = change
        .favicon_url
        .as_deref()
        .map(str::trim)
        .filter(|icon_ref| !icon_ref.is_empty());
    if let Some(icon_ref) = icon_ref {
        // Favicon arrival skips the coalescing window; any armed timer stays armed.
        let mut effects = Vec::with_capacity(2 + state.timing().follow_ups.len());
        if !is_reserved_url(icon_ref) {
            if let Some(origin) = origin_of(url) {
                effects.push(Effect::SeedIcon {
                    origin,
                    icon_ref: icon_ref.to_string(),
                });
            }
        }
        effects.push(Effect::SyncNow);
        effects.extend(follow_ups(state));
        return effects;
    }

    let mut effects = vec![schedule(state)];
    if change.status == Some(LoadStatus::Complete) {
        effects.extend(follow_ups(state));
    }
    effects
}
