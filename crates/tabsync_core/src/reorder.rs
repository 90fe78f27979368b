use crate::model::{TabId, WorkItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Pinned,
    Regular,
}

impl Partition {
    pub fn of(pinned: bool) -> Self {
        if pinned {
            Partition::Pinned
        } else {
            Partition::Regular
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub partition: Partition,
    /// Index within the destination partition after clamping.
    pub partition_index: usize,
    /// Position in the host's full list.
    pub absolute_index: usize,
}

/// Clamp a requested index into `[0, len - 1]`; an empty partition yields 0.
pub fn clamp_index(requested: i64, len: usize) -> usize {
    let max = len.saturating_sub(1);
    if requested <= 0 {
        0
    } else {
        usize::try_from(requested).map_or(max, |index| index.min(max))
    }
}

/// Work out where `id` lands when dropped at `target_index` of its destination partition.
///
/// `items` is the host order after any pin override has been applied. The
/// destination partition comes from `pin_override` when given, else from the
/// item's current flag; an unknown item is treated as regular.
pub fn plan_move(
    items: &[WorkItem],
    id: TabId,
    target_index: i64,
    pin_override: Option<bool>,
) -> MovePlan {
    let pinned_len = items.iter().filter(|item| item.pinned).count();
    let regular_len = items.len() - pinned_len;

    let pinned = pin_override.unwrap_or_else(|| {
        items
            .iter()
            .find(|item| item.id == id)
            .is_some_and(|item| item.pinned)
    });
    let partition = Partition::of(pinned);

    let (len, offset) = match partition {
        Partition::Pinned => (pinned_len, 0),
        Partition::Regular => (regular_len, pinned_len),
    };
    let partition_index = clamp_index(target_index, len);

    MovePlan {
        partition,
        partition_index,
        absolute_index: offset + partition_index,
    }
}
