use std::time::Duration;

/// Delays that drive the broadcast coalescer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    /// Coalescing window.
    pub debounce: Duration,
    /// Extra coalesced broadcasts after a favicon arrives or a load completes.
    pub follow_ups: Vec<Duration>,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            follow_ups: vec![Duration::from_millis(1000), Duration::from_millis(3500)],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoalescerState {
    #[default]
    Idle,
    TimerArmed { generation: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncState {
    coalescer: CoalescerState,
    timing: Timing,
    last_generation: u64,
}

impl SyncState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timing(timing: Timing) -> Self {
        Self {
            timing,
            ..Self::default()
        }
    }

    pub fn coalescer(&self) -> CoalescerState {
        self.coalescer
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Arm (or re-arm) the timer under a fresh generation.
    pub(crate) fn arm(&mut self) -> u64 {
        self.last_generation += 1;
        self.coalescer = CoalescerState::TimerArmed {
            generation: self.last_generation,
        };
        self.last_generation
    }

    /// Disarm if `generation` is the live timer; stale fires return false.
    pub(crate) fn fire(&mut self, generation: u64) -> bool {
        match self.coalescer {
            CoalescerState::TimerArmed { generation: live } if live == generation => {
                self.coalescer = CoalescerState::Idle;
                true
            }
            _ => false,
        }
    }
}
