//! JSON-lines wire format of the driver.
use serde::{Deserialize, Serialize};
use tabsync_core::{ChangeInfo, ObserverCommand, ObserverReply, PushMessage, TabId, WorkItem};

/// One input line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptLine {
    /// Mutate the in-memory host and raise the matching host event.
    Host(HostOp),
    /// Hand a command to the engine as if an observer had sent it.
    Observer(ObserverCommand),
    /// Let timers run for this many milliseconds.
    WaitMs(u64),
    /// Run the start-up sequence against whatever the host holds now.
    Startup,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum HostOp {
    Open {
        item: WorkItem,
    },
    Remove {
        id: TabId,
    },
    Update {
        id: TabId,
        #[serde(default)]
        change: ChangeInfo,
    },
    Activate {
        id: TabId,
    },
    Move {
        id: TabId,
        index: usize,
    },
}

/// One output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OutputLine {
    Push { to: TabId, message: PushMessage },
    Reply { reply: ObserverReply },
}

pub fn parse_line(line: &str) -> Result<ScriptLine, serde_json::Error> {
    serde_json::from_str(line)
}
