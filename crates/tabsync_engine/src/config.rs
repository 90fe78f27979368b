use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabsync_core::Timing;
use thiserror::Error;

use crate::fetch::FetchSettings;

/// Placeholder replaced with the origin's hostname in lookup-service templates.
pub const HOST_PLACEHOLDER: &str = "{host}";

/// One ranked favicon source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Well-known path on the origin itself.
    DirectPath { path: String, min_bytes: usize },
    /// Third-party icon service keyed by hostname. Bodies under `min_bytes`
    /// are the service's generic placeholder.
    LookupService { template: String, min_bytes: usize },
}

impl Tier {
    pub fn min_bytes(&self) -> usize {
        match self {
            Tier::DirectPath { min_bytes, .. } | Tier::LookupService { min_bytes, .. } => {
                *min_bytes
            }
        }
    }

    /// Request URL for `origin`/`hostname`.
    pub fn url_for(&self, origin: &str, hostname: &str) -> String {
        match self {
            Tier::DirectPath { path, .. } => {
                format!("{}/{}", origin.trim_end_matches('/'), path.trim_start_matches('/'))
            }
            Tier::LookupService { template, .. } => template.replace(HOST_PLACEHOLDER, hostname),
        }
    }
}

pub fn default_tiers() -> Vec<Tier> {
    vec![
        Tier::DirectPath {
            path: "/favicon.ico".to_string(),
            min_bytes: 10,
        },
        Tier::LookupService {
            template: "https://www.google.com/s2/favicons?domain={host}&sz=32".to_string(),
            min_bytes: 100,
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    pub debounce_ms: u64,
    pub follow_up_ms: Vec<u64>,
    pub startup_resync_ms: u64,
    pub fetch: FetchSettings,
    pub tiers: Vec<Tier>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            follow_up_ms: vec![1_000, 3_500],
            startup_resync_ms: 2_000,
            fetch: FetchSettings::default(),
            tiers: default_tiers(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl SyncSettings {
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&text)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            debounce: Duration::from_millis(self.debounce_ms),
            follow_ups: self
                .follow_up_ms
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }

    pub fn startup_resync(&self) -> Duration {
        Duration::from_millis(self.startup_resync_ms)
    }
}
