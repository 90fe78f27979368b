//! Tab sync engine: host I/O, favicon resolution and effect execution.
mod broadcast;
mod commands;
mod config;
mod engine;
mod favicon;
mod fetch;
mod host;
mod inline;
mod startup;
mod types;

pub use config::{default_tiers, ConfigError, SyncSettings, Tier, HOST_PLACEHOLDER};
pub use engine::SyncEngine;
pub use favicon::{CacheEntry, FaviconCache};
pub use fetch::{FetchSettings, IconFetcher, ReqwestIconFetcher};
pub use host::{MemoryHost, TabHost};
pub use inline::{is_data_url, sniff_image_mime, to_data_url};
pub use types::{CycleReport, FailureKind, FetchError, FetchOutput, HostError};
