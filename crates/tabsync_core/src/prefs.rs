//! Persisted panel preferences. Only the rendering layer acts on these.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Panel shifts page content aside.
    #[default]
    Push,
    /// Panel floats above page content.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMode {
    /// Inherit the global mode.
    #[default]
    Default,
    Push,
    Overlay,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SiteSetting {
    pub enabled: Option<bool>,
    pub mode: SiteMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub enabled: bool,
    pub mode: DisplayMode,
    pub site_settings: BTreeMap<String, SiteSetting>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: DisplayMode::Push,
            site_settings: BTreeMap::new(),
        }
    }
}

/// Resolved configuration for one site; `None` means the panel is disabled there.
pub type EffectiveSetting = Option<DisplayMode>;

impl Preferences {
    pub fn effective_for(&self, hostname: &str) -> EffectiveSetting {
        if !self.enabled {
            return None;
        }
        let site = self.site_settings.get(hostname);
        if site.and_then(|s| s.enabled) == Some(false) {
            return None;
        }
        let mode = match site.map(|s| s.mode).unwrap_or_default() {
            SiteMode::Default => self.mode,
            SiteMode::Push => DisplayMode::Push,
            SiteMode::Overlay => DisplayMode::Overlay,
        };
        Some(mode)
    }
}
