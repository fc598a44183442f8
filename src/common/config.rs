use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;

/// Tunables for the docking manager. Everything has a sensible default, so
/// hosts without a config file never touch this type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DockSettings {
    /// Geometry for windows created without explicit bounds.
    #[serde(default = "default_window_bounds")]
    pub default_window_bounds: Rect,
    /// Quiet window for the coalesced layout-changed notification.
    #[serde(default = "default_update_quiet_ms")]
    pub update_quiet_ms: u64,
}

fn default_window_bounds() -> Rect { Rect::new(10.0, 10.0, 1200.0, 800.0) }

fn default_update_quiet_ms() -> u64 { 3000 }

impl Default for DockSettings {
    fn default() -> Self {
        DockSettings {
            default_window_bounds: default_window_bounds(),
            update_quiet_ms: default_update_quiet_ms(),
        }
    }
}

impl DockSettings {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("failed to parse dock settings")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&text)
    }
}
