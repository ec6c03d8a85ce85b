//! Quill configuration file handling
//!
//! Timing constants of the widgets can be overridden from a `quill.toml`:
//!
//! ```toml
//! [scroll]
//! settle_delay_ms = 200
//!
//! [button]
//! restore_delay_ms = 500
//!
//! [tooltip]
//! auto_hide_ms = 5000
//! width = "200px"
//! ```
//!
//! Every section and key is optional.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{QuillError, Result};

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct QuillConfig {
    #[serde(default)]
    pub scroll: ScrollSettings,
    #[serde(default)]
    pub button: ButtonSettings,
    #[serde(default)]
    pub tooltip: TooltipSettings,
}

/// Scroll container settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScrollSettings {
    /// Quiet interval before the focused item is re-evaluated
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
}

fn default_settle_delay_ms() -> u64 {
    200
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
        }
    }
}

impl ScrollSettings {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Button user-flow settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ButtonSettings {
    /// How long the outcome text stays before the label comes back
    #[serde(default = "default_restore_delay_ms")]
    pub restore_delay_ms: u64,
}

fn default_restore_delay_ms() -> u64 {
    500
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            restore_delay_ms: default_restore_delay_ms(),
        }
    }
}

impl ButtonSettings {
    pub fn restore_delay(&self) -> Duration {
        Duration::from_millis(self.restore_delay_ms)
    }
}

/// Tooltip settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TooltipSettings {
    /// Tooltip hides itself this long after the last `update`
    #[serde(default = "default_auto_hide_ms")]
    pub auto_hide_ms: u64,
    /// CSS width of the tooltip box
    #[serde(default = "default_tooltip_width")]
    pub width: String,
}

fn default_auto_hide_ms() -> u64 {
    5000
}

fn default_tooltip_width() -> String {
    "200px".to_string()
}

impl Default for TooltipSettings {
    fn default() -> Self {
        Self {
            auto_hide_ms: default_auto_hide_ms(),
            width: default_tooltip_width(),
        }
    }
}

impl TooltipSettings {
    pub fn auto_hide(&self) -> Duration {
        Duration::from_millis(self.auto_hide_ms)
    }
}

impl QuillConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| QuillError::Config(e.to_string()))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| QuillError::Config(e.to_string()))
    }
}
