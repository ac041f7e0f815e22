//! Engine configuration.
//!
//! Loadable from TOML; every field has a default, so an empty file is a
//! valid configuration.
//!
//! ```toml
//! history_limit = 200
//! busy_policy = "reject"
//! insertion_strategy = "nearest-center"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;
use utsushi_surface::InsertionStrategy;

/// What to do with an action for a surface that is still applying another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BusyPolicy {
    /// Wait for the surface.
    #[default]
    Queue,
    /// Fail with `SurfaceBusy`.
    Reject,
}

/// Errors loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Undo stack cap; the oldest entries are dropped.
    pub history_limit: usize,

    /// Per surface-call timeout.
    pub surface_timeout_ms: u64,

    pub busy_policy: BusyPolicy,

    /// How long a writer waits for a path lock.
    pub write_lock_timeout_ms: u64,

    /// Pointer travel before a drag moves anything.
    pub min_drag_distance: f64,

    pub insertion_strategy: InsertionStrategy,

    /// Tag for new group containers and inserted elements.
    pub default_container_tag: String,

    /// Parent style keys copied onto a new group container.
    pub layout_properties: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: 100,
            surface_timeout_ms: 5_000,
            busy_policy: BusyPolicy::Queue,
            write_lock_timeout_ms: 10_000,
            min_drag_distance: 5.0,
            insertion_strategy: InsertionStrategy::EdgeScan,
            default_container_tag: "div".to_string(),
            layout_properties: [
                "display",
                "flex-direction",
                "justify-content",
                "align-items",
                "gap",
                "grid-template-columns",
                "grid-template-rows",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_surface_timeout(mut self, timeout: Duration) -> Self {
        self.surface_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_busy_policy(mut self, policy: BusyPolicy) -> Self {
        self.busy_policy = policy;
        self
    }

    pub fn with_write_lock_timeout(mut self, timeout: Duration) -> Self {
        self.write_lock_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_min_drag_distance(mut self, distance: f64) -> Self {
        self.min_drag_distance = distance;
        self
    }

    pub fn with_insertion_strategy(mut self, strategy: InsertionStrategy) -> Self {
        self.insertion_strategy = strategy;
        self
    }

    pub fn with_default_container_tag(mut self, tag: impl Into<String>) -> Self {
        self.default_container_tag = tag.into();
        self
    }

    pub fn with_layout_properties<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layout_properties = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn surface_timeout(&self) -> Duration {
        Duration::from_millis(self.surface_timeout_ms)
    }

    pub fn write_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.write_lock_timeout_ms)
    }
}
