use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::errors::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "pagecraft.config.json";

/// Editor session configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Number of undo snapshots kept per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Debounce window for preview regeneration
    #[serde(default = "default_preview_debounce_ms")]
    pub preview_debounce_ms: u64,

    /// Autosave period; 0 disables autosave
    #[serde(default = "default_autosave_interval_ms")]
    pub autosave_interval_ms: u64,

    /// Buffer size of the session event channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_history_limit() -> usize {
    crate::history::DEFAULT_MAX_LENGTH
}

fn default_preview_debounce_ms() -> u64 {
    500
}

fn default_autosave_interval_ms() -> u64 {
    30_000
}

fn default_event_capacity() -> usize {
    64
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when the file
    /// does not exist
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, EditorError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(EditorConfig::default())
        }
    }

    pub fn from_json(json: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn preview_debounce(&self) -> Duration {
        Duration::from_millis(self.preview_debounce_ms)
    }

    /// `None` when autosave is disabled
    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_interval_ms > 0).then(|| Duration::from_millis(self.autosave_interval_ms))
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            preview_debounce_ms: default_preview_debounce_ms(),
            autosave_interval_ms: default_autosave_interval_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}
