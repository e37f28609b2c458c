// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON. Missing fields fall back to their defaults.

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// How recalculation passes are executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecalculationMode {
    /// The whole pass runs inside the call that triggered it
    #[default]
    Immediate,
    /// Passes are queued and advanced by `NodeEditor::step`
    Transitioning,
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version
    pub version: u32,
    /// Recalculation mode
    pub recalculation: RecalculationMode,
    /// Node calculations per `step` while transitioning
    pub steps_per_tick: usize,
    /// Whether saved copies leave node input/output views empty
    pub compress_saved_copies: bool,
    /// Name of the editor state preferred after loading
    pub main_state_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            recalculation: RecalculationMode::Immediate,
            steps_per_tick: 1,
            compress_saved_copies: true,
            main_state_name: "MainEditorState".to_string(),
        }
    }
}

impl EditorConfig {
    /// Parse from RON
    pub fn from_ron(s: &str) -> Result<Self> {
        let config: EditorConfig = ron::from_str(s)?;
        if config.version > CONFIG_FORMAT_VERSION {
            return Err(GraphError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        Ok(config)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.recalculation, RecalculationMode::Immediate);
        assert_eq!(config.steps_per_tick, 1);
        assert!(config.compress_saved_copies);
    }

    #[test]
    fn test_serialization() {
        let config = EditorConfig {
            recalculation: RecalculationMode::Transitioning,
            steps_per_tick: 3,
            ..EditorConfig::default()
        };
        let ron_str = config.to_ron().unwrap();
        let loaded = EditorConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let loaded = EditorConfig::from_ron("(steps_per_tick: 4)").unwrap();
        assert_eq!(loaded.steps_per_tick, 4);
        assert_eq!(loaded.main_state_name, "MainEditorState");
    }

    #[test]
    fn test_newer_version_rejected() {
        let err = EditorConfig::from_ron("(version: 99)").unwrap_err();
        assert!(matches!(err, GraphError::UnsupportedVersion { found: 99, .. }));
    }
}
