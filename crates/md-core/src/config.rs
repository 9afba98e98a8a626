//! Editor tuning knobs, loadable from JSON.

use serde::{Deserialize, Serialize};

/// Editing session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Number of undo steps kept before the oldest snapshot is evicted.
    pub history_depth: usize,
    /// Offset applied on both axes to duplicated elements.
    pub duplicate_offset: f32,
    /// Box given to click-placed shapes and images.
    pub default_width: f32,
    pub default_height: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_depth: 50,
            duplicate_offset: 20.0,
            default_width: 100.0,
            default_height: 100.0,
        }
    }
}
