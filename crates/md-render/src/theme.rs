//! Colors and sizes for editor affordances drawn over the scene.

use md_core::Color;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasTheme {
    pub selection_color: Color,
    pub handle_color: Color,
    /// Side length of a resize handle, in canvas pixels.
    pub handle_size: f32,
    pub grid_color: Color,
    /// Fill for images that are missing or failed to load.
    pub placeholder_color: Color,
}

impl CanvasTheme {
    pub fn light() -> Self {
        Self {
            selection_color: Color::rgba(0.23, 0.51, 0.96, 1.0),
            handle_color: Color::WHITE,
            handle_size: 8.0,
            grid_color: Color::rgba(0.0, 0.0, 0.0, 0.08),
            placeholder_color: Color::rgba(0.9, 0.9, 0.92, 1.0),
        }
    }
}

impl Default for CanvasTheme {
    fn default() -> Self {
        Self::light()
    }
}
