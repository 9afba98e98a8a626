//! The scene: an ordered list of elements plus canvas settings.
//!
//! Array index is both paint order and z-order; the last element is
//! topmost. Mutations never reorder unrelated elements; `remove` shifts
//! every later index down by one, so callers must re-resolve selections
//! after deleting.

use crate::error::DocumentError;
use crate::model::{Color, DesignElement, Point};
use serde::{Deserialize, Serialize};

/// Canvas surface configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasSettings {
    pub width: f32,
    pub height: f32,
    pub background_color: Color,
    pub grid_enabled: bool,
    pub snap_to_grid: bool,
    pub grid_size: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            background_color: Color::WHITE,
            grid_enabled: false,
            snap_to_grid: false,
            grid_size: 20.0,
        }
    }
}

impl CanvasSettings {
    /// Snap a raw pointer position to the grid when both the grid and
    /// snapping are enabled; otherwise return it unchanged.
    pub fn snap(&self, x: f32, y: f32) -> Point {
        if self.snap_to_grid && self.grid_enabled && self.grid_size > 0.0 {
            let g = self.grid_size;
            Point::new((x / g).round() * g, (y / g).round() * g)
        } else {
            Point::new(x, y)
        }
    }
}

/// The canonical editable design.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub elements: Vec<DesignElement>,
    #[serde(default)]
    pub settings: CanvasSettings,
}

impl Scene {
    #[must_use]
    pub fn new(settings: CanvasSettings) -> Self {
        Self {
            elements: Vec::new(),
            settings,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DesignElement> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut DesignElement> {
        self.elements.get_mut(index)
    }

    /// Append on top of the z-order. Returns the new element's index.
    pub fn add(&mut self, element: DesignElement) -> usize {
        self.elements.push(element);
        self.elements.len() - 1
    }

    /// Replace the element at `index` in place. Returns false if out of range.
    pub fn update(&mut self, index: usize, element: DesignElement) -> bool {
        match self.elements.get_mut(index) {
            Some(slot) => {
                *slot = element;
                true
            }
            None => false,
        }
    }

    /// Remove exactly one element; later indices shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<DesignElement> {
        (index < self.elements.len()).then(|| self.elements.remove(index))
    }

    /// Copy the element at `index`, shift it by `(offset, offset)`, and
    /// append it on top. Returns the copy's index.
    pub fn duplicate(&mut self, index: usize, offset: f32) -> Option<usize> {
        let copy = self.elements.get(index)?.translated(offset, offset);
        Some(self.add(copy))
    }

    pub fn clear(&mut self) {
        self.elements.clear();
    }

    pub fn snap(&self, x: f32, y: f32) -> Point {
        self.settings.snap(x, y)
    }

    /// Every image source referenced by the scene, in paint order, deduplicated.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for src in self.elements.iter().filter_map(DesignElement::image_source) {
            if !out.iter().any(|s| s == src) {
                out.push(src.to_string());
            }
        }
        out
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// Swap with the element above. Returns the new index if it moved.
    pub fn bring_forward(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.elements.len() {
            return None;
        }
        self.elements.swap(index, index + 1);
        Some(index + 1)
    }

    /// Swap with the element below. Returns the new index if it moved.
    pub fn send_backward(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.elements.len() {
            return None;
        }
        self.elements.swap(index, index - 1);
        Some(index - 1)
    }

    pub fn bring_to_front(&mut self, index: usize) -> Option<usize> {
        let last = self.elements.len().checked_sub(1)?;
        if index >= last {
            return None;
        }
        let el = self.elements.remove(index);
        self.elements.push(el);
        Some(last)
    }

    pub fn send_to_back(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.elements.len() {
            return None;
        }
        let el = self.elements.remove(index);
        self.elements.insert(0, el);
        Some(0)
    }

    // ─── Design document contract ────────────────────────────────────────

    pub fn from_document(doc: DesignDocument) -> Self {
        Self {
            elements: doc.elements,
            settings: CanvasSettings {
                width: doc.dimensions.width,
                height: doc.dimensions.height,
                background_color: doc.background_color,
                ..CanvasSettings::default()
            },
        }
    }

    pub fn to_document(&self, category: &str) -> DesignDocument {
        DesignDocument {
            elements: self.elements.clone(),
            dimensions: Dimensions {
                width: self.settings.width,
                height: self.settings.height,
            },
            background_color: self.settings.background_color,
            category: category.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

/// The shape exchanged with the hosting application's persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignDocument {
    #[serde(default)]
    pub elements: Vec<DesignElement>,
    #[serde(default)]
    pub dimensions: Dimensions,
    #[serde(default = "white")]
    pub background_color: Color,
    #[serde(default)]
    pub category: String,
}

fn white() -> Color {
    Color::WHITE
}

impl DesignDocument {
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
