//! Design layers composited onto a product mockup.
//!
//! A `LayerStack` keeps its layers in paint order and renumbers `z_index`
//! to the contiguous range 1..=N after every structural change, so the
//! stored order and the z values never disagree.

use crate::id::LayerId;
use crate::model::{Color, Point};
use crate::scene::Scene;
use serde::{Deserialize, Serialize};

/// Offsets are fractions of the canvas size, limited to ±0.3 per axis.
pub const MAX_OFFSET: f32 = 0.3;

/// Clamp a raw fractional offset into the allowed drag range.
pub fn clamp_offset(x: f32, y: f32) -> Point {
    Point::new(
        x.clamp(-MAX_OFFSET, MAX_OFFSET),
        y.clamp(-MAX_OFFSET, MAX_OFFSET),
    )
}

/// How a layer's pixels combine with what is already painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
}

impl BlendMode {
    pub const ALL: [BlendMode; 12] = [
        BlendMode::Normal,
        BlendMode::Multiply,
        BlendMode::Screen,
        BlendMode::Overlay,
        BlendMode::Darken,
        BlendMode::Lighten,
        BlendMode::ColorDodge,
        BlendMode::ColorBurn,
        BlendMode::HardLight,
        BlendMode::SoftLight,
        BlendMode::Difference,
        BlendMode::Exclusion,
    ];
}

/// What a layer paints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerContent {
    #[serde(rename_all = "camelCase")]
    Text {
        text: String,
        font_family: String,
        font_size: f32,
        color: Color,
    },
    Image {
        src: String,
    },
    /// A whole editor scene, fitted to the design area.
    Design {
        scene: Scene,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignLayer {
    pub id: LayerId,
    pub name: String,
    pub content: LayerContent,
    pub visible: bool,
    /// 0.0 ..= 1.0
    pub opacity: f32,
    /// Fraction of canvas size, each axis within ±[`MAX_OFFSET`].
    pub offset: Point,
    pub scale: f32,
    /// Degrees.
    pub rotation: f32,
    pub blend_mode: BlendMode,
    pub z_index: u32,
}

impl DesignLayer {
    pub fn new(name: impl Into<String>, content: LayerContent) -> Self {
        Self {
            id: LayerId::fresh(),
            name: name.into(),
            content,
            visible: true,
            opacity: 1.0,
            offset: Point::default(),
            scale: 1.0,
            rotation: 0.0,
            blend_mode: BlendMode::Normal,
            z_index: 0,
        }
    }

    /// Whether the compositor should paint this layer at all.
    pub fn is_painted(&self) -> bool {
        self.visible && self.opacity > 0.0
    }
}

/// Ordered set of layers for one mockup.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayerStack {
    layers: Vec<DesignLayer>,
}

impl LayerStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in paint order (bottom first).
    pub fn layers(&self) -> &[DesignLayer] {
        &self.layers
    }

    /// Layers sorted by ascending `z_index`.
    pub fn sorted(&self) -> Vec<&DesignLayer> {
        let mut out: Vec<&DesignLayer> = self.layers.iter().collect();
        out.sort_by_key(|l| l.z_index);
        out
    }

    pub fn position(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|l| l.id == id)
    }

    pub fn get(&self, id: LayerId) -> Option<&DesignLayer> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut DesignLayer> {
        self.layers.iter_mut().find(|l| l.id == id)
    }

    pub fn top(&self) -> Option<&DesignLayer> {
        self.layers.last()
    }

    /// Push a layer on top. Returns its id.
    pub fn push(&mut self, layer: DesignLayer) -> LayerId {
        let id = layer.id;
        self.layers.push(layer);
        self.normalize_z();
        id
    }

    pub fn add(&mut self, name: impl Into<String>, content: LayerContent) -> LayerId {
        self.push(DesignLayer::new(name, content))
    }

    /// Remove a layer. The last remaining layer cannot be removed.
    pub fn remove(&mut self, id: LayerId) -> bool {
        if self.layers.len() <= 1 {
            log::debug!("refusing to remove the only layer {id}");
            return false;
        }
        let Some(pos) = self.position(id) else {
            return false;
        };
        self.layers.remove(pos);
        self.normalize_z();
        true
    }

    /// Copy a layer directly above its source with a fresh id.
    pub fn duplicate(&mut self, id: LayerId) -> Option<LayerId> {
        let pos = self.position(id)?;
        let mut copy = self.layers[pos].clone();
        copy.id = LayerId::fresh();
        copy.name = format!("{} copy", copy.name);
        let new_id = copy.id;
        self.layers.insert(pos + 1, copy);
        self.normalize_z();
        Some(new_id)
    }

    /// Move the layer at paint position `from` to position `to`.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        if from >= self.layers.len() || to >= self.layers.len() {
            return false;
        }
        if from != to {
            let layer = self.layers.remove(from);
            self.layers.insert(to, layer);
        }
        self.normalize_z();
        true
    }

    /// Set a layer's offset, clamped to ±[`MAX_OFFSET`]. Returns the stored value.
    pub fn set_offset(&mut self, id: LayerId, x: f32, y: f32) -> Option<Point> {
        let layer = self.get_mut(id)?;
        layer.offset = clamp_offset(x, y);
        Some(layer.offset)
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) -> bool {
        match self.get_mut(id) {
            Some(layer) => {
                layer.opacity = opacity.clamp(0.0, 1.0);
                true
            }
            None => false,
        }
    }

    pub fn toggle_visibility(&mut self, id: LayerId) -> Option<bool> {
        let layer = self.get_mut(id)?;
        layer.visible = !layer.visible;
        Some(layer.visible)
    }

    /// Renumber `z_index` to 1..=N following paint order.
    pub fn normalize_z(&mut self) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.z_index = i as u32 + 1;
        }
    }
}
