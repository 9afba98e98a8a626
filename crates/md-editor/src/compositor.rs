//! Mockup layer compositor.
//!
//! Owns the design layers placed on one product photo, which layer is
//! active, and the drag state. A pointer-down inside a layer's
//! transformed box starts a drag; moves rewrite the layer's offset
//! (clamped to ±0.3 of the canvas); pointer-up commits the whole drag as
//! one undo step. Escape reverts to the offset the drag started from.

use crate::history::History;
use crate::input::InputEvent;
use crate::shortcuts::{Focus, ShortcutAction, ShortcutContext, ShortcutMap};
use md_assets::{VariantPreload, preload_variant_images};
use md_core::{
    BlendMode, DesignArea, DesignLayer, DocumentError, EditorConfig, ExportMetadata, LayerContent,
    LayerId, LayerStack, Point, ProductCatalog, ProductVariant, Scene, clamp_offset,
};
use md_render::{MockupFrame, RenderError, Renderer, encode_png, layer_hit_test};
use tiny_skia::Pixmap;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq)]
pub enum MockupEvent {
    /// Snapshot of the layers after a committed change.
    LayersChanged(LayerStack),
    Exported(ExportMetadata),
}

#[derive(Debug, Clone, Copy)]
struct LayerDrag {
    id: LayerId,
    /// Pointer position at drag start, canvas pixels.
    anchor: Point,
    start_offset: Point,
}

/// Global offset that puts a layer with zero offset at the design area center.
fn centered(area: &DesignArea) -> Point {
    Point::new(area.width / 2.0, area.height / 2.0)
}

pub struct MockupCompositor {
    renderer: Renderer,
    catalog: ProductCatalog,
    product: String,
    color: String,
    angle: String,
    layers: LayerStack,
    history: History<LayerStack>,
    active: Option<LayerId>,
    drag_enabled: bool,
    drag: Option<LayerDrag>,
    global_offset: Point,
    width: u32,
    height: u32,
    focus: Focus,
    subscribers: Vec<mpsc::UnboundedSender<MockupEvent>>,
}

impl MockupCompositor {
    pub fn new(
        renderer: Renderer,
        catalog: ProductCatalog,
        product: &str,
        color: &str,
        config: &EditorConfig,
        width: u32,
        height: u32,
    ) -> Result<Self, DocumentError> {
        let variant = catalog.require_variant(product, color)?;
        let angle = variant.angles().next().unwrap_or("front").to_string();
        let global_offset = centered(&variant.design_area);
        Ok(Self {
            renderer,
            product: product.to_string(),
            color: color.to_string(),
            angle,
            catalog,
            layers: LayerStack::new(),
            history: History::new(config.history_depth),
            active: None,
            drag_enabled: true,
            drag: None,
            global_offset,
            width,
            height,
            focus: Focus::Canvas,
            subscribers: Vec::new(),
        })
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn active(&self) -> Option<LayerId> {
        self.active
    }

    pub fn active_layer(&self) -> Option<&DesignLayer> {
        self.layers.get(self.active?)
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn angle(&self) -> &str {
        &self.angle
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn global_offset(&self) -> Point {
        self.global_offset
    }

    pub fn set_global_offset(&mut self, offset: Point) {
        self.global_offset = offset;
    }

    pub fn history(&self) -> &History<LayerStack> {
        &self.history
    }

    pub fn set_focus(&mut self, focus: Focus) {
        self.focus = focus;
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<MockupEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: MockupEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn layers_changed(&mut self) {
        self.emit(MockupEvent::LayersChanged(self.layers.clone()));
    }

    // ─── Product selection ───────────────────────────────────────────────

    pub fn variant(&self) -> Option<&ProductVariant> {
        self.catalog.variant(&self.product, &self.color)
    }

    pub fn design_area(&self) -> DesignArea {
        self.variant().map(|v| v.design_area).unwrap_or_default()
    }

    /// Product photo for the current angle.
    pub fn base_image(&self) -> Option<&str> {
        self.variant()?
            .image_for_angle(&self.angle)
            .map(|img| img.src.as_str())
    }

    /// Switch product and color. Unknown combinations are refused.
    pub fn set_variant(&mut self, product: &str, color: &str) -> bool {
        let Some(variant) = self.catalog.variant(product, color) else {
            log::debug!("no variant {product}/{color}");
            return false;
        };
        let has_angle = variant
            .image_for_angle(&self.angle)
            .is_some_and(|img| img.angle == self.angle);
        if !has_angle {
            self.angle = variant.angles().next().unwrap_or("front").to_string();
        }
        self.global_offset = centered(&variant.design_area);
        self.product = product.to_string();
        self.color = color.to_string();
        true
    }

    pub fn set_angle(&mut self, angle: &str) -> bool {
        let known = self.variant().is_some_and(|v| v.angles().any(|a| a == angle));
        if known {
            self.angle = angle.to_string();
        }
        known
    }

    /// Start loading the current variant's photos at priority and the
    /// sibling colors in the background. Must run inside a Tokio runtime.
    pub fn preload_variants(&self) -> VariantPreload {
        preload_variant_images(self.renderer.loader(), &self.catalog, &self.product, &self.color)
    }

    // ─── Layer editing ───────────────────────────────────────────────────

    /// Place `scene` on the mockup: the first design layer receives it,
    /// or a new one is created.
    pub fn attach_design(&mut self, scene: Scene) -> LayerId {
        let existing = self
            .layers
            .layers()
            .iter()
            .find(|l| matches!(l.content, LayerContent::Design { .. }))
            .map(|l| l.id);
        match existing {
            Some(id) => {
                self.edit_layer(id, |layer| layer.content = LayerContent::Design { scene });
                id
            }
            None => self.add_layer("Design", LayerContent::Design { scene }),
        }
    }

    /// Add a layer on top and make it active.
    pub fn add_layer(&mut self, name: impl Into<String>, content: LayerContent) -> LayerId {
        self.end_drag();
        self.history.save(&self.layers);
        let id = self.layers.add(name, content);
        self.active = Some(id);
        self.layers_changed();
        id
    }

    /// Remove a layer; the last one is kept.
    pub fn remove_layer(&mut self, id: LayerId) -> bool {
        if self.layers.get(id).is_none() || self.layers.len() <= 1 {
            return false;
        }
        self.end_drag();
        self.history.save(&self.layers);
        self.layers.remove(id);
        if self.active == Some(id) {
            self.active = self.layers.top().map(|l| l.id);
        }
        self.layers_changed();
        true
    }

    pub fn duplicate_layer(&mut self, id: LayerId) -> Option<LayerId> {
        self.layers.get(id)?;
        self.end_drag();
        self.history.save(&self.layers);
        let copy = self.layers.duplicate(id)?;
        self.active = Some(copy);
        self.layers_changed();
        Some(copy)
    }

    /// Move the layer at paint position `from` to `to`.
    pub fn move_layer(&mut self, from: usize, to: usize) -> bool {
        let len = self.layers.len();
        if from >= len || to >= len || from == to {
            return false;
        }
        self.end_drag();
        self.history.save(&self.layers);
        self.layers.move_layer(from, to);
        self.layers_changed();
        true
    }

    pub fn set_opacity(&mut self, id: LayerId, opacity: f32) -> bool {
        self.edit_layer(id, |l| l.opacity = opacity.clamp(0.0, 1.0))
    }

    pub fn set_blend_mode(&mut self, id: LayerId, mode: BlendMode) -> bool {
        self.edit_layer(id, |l| l.blend_mode = mode)
    }

    pub fn set_rotation(&mut self, id: LayerId, degrees: f32) -> bool {
        self.edit_layer(id, |l| l.rotation = degrees)
    }

    pub fn set_scale(&mut self, id: LayerId, scale: f32) -> bool {
        self.edit_layer(id, |l| l.scale = scale.max(0.0))
    }

    pub fn set_offset(&mut self, id: LayerId, x: f32, y: f32) -> bool {
        self.edit_layer(id, |l| l.offset = clamp_offset(x, y))
    }

    pub fn toggle_visibility(&mut self, id: LayerId) -> bool {
        self.edit_layer(id, |l| l.visible = !l.visible)
    }

    pub fn set_active(&mut self, id: LayerId) -> bool {
        if self.layers.get(id).is_none() {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Apply `edit` to one layer, recording an undo step if it changed anything.
    fn edit_layer(&mut self, id: LayerId, edit: impl FnOnce(&mut DesignLayer)) -> bool {
        self.end_drag();
        let before = self.layers.clone();
        let Some(layer) = self.layers.get_mut(id) else {
            return false;
        };
        edit(layer);
        if self.layers == before {
            return false;
        }
        self.history.save(&before);
        self.layers_changed();
        true
    }

    pub fn undo(&mut self) -> bool {
        self.cancel_drag();
        match self.history.undo(&self.layers) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_drag();
        match self.history.redo(&self.layers) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, layers: LayerStack) {
        self.layers = layers;
        if self.active.is_none_or(|id| self.layers.get(id).is_none()) {
            self.active = self.layers.top().map(|l| l.id);
        }
        self.layers_changed();
    }

    // ─── Dragging ────────────────────────────────────────────────────────

    /// Enable or disable layer dragging (Ctrl/Cmd+D). Returns the new state.
    pub fn toggle_drag_mode(&mut self) -> bool {
        self.drag_enabled = !self.drag_enabled;
        if !self.drag_enabled {
            self.end_drag();
        }
        log::debug!("layer drag mode {}", if self.drag_enabled { "on" } else { "off" });
        self.drag_enabled
    }

    /// Topmost painted layer whose transformed box contains `at`.
    pub fn layer_at(&self, at: Point) -> Option<LayerId> {
        let frame = self.frame(false);
        let (w, h) = (self.width as f32, self.height as f32);
        self.layers
            .sorted()
            .into_iter()
            .rev()
            .filter(|l| l.is_painted())
            .find(|l| layer_hit_test(&self.renderer.layer_box(&frame, l, w, h), at.x, at.y))
            .map(|l| l.id)
    }

    fn hits_layer(&self, id: LayerId, at: Point) -> bool {
        let frame = self.frame(false);
        let (w, h) = (self.width as f32, self.height as f32);
        self.layers.get(id).is_some_and(|l| {
            l.is_painted() && layer_hit_test(&self.renderer.layer_box(&frame, l, w, h), at.x, at.y)
        })
    }

    /// Begin dragging the active layer, or the topmost layer under the
    /// pointer, if `at` is inside it.
    pub fn begin_drag(&mut self, at: Point) -> bool {
        if !self.drag_enabled {
            return false;
        }
        self.end_drag();
        let target = match self.active {
            Some(id) if self.hits_layer(id, at) => Some(id),
            _ => self.layer_at(at),
        };
        let Some(id) = target else {
            return false;
        };
        let Some(start_offset) = self.layers.get(id).map(|l| l.offset) else {
            return false;
        };
        self.active = Some(id);
        self.history.begin_batch(&self.layers);
        self.drag = Some(LayerDrag {
            id,
            anchor: at,
            start_offset,
        });
        true
    }

    /// Recompute the dragged layer's offset from the pointer delta.
    pub fn drag_to(&mut self, at: Point) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        let (w, h) = (self.width.max(1) as f32, self.height.max(1) as f32);
        let raw_x = drag.start_offset.x + (at.x - drag.anchor.x) / w;
        let raw_y = drag.start_offset.y + (at.y - drag.anchor.y) / h;
        self.layers.set_offset(drag.id, raw_x, raw_y).is_some()
    }

    /// Finish the drag, committing it as one undo step if the layer moved.
    pub fn end_drag(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        if self.history.end_batch(&self.layers) {
            self.layers_changed();
        }
        true
    }

    /// Abort the drag and put the layer back where it started.
    pub fn cancel_drag(&mut self) -> bool {
        if self.drag.take().is_none() {
            return false;
        }
        if let Some(before) = self.history.cancel_batch() {
            self.layers = before;
        }
        true
    }

    /// Handle one input event. Returns whether a redraw is needed.
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.begin_drag(Point::new(*x, *y)),
            InputEvent::PointerMove { x, y, .. } => self.drag_to(Point::new(*x, *y)),
            InputEvent::PointerUp { .. } => self.end_drag(),
            InputEvent::Key { key, modifiers } => {
                let action =
                    ShortcutMap::resolve(key, *modifiers, self.focus, ShortcutContext::Mockup);
                match action {
                    Some(ShortcutAction::Cancel) => self.cancel_drag(),
                    Some(ShortcutAction::ToggleDragMode) => {
                        self.toggle_drag_mode();
                        true
                    }
                    Some(ShortcutAction::Undo) => self.undo(),
                    Some(ShortcutAction::Redo) => self.redo(),
                    Some(ShortcutAction::Delete) => match self.active {
                        Some(id) => self.remove_layer(id),
                        None => false,
                    },
                    _ => false,
                }
            }
        }
    }

    // ─── Output ──────────────────────────────────────────────────────────

    pub fn frame(&self, outline_active: bool) -> MockupFrame<'_> {
        MockupFrame {
            base: self.base_image(),
            design_area: self.design_area(),
            global_offset: self.global_offset,
            layers: &self.layers,
            outline: if outline_active { self.active } else { None },
        }
    }

    /// Load the photo and layer images, then paint the current view. The
    /// active layer is outlined while dragging is enabled.
    pub async fn render(&self) -> Result<Pixmap, RenderError> {
        self.render_frame(self.drag_enabled).await
    }

    async fn render_frame(&self, outline_active: bool) -> Result<Pixmap, RenderError> {
        let frame = self.frame(outline_active);
        self.renderer.prepare_mockup(&frame).await;
        self.renderer.render_mockup(&frame, self.width, self.height)
    }

    /// Render without affordances and encode as PNG.
    pub async fn export(&mut self) -> Result<(Vec<u8>, ExportMetadata), RenderError> {
        let pixmap = self.render_frame(false).await?;
        let png = encode_png(&pixmap)?;
        let metadata = ExportMetadata::now(&self.product, &self.color, &self.angle);
        log::debug!(
            "exported {}/{}/{} ({} bytes)",
            metadata.product_type,
            metadata.color,
            metadata.angle,
            png.len()
        );
        self.emit(MockupEvent::Exported(metadata.clone()));
        Ok((png, metadata))
    }
}
