//! Product mockup painting.
//!
//! The cached product photo is the base; design layers are painted over
//! it in ascending `z_index`. Each visible layer is positioned at
//! `(area.x + global.x + offset.x) * width` (likewise for y), then rotated,
//! scaled and blended, with its content centered on that point.

use crate::hit::LayerBox;
use crate::paint::{dashed_outline, skia_color, skia_transform};
use crate::renderer::{Renderer, new_surface};
use kurbo::Affine;
use md_assets::LoadedImage;
use md_core::{BlendMode, DesignArea, DesignLayer, LayerContent, LayerId, LayerStack, Point};
use std::sync::Arc;
use tiny_skia::{FilterQuality, PathBuilder, Pixmap, PixmapPaint, Transform};

/// Everything needed to paint one mockup view.
#[derive(Debug, Clone, Copy)]
pub struct MockupFrame<'a> {
    /// Product photo for the current angle.
    pub base: Option<&'a str>,
    pub design_area: DesignArea,
    /// Shared offset applied to every layer, as a fraction of canvas size.
    pub global_offset: Point,
    pub layers: &'a LayerStack,
    /// Layer to outline, typically the active one while dragging is enabled.
    pub outline: Option<LayerId>,
}

impl MockupFrame<'_> {
    /// Base photo plus every image the layers reference.
    pub fn image_sources(&self) -> Vec<String> {
        let mut out: Vec<String> = self.base.map(str::to_string).into_iter().collect();
        for layer in self.layers.layers() {
            let sources = match &layer.content {
                LayerContent::Image { src } => vec![src.clone()],
                LayerContent::Design { scene } => scene.image_sources(),
                LayerContent::Text { .. } => Vec::new(),
            };
            for src in sources {
                if !out.contains(&src) {
                    out.push(src);
                }
            }
        }
        out
    }
}

/// Canvas-pixel anchor of a layer.
pub fn layer_origin(
    area: &DesignArea,
    global: Point,
    offset: Point,
    width: f32,
    height: f32,
) -> Point {
    Point::new(
        (area.x + global.x + offset.x) * width,
        (area.y + global.y + offset.y) * height,
    )
}

enum Sprite {
    Owned(Pixmap),
    Shared(Arc<LoadedImage>),
}

impl Sprite {
    fn pixmap(&self) -> &Pixmap {
        match self {
            Sprite::Owned(p) => p,
            Sprite::Shared(img) => &img.pixmap,
        }
    }
}

fn fit(w: f32, h: f32, into_w: f32, into_h: f32) -> f32 {
    if w <= 0.0 || h <= 0.0 {
        return 1.0;
    }
    (into_w / w).min(into_h / h)
}

fn skia_blend(mode: BlendMode) -> tiny_skia::BlendMode {
    use tiny_skia::BlendMode as Sk;
    match mode {
        BlendMode::Normal => Sk::SourceOver,
        BlendMode::Multiply => Sk::Multiply,
        BlendMode::Screen => Sk::Screen,
        BlendMode::Overlay => Sk::Overlay,
        BlendMode::Darken => Sk::Darken,
        BlendMode::Lighten => Sk::Lighten,
        BlendMode::ColorDodge => Sk::ColorDodge,
        BlendMode::ColorBurn => Sk::ColorBurn,
        BlendMode::HardLight => Sk::HardLight,
        BlendMode::SoftLight => Sk::SoftLight,
        BlendMode::Difference => Sk::Difference,
        BlendMode::Exclusion => Sk::Exclusion,
    }
}

impl Renderer {
    /// Load the base photo and layer images for `frame`.
    pub async fn prepare_mockup(&self, frame: &MockupFrame<'_>) -> usize {
        self.preload_all(frame.image_sources()).await
    }

    /// Unfitted content size and the factor that fits it into the design area.
    fn content_extent(&self, content: &LayerContent, area_w: f32, area_h: f32) -> (f32, f32, f32) {
        match content {
            LayerContent::Text {
                text, font_size, ..
            } => {
                let (w, h) = self.fonts().measure(text, *font_size);
                (w, h, 1.0)
            }
            LayerContent::Image { src } => match self.loader().get(src) {
                Some(img) => {
                    let (w, h) = (img.width() as f32, img.height() as f32);
                    (w, h, fit(w, h, area_w, area_h))
                }
                None => (area_w, area_h, 1.0),
            },
            LayerContent::Design { scene } => {
                let (w, h) = (scene.settings.width, scene.settings.height);
                (w, h, fit(w, h, area_w, area_h))
            }
        }
    }

    /// Canvas-space box of `layer` on a `width × height` mockup.
    pub fn layer_box(
        &self,
        frame: &MockupFrame<'_>,
        layer: &DesignLayer,
        width: f32,
        height: f32,
    ) -> LayerBox {
        let area = &frame.design_area;
        let (w, h, k) =
            self.content_extent(&layer.content, area.width * width, area.height * height);
        LayerBox {
            center: layer_origin(area, frame.global_offset, layer.offset, width, height),
            width: w * k,
            height: h * k,
            rotation: layer.rotation,
            scale: layer.scale,
        }
    }

    fn layer_sprite(
        &self,
        content: &LayerContent,
        area_w: f32,
        area_h: f32,
    ) -> Option<(Sprite, f32)> {
        match content {
            LayerContent::Text {
                text,
                font_size,
                color,
                ..
            } => self
                .fonts()
                .rasterize(text, *font_size, *color)
                .map(|p| (Sprite::Owned(p), 1.0)),
            LayerContent::Image { src } => match self.loader().get(src) {
                Some(img) => {
                    let k = fit(img.width() as f32, img.height() as f32, area_w, area_h);
                    Some((Sprite::Shared(img), k))
                }
                None => {
                    let mut p = new_surface(area_w, area_h).ok()?;
                    p.fill(skia_color(self.theme().placeholder_color));
                    Some((Sprite::Owned(p), 1.0))
                }
            },
            LayerContent::Design { scene } => {
                let mut p = new_surface(scene.settings.width, scene.settings.height).ok()?;
                self.paint_elements(&mut p, scene);
                let k = fit(p.width() as f32, p.height() as f32, area_w, area_h);
                Some((Sprite::Owned(p), k))
            }
        }
    }

    pub fn paint_mockup(&self, pixmap: &mut Pixmap, frame: &MockupFrame<'_>) {
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        let area = &frame.design_area;

        match frame.base.and_then(|url| self.loader().get(url)) {
            Some(base) => {
                pixmap.fill(tiny_skia::Color::WHITE);
                let (bw, bh) = (base.width() as f32, base.height() as f32);
                let k = fit(bw, bh, w, h);
                let t = Transform::from_translate((w - bw * k) / 2.0, (h - bh * k) / 2.0)
                    .pre_scale(k, k);
                let paint = PixmapPaint {
                    quality: FilterQuality::Bilinear,
                    ..PixmapPaint::default()
                };
                pixmap.draw_pixmap(0, 0, base.pixmap.as_ref(), &paint, t, None);
            }
            None => {
                pixmap.fill(skia_color(self.theme().placeholder_color));
                let rect = tiny_skia::Rect::from_xywh(
                    area.x * w,
                    area.y * h,
                    area.width * w,
                    area.height * h,
                );
                if let Some(rect) = rect {
                    let outline = PathBuilder::from_rect(rect);
                    let color = self.theme().grid_color;
                    dashed_outline(pixmap, &outline, color, Transform::identity());
                }
            }
        }

        for layer in frame.layers.sorted() {
            if !layer.is_painted() {
                continue;
            }
            let sprite = self.layer_sprite(&layer.content, area.width * w, area.height * h);
            let Some((sprite, k)) = sprite else {
                continue;
            };
            let sp = sprite.pixmap();
            let (sw, sh) = (sp.width() as f64, sp.height() as f64);
            let placed = LayerBox {
                center: layer_origin(area, frame.global_offset, layer.offset, w, h),
                width: sw as f32 * k,
                height: sh as f32 * k,
                rotation: layer.rotation,
                scale: layer.scale,
            };
            let t = placed.transform()
                * Affine::scale(k as f64)
                * Affine::translate((-sw / 2.0, -sh / 2.0));
            let paint = PixmapPaint {
                opacity: layer.opacity,
                blend_mode: skia_blend(layer.blend_mode),
                quality: FilterQuality::Bilinear,
            };
            pixmap.draw_pixmap(0, 0, sp.as_ref(), &paint, skia_transform(t), None);
        }

        if let Some(id) = frame.outline
            && let Some(layer) = frame.layers.get(id)
        {
            let corners = self.layer_box(frame, layer, w, h).corners();
            let mut pb = PathBuilder::new();
            pb.move_to(corners[0].x, corners[0].y);
            for c in &corners[1..] {
                pb.line_to(c.x, c.y);
            }
            pb.close();
            if let Some(path) = pb.finish() {
                dashed_outline(pixmap, &path, self.theme().selection_color, Transform::identity());
            }
        }
    }

    pub fn render_mockup(
        &self,
        frame: &MockupFrame<'_>,
        width: u32,
        height: u32,
    ) -> Result<Pixmap, crate::RenderError> {
        let mut pixmap = new_surface(width as f32, height as f32)?;
        self.paint_mockup(&mut pixmap, frame);
        Ok(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use md_assets::{ImageLoader, MemoryFetcher};
    use md_core::{Color, MAX_OFFSET};
    use pretty_assertions::assert_eq;

    fn renderer() -> Renderer {
        Renderer::new(ImageLoader::new(Arc::new(MemoryFetcher::new())))
    }

    fn text_layer(stack: &mut LayerStack) -> LayerId {
        stack.add(
            "caption",
            LayerContent::Text {
                text: "HELLO".into(),
                font_family: "Arial".into(),
                font_size: 20.0,
                color: Color::BLACK,
            },
        )
    }

    #[test]
    fn origin_combines_area_global_and_layer_offset() {
        let area = DesignArea {
            x: 0.3,
            y: 0.25,
            width: 0.4,
            height: 0.4,
        };
        let global = Point::new(0.2, 0.2);
        let p = layer_origin(&area, global, Point::new(-0.1, MAX_OFFSET), 1000.0, 1000.0);
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 750.0).abs() < 1e-3);
    }

    fn frame(stack: &LayerStack) -> MockupFrame<'_> {
        MockupFrame {
            base: None,
            design_area: DesignArea::default(),
            global_offset: Point::new(0.2, 0.2),
            layers: stack,
            outline: None,
        }
    }

    #[test]
    fn layer_box_follows_offset() {
        let r = renderer();
        let mut stack = LayerStack::new();
        let id = text_layer(&mut stack);
        stack.set_offset(id, 0.1, 0.0);
        let b = r.layer_box(&frame(&stack), stack.get(id).unwrap(), 500.0, 500.0);
        assert!((b.center.x - 300.0).abs() < 1e-3);
        assert!((b.center.y - 225.0).abs() < 1e-3);
        let (w, _) = r.fonts().measure("HELLO", 20.0);
        assert!((b.width - w).abs() < 1e-3);
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let r = renderer();
        let mut stack = LayerStack::new();
        let id = text_layer(&mut stack);
        let shown = r.render_mockup(&frame(&stack), 200, 200).unwrap();

        stack.toggle_visibility(id);
        let hidden = r.render_mockup(&frame(&stack), 200, 200).unwrap();
        // The layer is anchored at (100, 90).
        let blank = hidden.pixel(100, 90).unwrap();
        assert_ne!(shown.pixel(100, 90).unwrap(), blank);
        assert_eq!(blank.red(), r.theme().placeholder_color.to_rgba8()[0]);
    }

    #[test]
    fn image_sources_include_base_and_layers() {
        let mut stack = LayerStack::new();
        stack.add("photo", LayerContent::Image { src: "logo.png".into() });
        stack.add("again", LayerContent::Image { src: "logo.png".into() });
        let frame = MockupFrame {
            base: Some("tee/front.png"),
            design_area: DesignArea::default(),
            global_offset: Point::default(),
            layers: &stack,
            outline: None,
        };
        assert_eq!(frame.image_sources(), vec!["tee/front.png", "logo.png"]);
    }
}
