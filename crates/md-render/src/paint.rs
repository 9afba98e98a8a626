//! Scene → tiny-skia drawing commands.
//!
//! Clears to the canvas background, draws the grid, paints elements in
//! array order and finishes with selection affordances on top.

use crate::renderer::Renderer;
use kurbo::{Affine, PathEl, Shape};
use md_core::{
    Bounds, CanvasSettings, Color, DEFAULT_HEIGHT, DEFAULT_WIDTH, DesignElement, ElementKind, Scene,
    TextAlign,
};
use tiny_skia::{
    FillRule, FilterQuality, LineCap, LineJoin, Paint, Path, PathBuilder, Pixmap, PixmapPaint,
    PixmapRef, Rect, Stroke, StrokeDash, Transform,
};

impl Renderer {
    /// Paint the entire scene onto `pixmap`.
    ///
    /// Call once per change; nothing is retained between frames.
    pub fn paint_scene(&self, pixmap: &mut Pixmap, scene: &Scene, selection: &[usize]) {
        pixmap.fill(skia_color(scene.settings.background_color));
        if scene.settings.grid_enabled {
            self.paint_grid(pixmap, &scene.settings);
        }
        self.paint_elements(pixmap, scene);
        for &index in selection {
            if let Some(el) = scene.get(index) {
                self.paint_selection(pixmap, el);
            }
        }
    }

    /// Elements only, over whatever the pixmap already holds.
    pub(crate) fn paint_elements(&self, pixmap: &mut Pixmap, scene: &Scene) {
        for el in &scene.elements {
            self.paint_element(pixmap, el);
        }
    }

    fn paint_grid(&self, pixmap: &mut Pixmap, settings: &CanvasSettings) {
        let g = settings.grid_size;
        if g <= 0.0 {
            return;
        }
        let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
        let mut pb = PathBuilder::new();
        let mut x = g;
        while x < w {
            pb.move_to(x, 0.0);
            pb.line_to(x, h);
            x += g;
        }
        let mut y = g;
        while y < h {
            pb.move_to(0.0, y);
            pb.line_to(w, y);
            y += g;
        }
        if let Some(path) = pb.finish() {
            stroke_path(pixmap, &path, self.theme().grid_color, 1.0, Transform::identity());
        }
    }

    fn paint_element(&self, pixmap: &mut Pixmap, el: &DesignElement) {
        let b = el.bounds();
        let transform = element_transform(el);

        match &el.kind {
            ElementKind::Rectangle {
                fill,
                stroke,
                stroke_width,
            } => {
                if let Some(rect) = Rect::from_xywh(b.x, b.y, b.width, b.height) {
                    let path = PathBuilder::from_rect(rect);
                    fill_and_stroke(pixmap, &path, *fill, *stroke, *stroke_width, transform);
                }
            }
            ElementKind::Circle {
                fill,
                stroke,
                stroke_width,
            } => {
                let ellipse = kurbo::Ellipse::from_rect(kurbo_rect(b));
                if let Some(path) = skia_path(&ellipse) {
                    fill_and_stroke(pixmap, &path, *fill, *stroke, *stroke_width, transform);
                }
            }
            ElementKind::Line {
                x2,
                y2,
                stroke,
                stroke_width,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(el.x, el.y);
                pb.line_to(*x2, *y2);
                if let Some(path) = pb.finish() {
                    stroke_path(pixmap, &path, *stroke, *stroke_width, transform);
                }
            }
            ElementKind::Path {
                points,
                stroke,
                stroke_width,
            } => {
                let [first, rest @ ..] = points.as_slice() else {
                    return;
                };
                if rest.is_empty() {
                    return;
                }
                let mut pb = PathBuilder::new();
                pb.move_to(el.x + first.x, el.y + first.y);
                for p in rest {
                    pb.line_to(el.x + p.x, el.y + p.y);
                }
                if let Some(path) = pb.finish() {
                    stroke_path(pixmap, &path, *stroke, *stroke_width, transform);
                }
            }
            ElementKind::Text {
                text,
                font_size,
                fill,
                align,
                ..
            } => {
                let Some(glyphs) = self.fonts().rasterize(text, *font_size, *fill) else {
                    return;
                };
                let gw = glyphs.width() as f32;
                let box_w = el.width.unwrap_or(gw);
                let dx = match align {
                    TextAlign::Left => 0.0,
                    TextAlign::Center => (box_w - gw) / 2.0,
                    TextAlign::Right => box_w - gw,
                };
                let at = Bounds::new(el.x + dx, el.y, gw, glyphs.height() as f32);
                draw_image(pixmap, glyphs.as_ref(), at, transform);
            }
            ElementKind::Image { src } => match self.loader().get(src) {
                Some(img) => {
                    let at = Bounds::new(
                        el.x,
                        el.y,
                        el.width.unwrap_or(img.width() as f32),
                        el.height.unwrap_or(img.height() as f32),
                    );
                    draw_image(pixmap, img.pixmap.as_ref(), at, transform);
                }
                None => {
                    let at = Bounds::new(
                        el.x,
                        el.y,
                        el.width.unwrap_or(DEFAULT_WIDTH),
                        el.height.unwrap_or(DEFAULT_HEIGHT),
                    );
                    self.paint_placeholder(pixmap, at, transform);
                }
            },
            ElementKind::Sticker {
                content,
                font_size,
                style,
            } => {
                let color = style.as_ref().and_then(|s| s.color).unwrap_or(Color::BLACK);
                let glyphs = self.fonts().rasterize(content, *font_size, color);
                let (gw, gh) = glyphs
                    .as_ref()
                    .map(|g| (g.width() as f32, g.height() as f32))
                    .unwrap_or_default();
                let pad = font_size * 0.25;
                let badge = Bounds::new(
                    el.x,
                    el.y,
                    el.width.unwrap_or(gw + pad * 2.0),
                    el.height.unwrap_or(gh + pad * 2.0),
                );

                if let Some(background) = style.as_ref().and_then(|s| s.background) {
                    let radius = style.as_ref().and_then(|s| s.border_radius).unwrap_or(0.0);
                    let shape = kurbo::RoundedRect::from_rect(kurbo_rect(badge), radius as f64);
                    if let Some(path) = skia_path(&shape) {
                        fill_and_stroke(pixmap, &path, background, None, 0.0, transform);
                    }
                }
                if let Some(glyphs) = glyphs {
                    let at = Bounds::new(
                        badge.x + (badge.width - gw) / 2.0,
                        badge.y + (badge.height - gh) / 2.0,
                        gw,
                        gh,
                    );
                    draw_image(pixmap, glyphs.as_ref(), at, transform);
                }
            }
        }
    }

    /// Procedural stand-in for an image that is missing or failed to load.
    pub(crate) fn paint_placeholder(&self, pixmap: &mut Pixmap, at: Bounds, transform: Transform) {
        let Some(rect) = Rect::from_xywh(at.x, at.y, at.width, at.height) else {
            return;
        };
        let fill = self.theme().placeholder_color;
        fill_and_stroke(pixmap, &PathBuilder::from_rect(rect), fill, None, 0.0, transform);

        let mut pb = PathBuilder::new();
        pb.move_to(rect.left(), rect.top());
        pb.line_to(rect.right(), rect.bottom());
        pb.move_to(rect.right(), rect.top());
        pb.line_to(rect.left(), rect.bottom());
        if let Some(cross) = pb.finish() {
            stroke_path(pixmap, &cross, Color::BLACK.with_opacity(0.15), 1.0, transform);
        }
    }

    /// Dashed bounding box plus corner and edge handles.
    fn paint_selection(&self, pixmap: &mut Pixmap, el: &DesignElement) {
        let b = el.bounds();
        let transform = element_transform(el);
        let theme = self.theme();
        let Some(rect) = Rect::from_xywh(b.x, b.y, b.width, b.height) else {
            return;
        };
        dashed_outline(pixmap, &PathBuilder::from_rect(rect), theme.selection_color, transform);

        let s = theme.handle_size;
        let (l, c, r) = (b.x, b.x + b.width / 2.0, b.x + b.width);
        let (t, m, bt) = (b.y, b.y + b.height / 2.0, b.y + b.height);
        let handles = [(l, t), (c, t), (r, t), (r, m), (r, bt), (c, bt), (l, bt), (l, m)];
        for (hx, hy) in handles {
            if let Some(handle) = Rect::from_xywh(hx - s / 2.0, hy - s / 2.0, s, s) {
                fill_and_stroke(
                    pixmap,
                    &PathBuilder::from_rect(handle),
                    theme.handle_color,
                    Some(theme.selection_color),
                    1.0,
                    transform,
                );
            }
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────

pub(crate) fn skia_color(c: Color) -> tiny_skia::Color {
    let [r, g, b, a] = c.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

pub(crate) fn skia_transform(a: Affine) -> Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs().map(|v| v as f32);
    Transform::from_row(sx, ky, kx, sy, tx, ty)
}

fn kurbo_rect(b: Bounds) -> kurbo::Rect {
    kurbo::Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

/// Flatten a kurbo shape into a tiny-skia path.
pub(crate) fn skia_path(shape: &impl Shape) -> Option<Path> {
    let mut pb = PathBuilder::new();
    for el in shape.path_elements(0.1) {
        match el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(a, b) => pb.quad_to(a.x as f32, a.y as f32, b.x as f32, b.y as f32),
            PathEl::CurveTo(a, b, c) => pb.cubic_to(
                a.x as f32, a.y as f32, b.x as f32, b.y as f32, c.x as f32, c.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

/// Rotation about the element's box center, if any.
fn element_transform(el: &DesignElement) -> Transform {
    match el.rotation {
        Some(deg) if deg != 0.0 => {
            let c = el.center();
            Transform::from_rotate_at(deg, c.x, c.y)
        }
        _ => Transform::identity(),
    }
}

fn solid(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(skia_color(color));
    paint.anti_alias = true;
    paint
}

fn fill_and_stroke(
    pixmap: &mut Pixmap,
    path: &Path,
    fill: Color,
    stroke: Option<Color>,
    stroke_width: f32,
    transform: Transform,
) {
    if fill.a > 0.0 {
        pixmap.fill_path(path, &solid(fill), FillRule::Winding, transform, None);
    }
    if let Some(stroke) = stroke
        && stroke_width > 0.0
    {
        stroke_path(pixmap, path, stroke, stroke_width, transform);
    }
}

fn stroke_path(pixmap: &mut Pixmap, path: &Path, color: Color, width: f32, transform: Transform) {
    let stroke = Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &solid(color), &stroke, transform, None);
}

pub(crate) fn dashed_outline(pixmap: &mut Pixmap, path: &Path, color: Color, transform: Transform) {
    let stroke = Stroke {
        width: 1.5,
        dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
        ..Stroke::default()
    };
    pixmap.stroke_path(path, &solid(color), &stroke, transform, None);
}

/// Draw `image` stretched to fill `at`.
pub(crate) fn draw_image(pixmap: &mut Pixmap, image: PixmapRef, at: Bounds, transform: Transform) {
    let (iw, ih) = (image.width() as f32, image.height() as f32);
    if iw == 0.0 || ih == 0.0 || at.width <= 0.0 || at.height <= 0.0 {
        return;
    }
    let t = transform
        .pre_translate(at.x, at.y)
        .pre_scale(at.width / iw, at.height / ih);
    let paint = PixmapPaint {
        quality: FilterQuality::Bilinear,
        ..PixmapPaint::default()
    };
    pixmap.draw_pixmap(0, 0, image, &paint, t, None);
}
