//! Text rasterization via `ab_glyph`.
//!
//! A [`FontBook`] holds at most one face, used for every font family.
//! Without a face, text is drawn as a translucent bar of the measured
//! size so layouts stay readable.

use crate::error::RenderError;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont, point};
use md_core::Color;
use std::path::Path;
use tiny_skia::{Paint, Pixmap, PremultipliedColorU8, Rect, Transform};

/// Width of one character, as a fraction of the font size, when no face is loaded.
const FALLBACK_ADVANCE: f32 = 0.6;
const FALLBACK_LINE: f32 = 1.2;

#[derive(Clone, Default)]
pub struct FontBook {
    font: Option<FontArc>,
}

impl FontBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RenderError> {
        let font = FontArc::try_from_vec(bytes).map_err(|e| RenderError::Font(e.to_string()))?;
        Ok(Self { font: Some(font) })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).map_err(|e| RenderError::Font(format!("{}: {e}", path.display())))?;
        Self::from_bytes(bytes)
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Advance width and line height of a single line of `text`.
    pub fn measure(&self, text: &str, size: f32) -> (f32, f32) {
        let Some(font) = &self.font else {
            return (
                text.chars().count() as f32 * size * FALLBACK_ADVANCE,
                size * FALLBACK_LINE,
            );
        };
        let scaled = font.as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                width += scaled.kern(p, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        (width, scaled.ascent() - scaled.descent())
    }

    /// Rasterize one line into a tightly sized pixmap. `None` for empty
    /// text or a non-positive size.
    pub fn rasterize(&self, text: &str, size: f32, color: Color) -> Option<Pixmap> {
        if text.is_empty() || size <= 0.0 {
            return None;
        }
        let (w, h) = self.measure(text, size);
        let mut pixmap = Pixmap::new(w.ceil().max(1.0) as u32, h.ceil().max(1.0) as u32)?;

        let Some(font) = &self.font else {
            let bar = Rect::from_xywh(0.0, h * 0.2, w, h * 0.6)?;
            let mut paint = Paint::default();
            paint.set_color(crate::paint::skia_color(color.with_opacity(0.35)));
            pixmap.fill_rect(bar, &paint, Transform::identity(), None);
            return Some(pixmap);
        };

        let scaled = font.as_scaled(PxScale::from(size));
        let ascent = scaled.ascent();
        let [r, g, b, a] = color.to_rgba8();
        let stride = pixmap.width() as i32;
        let rows = pixmap.height() as i32;
        let pixels = pixmap.pixels_mut();

        let mut pen = 0.0;
        let mut prev = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(p) = prev {
                pen += scaled.kern(p, id);
            }
            let glyph = id.with_scale_and_position(scaled.scale(), point(pen, ascent));
            pen += scaled.h_advance(id);
            prev = Some(id);

            let Some(outlined) = font.outline_glyph(glyph) else {
                continue;
            };
            let origin = outlined.px_bounds().min;
            outlined.draw(|gx, gy, coverage| {
                let x = origin.x as i32 + gx as i32;
                let y = origin.y as i32 + gy as i32;
                if x < 0 || y < 0 || x >= stride || y >= rows {
                    return;
                }
                let alpha = (coverage.clamp(0.0, 1.0) * a as f32) as u32;
                let slot = &mut pixels[(y * stride + x) as usize];
                if alpha as u8 <= slot.alpha() {
                    return;
                }
                let pm = |c: u8| ((c as u32 * alpha + 127) / 255) as u8;
                if let Some(px) =
                    PremultipliedColorU8::from_rgba(pm(r), pm(g), pm(b), alpha as u8)
                {
                    *slot = px;
                }
            });
        }
        Some(pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_measure_scales_with_length() {
        let fonts = FontBook::new();
        let (w, h) = fonts.measure("abcd", 10.0);
        assert!((w - 24.0).abs() < 1e-3);
        assert!((h - 12.0).abs() < 1e-3);
    }

    #[test]
    fn fallback_draws_translucent_bar() {
        let fonts = FontBook::new();
        let pixmap = fonts.rasterize("Hello", 20.0, Color::BLACK).unwrap();
        assert!((60..=61).contains(&pixmap.width()));
        // Top rows stay clear, the middle band is painted.
        assert_eq!(pixmap.pixel(5, 0).unwrap().alpha(), 0);
        assert!(pixmap.pixel(5, 12).unwrap().alpha() > 0);
    }

    #[test]
    fn empty_text_produces_nothing() {
        assert!(FontBook::new().rasterize("", 20.0, Color::BLACK).is_none());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        assert!(matches!(
            FontBook::from_bytes(vec![0, 1, 2, 3]),
            Err(RenderError::Font(_))
        ));
    }
}
