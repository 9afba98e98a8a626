//! The renderer: an injected image loader, a font book and a theme.

use crate::error::RenderError;
use crate::text::FontBook;
use crate::theme::CanvasTheme;
use md_assets::{ImageLoader, PendingImage};
use md_core::Scene;
use tiny_skia::Pixmap;

#[derive(Clone)]
pub struct Renderer {
    loader: ImageLoader,
    fonts: FontBook,
    theme: CanvasTheme,
}

impl Renderer {
    pub fn new(loader: ImageLoader) -> Self {
        Self {
            loader,
            fonts: FontBook::new(),
            theme: CanvasTheme::default(),
        }
    }

    pub fn with_fonts(mut self, fonts: FontBook) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn with_theme(mut self, theme: CanvasTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn loader(&self) -> &ImageLoader {
        &self.loader
    }

    pub fn fonts(&self) -> &FontBook {
        &self.fonts
    }

    pub fn theme(&self) -> &CanvasTheme {
        &self.theme
    }

    /// Load every image the scene references so the next paint can use
    /// them. Returns how many are available; failures are left to the
    /// placeholder path.
    pub async fn prepare(&self, scene: &Scene) -> usize {
        self.preload_all(scene.image_sources()).await
    }

    pub(crate) async fn preload_all(&self, urls: impl IntoIterator<Item = String>) -> usize {
        let pending: Vec<PendingImage> = urls
            .into_iter()
            .map(|url| self.loader.preload(&url, true))
            .collect();
        let mut ready = 0;
        for image in pending {
            if image.await.is_ok() {
                ready += 1;
            }
        }
        ready
    }

    /// Paint `scene` onto a fresh surface of its canvas size.
    pub fn render_scene(&self, scene: &Scene, selection: &[usize]) -> Result<Pixmap, RenderError> {
        let mut pixmap = new_surface(scene.settings.width, scene.settings.height)?;
        self.paint_scene(&mut pixmap, scene, selection);
        Ok(pixmap)
    }
}

pub(crate) fn new_surface(width: f32, height: f32) -> Result<Pixmap, RenderError> {
    let (w, h) = (width.round().max(0.0) as u32, height.round().max(0.0) as u32);
    Pixmap::new(w, h).ok_or(RenderError::Surface {
        width: w,
        height: h,
    })
}
