pub mod error;
pub mod export;
pub mod hit;
pub mod mockup;
pub mod paint;
pub mod renderer;
pub mod text;
pub mod theme;

pub use error::RenderError;
pub use export::encode_png;
pub use hit::{
    LayerBox, hit_test, layer_hit_test, point_in_polygon, select_in_circle, select_in_freeform,
    select_in_rect,
};
pub use mockup::{MockupFrame, layer_origin};
pub use renderer::Renderer;
pub use text::FontBook;
pub use theme::CanvasTheme;
pub use tiny_skia::Pixmap;
