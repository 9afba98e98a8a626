pub mod config;
pub mod error;
pub mod id;
pub mod layer;
pub mod mockup;
pub mod model;
pub mod scene;

pub use config::EditorConfig;
pub use error::DocumentError;
pub use id::LayerId;
pub use layer::{BlendMode, DesignLayer, LayerContent, LayerStack, MAX_OFFSET, clamp_offset};
pub use mockup::{DesignArea, ExportMetadata, ProductCatalog, ProductImage, ProductVariant};
pub use model::*;
pub use scene::{CanvasSettings, DesignDocument, Dimensions, Scene};
