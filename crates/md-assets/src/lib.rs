pub mod error;
pub mod fetch;
pub mod lazy;
pub mod loader;
pub mod variant;

pub use error::LoadError;
pub use fetch::{FetchFuture, FileFetcher, ImageFetcher, MemoryFetcher};
pub use lazy::LazyLoader;
pub use loader::{ImageLoader, LoadResult, LoadedImage, LoaderConfig, PendingImage, decode_image};
pub use variant::{VariantPreload, preload_variant_images};

/// Solid-color PNG for unit tests.
#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
    bytes
}
