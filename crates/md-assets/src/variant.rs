//! Bulk preloading for a product/color selection.

use crate::loader::{ImageLoader, PendingImage};
use md_core::ProductCatalog;

/// Loads started for a variant: the selected color's angles first, then
/// every sibling color of the same product queued in the background.
pub struct VariantPreload {
    pub current: Vec<PendingImage>,
    pub background: Vec<PendingImage>,
}

impl VariantPreload {
    pub fn len(&self) -> usize {
        self.current.len() + self.background.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn preload_variant_images(
    loader: &ImageLoader,
    catalog: &ProductCatalog,
    product: &str,
    color: &str,
) -> VariantPreload {
    let mut out = VariantPreload {
        current: Vec::new(),
        background: Vec::new(),
    };
    let Some(colors) = catalog.products.get(product) else {
        log::debug!("no catalog entry for product {product}");
        return out;
    };

    if let Some(variant) = colors.get(color) {
        out.current = variant
            .images
            .iter()
            .map(|img| loader.preload(&img.src, true))
            .collect();
    }
    for (name, variant) in colors {
        if name == color {
            continue;
        }
        out.background
            .extend(variant.images.iter().map(|img| loader.preload(&img.src, false)));
    }
    log::debug!(
        "preloading {product}/{color}: {} current, {} background",
        out.current.len(),
        out.background.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MemoryFetcher;
    use crate::test_png;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    const CATALOG: &str = r#"{
        "mug": {
            "red": { "name": "Mug", "images": [
                { "angle": "front", "label": "Front", "src": "mug/red/front.png" },
                { "angle": "side", "label": "Side", "src": "mug/red/side.png" }
            ] },
            "blue": { "name": "Mug", "images": [
                { "angle": "front", "label": "Front", "src": "mug/blue/front.png" }
            ] }
        }
    }"#;

    #[tokio::test]
    async fn current_color_first_then_siblings() {
        let png = test_png(2, 2, [200, 0, 0, 255]);
        let fetcher = MemoryFetcher::new()
            .with("mug/red/front.png", png.clone())
            .with("mug/red/side.png", png.clone())
            .with("mug/blue/front.png", png);
        let loader = ImageLoader::new(Arc::new(fetcher));
        let catalog = ProductCatalog::from_json(CATALOG).unwrap();

        let preload = preload_variant_images(&loader, &catalog, "mug", "red");
        assert_eq!(preload.current.len(), 2);
        assert_eq!(preload.background.len(), 1);

        for pending in preload.current.into_iter().chain(preload.background) {
            pending.await.unwrap();
        }
        assert_eq!(loader.cached_count(), 3);
    }

    #[tokio::test]
    async fn unknown_product_preloads_nothing() {
        let loader = ImageLoader::new(Arc::new(MemoryFetcher::new()));
        let catalog = ProductCatalog::from_json(CATALOG).unwrap();
        assert!(preload_variant_images(&loader, &catalog, "hat", "red").is_empty());
    }
}
