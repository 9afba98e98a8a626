use md_assets::{ImageLoader, MemoryFetcher};
use md_core::{CanvasSettings, DesignElement, ElementKind, Scene};
use md_render::{Renderer, encode_png};
use std::sync::Arc;

fn solid_png(rgba: [u8; 4]) -> Vec<u8> {
    let mut pixmap = tiny_skia::Pixmap::new(8, 8).unwrap();
    pixmap.fill(tiny_skia::Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3]));
    pixmap.encode_png().unwrap()
}

fn scene_with_image(src: &str) -> Scene {
    let mut scene = Scene::new(CanvasSettings {
        width: 64.0,
        height: 64.0,
        ..CanvasSettings::default()
    });
    scene.add(
        DesignElement::new(0.0, 0.0, ElementKind::Image { src: src.into() }).with_size(32.0, 32.0),
    );
    scene
}

#[tokio::test]
async fn prepared_images_are_painted() {
    let fetcher = MemoryFetcher::new().with("green.png", solid_png([0, 255, 0, 255]));
    let renderer = Renderer::new(ImageLoader::new(Arc::new(fetcher)));
    let scene = scene_with_image("green.png");

    assert_eq!(renderer.prepare(&scene).await, 1);
    let pixmap = renderer.render_scene(&scene, &[]).unwrap();
    let px = pixmap.pixel(16, 16).unwrap();
    assert_eq!((px.red(), px.green()), (0, 255));
    // Outside the image box the background shows through.
    assert_eq!(pixmap.pixel(48, 48).unwrap().red(), 255);
}

#[tokio::test]
async fn failed_images_fall_back_to_placeholder() {
    let renderer = Renderer::new(ImageLoader::new(Arc::new(MemoryFetcher::new())));
    let scene = scene_with_image("missing.png");

    assert_eq!(renderer.prepare(&scene).await, 0);
    let pixmap = renderer.render_scene(&scene, &[]).unwrap();
    let expected = renderer.theme().placeholder_color.to_rgba8();
    assert_eq!(pixmap.pixel(8, 20).unwrap().red(), expected[0]);

    let png = encode_png(&pixmap).unwrap();
    assert!(png.starts_with(b"\x89PNG"));
}
