use md_assets::{FetchFuture, ImageFetcher, ImageLoader, LoadError};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn png(rgba: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(4, 4, image::Rgba(rgba));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png,
        )
        .unwrap();
    bytes
}

/// Serves a PNG for every url after a short delay, except urls listed as
/// failing. Tracks total fetch calls and the peak number running at once.
#[derive(Default)]
struct CountingFetcher {
    calls: Mutex<HashMap<String, usize>>,
    running: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    failing: Mutex<Vec<String>>,
}

impl CountingFetcher {
    fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn fail(&self, url: &str) {
        self.failing.lock().unwrap().push(url.to_string());
    }

    fn heal(&self, url: &str) {
        self.failing.lock().unwrap().retain(|u| u != url);
    }
}

impl ImageFetcher for CountingFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        let fails = self.failing.lock().unwrap().iter().any(|u| u == url);
        let running = Arc::clone(&self.running);
        let peak = Arc::clone(&self.peak);
        let url = url.to_string();
        Box::pin(async move {
            let now = running.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            running.fetch_sub(1, Ordering::SeqCst);
            if fails {
                Err(LoadError::Fetch {
                    url,
                    message: "boom".into(),
                })
            } else {
                Ok(png([0, 128, 255, 255]))
            }
        })
    }
}

#[tokio::test]
async fn concurrent_preloads_share_one_fetch() {
    let fetcher = Arc::new(CountingFetcher::default());
    let loader = ImageLoader::new(fetcher.clone());

    let a = loader.preload("x.png", false);
    let b = loader.preload("x.png", false);
    let (a, b) = tokio::join!(a, b);

    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(fetcher.calls("x.png"), 1);
    assert_eq!(a.width(), 4);
}

#[tokio::test]
async fn never_more_than_three_in_flight() {
    let fetcher = Arc::new(CountingFetcher::default());
    let loader = ImageLoader::new(fetcher.clone());

    let pending: Vec<_> = (0..10)
        .map(|i| loader.preload(&format!("img-{i}.png"), false))
        .collect();
    assert_eq!(loader.active_loads(), 3);
    assert_eq!(loader.queued(), 7);

    for p in pending {
        p.await.unwrap();
    }
    assert!(fetcher.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(fetcher.total_calls(), 10);
    assert_eq!(loader.cached_count(), 10);
    assert_eq!(loader.active_loads(), 0);
    assert_eq!(loader.queued(), 0);
}

#[tokio::test]
async fn failures_are_not_cached_and_queue_keeps_draining() {
    let fetcher = Arc::new(CountingFetcher::default());
    fetcher.fail("bad.png");
    let loader = ImageLoader::new(fetcher.clone());

    let bad = loader.preload("bad.png", false);
    let rest: Vec<_> = (0..4)
        .map(|i| loader.preload(&format!("ok-{i}.png"), false))
        .collect();

    let err = bad.await.unwrap_err();
    assert_eq!(err.url(), "bad.png");
    for p in rest {
        p.await.unwrap();
    }
    assert!(!loader.is_cached("bad.png"));
    assert!(!loader.is_loading("bad.png"));

    fetcher.heal("bad.png");
    loader.preload("bad.png", false).await.unwrap();
    assert_eq!(fetcher.calls("bad.png"), 2);
}

#[tokio::test]
async fn priority_loads_skip_the_queue() {
    let fetcher = Arc::new(CountingFetcher::default());
    let loader = ImageLoader::new(fetcher.clone());

    let background: Vec<_> = (0..5)
        .map(|i| loader.preload(&format!("bg-{i}.png"), false))
        .collect();
    let urgent = loader.preload("hero.png", true);
    assert_eq!(loader.active_loads(), 4);
    assert_eq!(loader.queued(), 2);

    urgent.await.unwrap();
    for p in background {
        p.await.unwrap();
    }
    assert_eq!(loader.cached_count(), 6);
}
