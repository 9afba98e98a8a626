//! Image resource cache and concurrency-bounded loader.
//!
//! - At most one fetch per URL: callers arriving while a load is in flight
//!   join it and receive the same `Arc<LoadedImage>`.
//! - Non-priority requests wait in a FIFO queue and are dispatched only
//!   while fewer than `max_concurrent_loads` fetches are active.
//! - Priority requests start immediately and count against the limit.
//! - Failures reject every waiter but are never cached; the next
//!   `preload` of that URL retries from scratch.
//!
//! Cached images live for the lifetime of the loader (no eviction).
//! All bookkeeping happens under one short, synchronous lock; fetching
//! and decoding run on spawned Tokio tasks, so `preload` must be called
//! from within a Tokio runtime.

use crate::error::LoadError;
use crate::fetch::ImageFetcher;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tiny_skia::{IntSize, Pixmap};
use tokio::sync::oneshot;

pub type LoadResult = Result<Arc<LoadedImage>, LoadError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoaderConfig {
    pub max_concurrent_loads: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent_loads: 3,
        }
    }
}

/// A decoded image, premultiplied RGBA ready for painting.
#[derive(Debug)]
pub struct LoadedImage {
    pub url: String,
    pub pixmap: Pixmap,
}

impl LoadedImage {
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }
}

/// Decode PNG/JPEG bytes into a premultiplied pixmap.
pub fn decode_image(url: &str, bytes: &[u8]) -> Result<LoadedImage, LoadError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| LoadError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut data = rgba.into_raw();
    for px in data.chunks_exact_mut(4) {
        let a = px[3] as u32;
        for c in &mut px[..3] {
            *c = ((*c as u32 * a + 127) / 255) as u8;
        }
    }
    let pixmap = IntSize::from_wh(w, h)
        .and_then(|size| Pixmap::from_vec(data, size))
        .ok_or_else(|| LoadError::Decode {
            url: url.to_string(),
            message: format!("unsupported dimensions {w}x{h}"),
        })?;
    Ok(LoadedImage {
        url: url.to_string(),
        pixmap,
    })
}

struct InFlight {
    waiters: Vec<oneshot::Sender<LoadResult>>,
    /// False while the URL is still sitting in the FIFO queue.
    dispatched: bool,
}

#[derive(Default)]
struct LoaderState {
    cache: HashMap<String, Arc<LoadedImage>>,
    in_flight: HashMap<String, InFlight>,
    queue: VecDeque<String>,
    active: usize,
}

struct Shared {
    state: Mutex<LoaderState>,
    fetcher: Arc<dyn ImageFetcher>,
    config: LoaderConfig,
}

/// Handle to a shared image cache. Cloning is cheap; all clones see the
/// same cache, queue, and in-flight set.
#[derive(Clone)]
pub struct ImageLoader {
    shared: Arc<Shared>,
}

impl ImageLoader {
    pub fn new(fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self::with_config(fetcher, LoaderConfig::default())
    }

    pub fn with_config(fetcher: Arc<dyn ImageFetcher>, config: LoaderConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LoaderState::default()),
                fetcher,
                config,
            }),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    fn state(&self) -> MutexGuard<'_, LoaderState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Request `url`. Registration is eager: the returned future does not
    /// need to be polled for deduplication or queueing to take effect.
    pub fn preload(&self, url: &str, priority: bool) -> PendingImage {
        let mut guard = self.state();
        let state = &mut *guard;

        if let Some(img) = state.cache.get(url) {
            return PendingImage::ready(url, Ok(Arc::clone(img)));
        }

        let (tx, rx) = oneshot::channel();

        if let Some(flight) = state.in_flight.get_mut(url) {
            flight.waiters.push(tx);
            if priority && !flight.dispatched {
                log::debug!("promoting queued image {url}");
                state.queue.retain(|queued| queued != url);
                self.start(state, url.to_string());
            }
            return PendingImage::waiting(url, rx);
        }

        state.in_flight.insert(
            url.to_string(),
            InFlight {
                waiters: vec![tx],
                dispatched: false,
            },
        );

        if priority || state.active < self.shared.config.max_concurrent_loads {
            self.start(state, url.to_string());
        } else {
            log::debug!("queueing image {url} ({} active)", state.active);
            state.queue.push_back(url.to_string());
        }
        PendingImage::waiting(url, rx)
    }

    /// Cached handle for `url`, if a load has already succeeded.
    pub fn get(&self, url: &str) -> Option<Arc<LoadedImage>> {
        self.state().cache.get(url).cloned()
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.state().cache.contains_key(url)
    }

    pub fn is_loading(&self, url: &str) -> bool {
        self.state().in_flight.contains_key(url)
    }

    pub fn active_loads(&self) -> usize {
        self.state().active
    }

    pub fn queued(&self) -> usize {
        self.state().queue.len()
    }

    pub fn cached_count(&self) -> usize {
        self.state().cache.len()
    }

    fn start(&self, state: &mut LoaderState, url: String) {
        if let Some(flight) = state.in_flight.get_mut(&url) {
            flight.dispatched = true;
        }
        state.active += 1;
        log::debug!("fetching image {url} ({} active)", state.active);

        let fetcher = Arc::clone(&self.shared.fetcher);
        let flight = FlightGuard {
            loader: self.clone(),
            url: Some(url),
        };
        tokio::spawn(async move {
            let url = flight.url().to_string();
            let result = match fetcher.fetch(&url).await {
                Ok(bytes) => {
                    let decode_url = url.clone();
                    tokio::task::spawn_blocking(move || decode_image(&decode_url, &bytes))
                        .await
                        .unwrap_or_else(|e| {
                            Err(LoadError::Decode {
                                url: url.clone(),
                                message: e.to_string(),
                            })
                        })
                        .map(Arc::new)
                }
                Err(err) => Err(err),
            };
            flight.settle(result);
        });
    }

    fn finish(&self, url: &str, result: LoadResult) {
        self.settle(url, result, true);
    }

    /// Record the outcome of a dispatched load and wake its waiters. Queued
    /// work is only dispatched when `pump` is set.
    fn settle(&self, url: &str, result: LoadResult, pump: bool) {
        let waiters = {
            let mut state = self.state();
            state.active = state.active.saturating_sub(1);
            match &result {
                Ok(img) => {
                    state.cache.insert(url.to_string(), Arc::clone(img));
                }
                Err(err) => log::warn!("image load failed: {err}"),
            }
            let waiters = state
                .in_flight
                .remove(url)
                .map(|flight| flight.waiters)
                .unwrap_or_default();
            if pump {
                self.pump(&mut state);
            }
            waiters
        };

        for waiter in waiters {
            // A dropped receiver means the caller no longer cares.
            let _ = waiter.send(result.clone());
        }
    }

    /// Dispatch queued requests while under the concurrency limit.
    fn pump(&self, state: &mut LoaderState) {
        while state.active < self.shared.config.max_concurrent_loads {
            let Some(next) = state.queue.pop_front() else {
                break;
            };
            let waiting = state
                .in_flight
                .get(&next)
                .is_some_and(|flight| !flight.dispatched);
            if waiting {
                self.start(state, next);
            }
        }
    }
}

/// Settles a dispatched load exactly once. If the task unwinds before a
/// result is produced, waiters receive `Cancelled` and the slot is freed.
struct FlightGuard {
    loader: ImageLoader,
    url: Option<String>,
}

impl FlightGuard {
    fn url(&self) -> &str {
        self.url.as_deref().unwrap_or_default()
    }

    fn settle(mut self, result: LoadResult) {
        if let Some(url) = self.url.take() {
            self.loader.finish(&url, result);
        }
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        if let Some(url) = self.url.take() {
            log::warn!("image task for {url} ended without a result");
            let err = LoadError::Cancelled { url: url.clone() };
            // Outside a runtime (shutdown) nothing more can be spawned.
            let pump = tokio::runtime::Handle::try_current().is_ok();
            self.loader.settle(&url, Err(err), pump);
        }
    }
}

enum PendingState {
    Ready(Option<LoadResult>),
    Waiting(oneshot::Receiver<LoadResult>),
}

/// Future returned by [`ImageLoader::preload`].
///
/// Dropping it does not cancel the fetch; the image still lands in the
/// cache and the result is simply ignored.
pub struct PendingImage {
    url: String,
    state: PendingState,
}

impl PendingImage {
    fn ready(url: &str, result: LoadResult) -> Self {
        Self {
            url: url.to_string(),
            state: PendingState::Ready(Some(result)),
        }
    }

    fn waiting(url: &str, rx: oneshot::Receiver<LoadResult>) -> Self {
        Self {
            url: url.to_string(),
            state: PendingState::Waiting(rx),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Future for PendingImage {
    type Output = LoadResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let PendingImage { url, state } = self.get_mut();
        match state {
            PendingState::Ready(slot) => Poll::Ready(
                slot.take()
                    .unwrap_or_else(|| Err(LoadError::Cancelled { url: url.clone() })),
            ),
            PendingState::Waiting(rx) => Pin::new(rx).poll(cx).map(|received| {
                received.unwrap_or_else(|_| Err(LoadError::Cancelled { url: url.clone() }))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchFuture, MemoryFetcher};
    use crate::test_png;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    #[test]
    fn decode_premultiplies_alpha() {
        let bytes = test_png(2, 2, [255, 0, 0, 128]);
        let img = decode_image("x.png", &bytes).unwrap();
        assert_eq!((img.width(), img.height()), (2, 2));
        let px = img.pixmap.pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 128);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_image("bad.png", b"not an image").unwrap_err();
        assert!(matches!(err, LoadError::Decode { .. }));
    }

    #[tokio::test]
    async fn cached_images_resolve_immediately() {
        let fetcher = MemoryFetcher::new().with("a.png", test_png(1, 1, [0, 0, 0, 255]));
        let loader = ImageLoader::new(Arc::new(fetcher));

        let first = loader.preload("a.png", false).await.unwrap();
        assert!(loader.is_cached("a.png"));
        let again = loader.preload("a.png", false).await.unwrap();
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(loader.active_loads(), 0);
    }

    struct NeverFetcher;

    impl ImageFetcher for NeverFetcher {
        fn fetch(&self, _url: &str) -> FetchFuture {
            Box::pin(std::future::pending::<Result<Vec<u8>, LoadError>>())
        }
    }

    #[tokio::test]
    async fn excess_requests_wait_in_fifo_queue() {
        let loader = ImageLoader::new(Arc::new(NeverFetcher));
        let _pending: Vec<PendingImage> = (0..5)
            .map(|i| loader.preload(&format!("{i}.png"), false))
            .collect();
        assert_eq!(loader.active_loads(), 3);
        assert_eq!(loader.queued(), 2);

        // Priority bypasses the queue and counts against the limit.
        let _urgent = loader.preload("urgent.png", true);
        assert_eq!(loader.active_loads(), 4);

        // Promoting a queued URL moves it out of the queue.
        let _promoted = loader.preload("4.png", true);
        assert_eq!(loader.active_loads(), 5);
        assert_eq!(loader.queued(), 1);
    }

    /// Panics on the first fetch, then serves a PNG.
    struct PanicOnceFetcher {
        panicked: AtomicBool,
    }

    impl ImageFetcher for PanicOnceFetcher {
        fn fetch(&self, _url: &str) -> FetchFuture {
            let first = !self.panicked.swap(true, Ordering::SeqCst);
            Box::pin(async move {
                if first {
                    panic!("fetcher blew up");
                }
                Ok(test_png(1, 1, [0, 0, 255, 255]))
            })
        }
    }

    #[tokio::test]
    async fn panicking_fetch_rejects_waiters_and_frees_the_slot() {
        let fetcher = PanicOnceFetcher {
            panicked: AtomicBool::new(false),
        };
        let loader = ImageLoader::new(Arc::new(fetcher));

        let result = tokio::time::timeout(Duration::from_secs(1), loader.preload("x.png", false))
            .await
            .expect("waiter must not hang");
        assert_eq!(
            result.unwrap_err(),
            LoadError::Cancelled {
                url: "x.png".into()
            }
        );
        assert_eq!(loader.active_loads(), 0);
        assert!(!loader.is_loading("x.png"));
        assert!(!loader.is_cached("x.png"));

        let retry = loader.preload("x.png", false).await.unwrap();
        assert_eq!(retry.width(), 1);
    }

    #[tokio::test]
    async fn queued_load_dispatches_after_a_panic() {
        let fetcher = PanicOnceFetcher {
            panicked: AtomicBool::new(false),
        };
        let config = LoaderConfig {
            max_concurrent_loads: 1,
        };
        let loader = ImageLoader::with_config(Arc::new(fetcher), config);

        let doomed = loader.preload("a.png", false);
        let waiting = loader.preload("b.png", false);
        assert_eq!(loader.queued(), 1);

        assert!(doomed.await.is_err());
        let b = tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("queued load must start")
            .unwrap();
        assert_eq!(b.width(), 1);
        assert_eq!(loader.queued(), 0);
    }
}
