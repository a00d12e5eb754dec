//! Basemap tile cache and loader.
//!
//! A cache miss inserts a `Loading` entry, hands the request to a
//! [`TileFetcher`] and returns at once. Fetch results come back over a
//! channel and are applied by [`TileCache::pump`] at the start of a
//! render tick, so the cache is only ever written from the render thread.
//! Entries are never evicted. A failed entry stays failed unless the
//! `retry_failed` policy is enabled.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::time::Duration;

use citycam_common::config::TileConfig;
use citycam_common::error::{CitycamError, CitycamResult};
use citycam_geo_model::TileKey;

/// A decoded tile raster, RGBA8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

impl TileImage {
    /// Decode PNG or JPEG bytes.
    pub fn decode(bytes: &[u8]) -> CitycamResult<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| CitycamError::tile(format!("Failed to decode tile: {e}")))?
            .to_rgba8();
        Ok(Self {
            width: img.width(),
            height: img.height(),
            rgba: img.into_raw().into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TileState {
    Loading,
    Ready(TileImage),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileEntry {
    pub key: TileKey,
    pub state: TileState,
}

impl TileEntry {
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TileState::Ready(_))
    }

    pub fn image(&self) -> Option<&TileImage> {
        match &self.state {
            TileState::Ready(img) => Some(img),
            _ => None,
        }
    }
}

/// Outcome of one fetch.
#[derive(Debug)]
pub struct TileLoad {
    pub key: TileKey,
    pub result: CitycamResult<TileImage>,
}

/// Starts tile fetches. Implementations must not block the caller and
/// must send exactly one [`TileLoad`] per request.
pub trait TileFetcher: Send {
    fn request(&self, key: TileKey, url: String, done: Sender<TileLoad>);
}

/// Fetches tiles over HTTP on a tokio runtime.
pub struct HttpTileFetcher {
    client: reqwest::Client,
    runtime: tokio::runtime::Handle,
}

impl HttpTileFetcher {
    pub fn new(config: &TileConfig, runtime: tokio::runtime::Handle) -> CitycamResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
            .user_agent(concat!("citycam/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CitycamError::tile(format!("HTTP client init failed: {e}")))?;
        Ok(Self { client, runtime })
    }
}

impl TileFetcher for HttpTileFetcher {
    fn request(&self, key: TileKey, url: String, done: Sender<TileLoad>) {
        let client = self.client.clone();
        self.runtime.spawn(async move {
            let result = fetch_tile(&client, &url).await;
            if let Err(e) = &result {
                tracing::debug!(tile = %key, error = %e, "Tile fetch failed");
            }
            // The cache may already be gone during teardown.
            let _ = done.send(TileLoad { key, result });
        });
    }
}

async fn fetch_tile(client: &reqwest::Client, url: &str) -> CitycamResult<TileImage> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CitycamError::tile(format!("{url}: request error: {e}")))?;
    if !response.status().is_success() {
        return Err(CitycamError::tile(format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| CitycamError::tile(format!("{url}: invalid body: {e}")))?;
    TileImage::decode(&bytes)
}

/// Process-lifetime tile store.
pub struct TileCache {
    entries: HashMap<TileKey, TileEntry>,
    fetcher: Box<dyn TileFetcher>,
    url_template: String,
    retry_failed: bool,
    done_tx: Sender<TileLoad>,
    done_rx: Receiver<TileLoad>,
    dirty: bool,
}

impl TileCache {
    pub fn new(fetcher: Box<dyn TileFetcher>, config: &TileConfig) -> Self {
        let (done_tx, done_rx) = mpsc::channel();
        Self {
            entries: HashMap::new(),
            fetcher,
            url_template: config.url_template.clone(),
            retry_failed: config.retry_failed,
            done_tx,
            done_rx,
            dirty: false,
        }
    }

    /// Look up a tile, starting a fetch on a miss. `x` may be outside
    /// `[0, 2^zoom)`; it is wrapped before lookup.
    pub fn get_tile(&mut self, zoom: u8, x: i64, y: u32) -> &TileEntry {
        self.get(TileKey::wrapped(zoom, x, y))
    }

    pub fn get(&mut self, key: TileKey) -> &TileEntry {
        let key = TileKey::wrapped(key.zoom, i64::from(key.x), key.y);
        let needs_fetch = match self.entries.get(&key) {
            None => true,
            Some(entry) => self.retry_failed && matches!(entry.state, TileState::Failed(_)),
        };
        if needs_fetch {
            self.entries.insert(
                key,
                TileEntry {
                    key,
                    state: TileState::Loading,
                },
            );
            self.fetcher
                .request(key, key.url(&self.url_template), self.done_tx.clone());
        }
        &self.entries[&key]
    }

    /// Look up without fetching.
    pub fn peek(&self, key: &TileKey) -> Option<&TileEntry> {
        self.entries.get(key)
    }

    /// Apply finished fetches. Returns how many arrived.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(load) = self.done_rx.try_recv() {
            let state = match load.result {
                Ok(image) => TileState::Ready(image),
                Err(e) => {
                    tracing::warn!(tile = %load.key, error = %e, "Tile unavailable");
                    TileState::Failed(e.to_string())
                }
            };
            if let Some(entry) = self.entries.get_mut(&load.key) {
                entry.state = state;
                applied += 1;
            }
        }
        if applied > 0 {
            self.dirty = true;
        }
        applied
    }

    /// Whether tiles arrived since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ready_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_ready()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries
            .values()
            .filter(|e| matches!(e.state, TileState::Failed(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records requests; tests complete them by hand.
    #[derive(Clone, Default)]
    struct ManualFetcher {
        pending: Arc<Mutex<Vec<(TileKey, String, Sender<TileLoad>)>>>,
    }

    impl TileFetcher for ManualFetcher {
        fn request(&self, key: TileKey, url: String, done: Sender<TileLoad>) {
            self.pending.lock().unwrap().push((key, url, done));
        }
    }

    impl ManualFetcher {
        fn complete_all(&self, ok: bool) {
            for (key, _, done) in self.pending.lock().unwrap().drain(..) {
                let result = if ok {
                    Ok(TileImage {
                        width: 1,
                        height: 1,
                        rgba: Arc::from(vec![0u8, 0, 0, 255]),
                    })
                } else {
                    Err(CitycamError::tile("HTTP 404"))
                };
                done.send(TileLoad { key, result }).unwrap();
            }
        }

        fn requests(&self) -> usize {
            self.pending.lock().unwrap().len()
        }
    }

    fn cache(retry_failed: bool) -> (TileCache, ManualFetcher) {
        let fetcher = ManualFetcher::default();
        let config = TileConfig {
            retry_failed,
            ..TileConfig::default()
        };
        (TileCache::new(Box::new(fetcher.clone()), &config), fetcher)
    }

    #[test]
    fn test_miss_returns_loading_and_requests_once() {
        let (mut cache, fetcher) = cache(false);
        assert_eq!(cache.get_tile(14, 10, 20).state, TileState::Loading);
        assert_eq!(cache.get_tile(14, 10, 20).state, TileState::Loading);
        assert_eq!(fetcher.requests(), 1);
        assert_eq!(
            fetcher.pending.lock().unwrap()[0].1,
            "https://basemaps.cartocdn.com/dark_nolabels/14/10/20@2x.png"
        );
    }

    #[test]
    fn test_ready_only_after_pump() {
        let (mut cache, fetcher) = cache(false);
        cache.get_tile(3, 1, 1);
        fetcher.complete_all(true);
        let key = TileKey::wrapped(3, 1, 1);
        assert!(!cache.peek(&key).unwrap().is_ready());
        assert!(!cache.take_dirty());

        assert_eq!(cache.ready_count(), 0);

        assert_eq!(cache.pump(), 1);
        assert!(cache.peek(&key).unwrap().is_ready());
        assert_eq!(cache.ready_count(), 1);
        assert!(cache.take_dirty());
        assert!(!cache.take_dirty());
    }

    #[test]
    fn test_failed_tile_is_never_refetched() {
        let (mut cache, fetcher) = cache(false);
        cache.get_tile(5, 2, 2);
        fetcher.complete_all(false);
        cache.pump();
        assert!(matches!(cache.get_tile(5, 2, 2).state, TileState::Failed(_)));
        assert_eq!(fetcher.requests(), 0);
        assert_eq!(cache.failed_count(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_retry_policy_refetches_failed_tile() {
        let (mut cache, fetcher) = cache(true);
        cache.get_tile(5, 2, 2);
        fetcher.complete_all(false);
        cache.pump();
        assert_eq!(cache.get_tile(5, 2, 2).state, TileState::Loading);
        assert_eq!(fetcher.requests(), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(TileImage::decode(b"not a png").is_err());
    }
}
