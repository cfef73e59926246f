use crate::core::error::FetchError;
use crate::core::rate::{Instrument, RateSource};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// A complete instrument list and the moment it was fetched.
#[derive(Debug)]
pub struct CacheEntry {
    pub payload: Arc<Vec<Instrument>>,
    pub fetched_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.fetched_at.elapsed() < ttl
    }
}

/// Time-bounded cache over [`RateSource::fetch_instruments`].
///
/// Holds at most one [`CacheEntry`]. A refresh builds a new entry and swaps
/// the `Arc` in one step, so concurrent readers see either the old list or
/// the new one. The lock is never held across a fetch.
pub struct AssetCache {
    source: Arc<dyn RateSource>,
    ttl: Duration,
    entry: RwLock<Option<Arc<CacheEntry>>>,
}

impl AssetCache {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current instrument list. Empty when nothing could ever be fetched.
    pub async fn get(&self, force_refresh: bool) -> Arc<Vec<Instrument>> {
        self.try_get(force_refresh)
            .await
            .unwrap_or_else(|_| Arc::new(Vec::new()))
    }

    /// Like [`AssetCache::get`], but reports the fetch error when there is no
    /// previous list to fall back on.
    pub async fn try_get(&self, force_refresh: bool) -> Result<Arc<Vec<Instrument>>, FetchError> {
        let previous = self.entry.read().await.clone();

        if !force_refresh {
            if let Some(entry) = previous.as_ref().filter(|e| e.is_fresh(self.ttl)) {
                debug!("Cache HIT ({} instruments)", entry.payload.len());
                return Ok(Arc::clone(&entry.payload));
            }
            debug!("Cache MISS");
        } else {
            debug!("Cache refresh forced");
        }

        match self.source.fetch_instruments().await {
            Ok(instruments) => {
                let entry = Arc::new(CacheEntry {
                    payload: Arc::new(instruments),
                    fetched_at: Instant::now(),
                });
                let payload = Arc::clone(&entry.payload);
                *self.entry.write().await = Some(entry);
                debug!("Cache PUT ({} instruments)", payload.len());
                Ok(payload)
            }
            Err(e) => match previous {
                Some(entry) => {
                    warn!(error = %e, "Instrument fetch failed, serving stale list");
                    Ok(Arc::clone(&entry.payload))
                }
                None => Err(e),
            },
        }
    }
}
