//! services/client/src/session/blob_cache.rs
//!
//! Caches downloaded course materials for the lifetime of one view.
//!
//! Entries are keyed by the material's `file_name` and hold the payload plus
//! the ephemeral URL minted for it. The cache exclusively owns those URLs and
//! revokes them when an entry is evicted or the cache is disposed/dropped.
//! Concurrent misses for the same key share a single download. Each download
//! carries a ticket; one that lands after its key was evicted hands its URL to
//! the callers already waiting but never becomes reachable from the cache.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use study_helper_core::domain::{Blob, MaterialId};
use study_helper_core::ports::{
    MaterialGateway, ObjectUrlService, PortError, PortResult, StorageService,
};
use tracing::{debug, info, warn};

use crate::session::call::CallStatus;

type SharedFetch = Shared<BoxFuture<'static, PortResult<String>>>;

/// One cached download.
#[derive(Debug, Clone)]
pub struct CachedBlob {
    pub blob: Blob,
    pub url: String,
}

pub struct MaterialBlobCache {
    inner: Arc<CacheInner>,
    calls: CallStatus,
}

struct CacheInner {
    materials: Arc<dyn MaterialGateway>,
    storage: Arc<dyn StorageService>,
    urls: Arc<dyn ObjectUrlService>,
    download_timeout: Option<Duration>,
    downloads: AtomicUsize,
    state: Mutex<CacheState>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedBlob>,
    in_flight: HashMap<String, InFlight>,
    /// URLs of downloads that landed after their key was evicted. Released at dispose.
    detached: Vec<String>,
    next_ticket: u64,
    disposed: bool,
}

struct InFlight {
    ticket: u64,
    fetch: SharedFetch,
}

impl MaterialBlobCache {
    /// `download_timeout` bounds every storage download.
    pub fn new(
        materials: Arc<dyn MaterialGateway>,
        storage: Arc<dyn StorageService>,
        urls: Arc<dyn ObjectUrlService>,
        calls: CallStatus,
        download_timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                materials,
                storage,
                urls,
                download_timeout,
                downloads: AtomicUsize::new(0),
                state: Mutex::new(CacheState::default()),
            }),
            calls,
        }
    }

    /// Resolves a material to a displayable URL, downloading it on a miss.
    /// Failures are recorded on the call status and yield `None`.
    pub async fn resolve(&self, file_name: &str, material_id: MaterialId) -> Option<String> {
        self.calls.run(|| self.try_resolve(file_name, material_id)).await
    }

    pub async fn try_resolve(&self, file_name: &str, material_id: MaterialId) -> PortResult<String> {
        let fetch = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return Err(PortError::Cancelled);
            }
            if let Some(entry) = state.entries.get(file_name) {
                debug!("Cache hit for '{}'.", file_name);
                return Ok(entry.url.clone());
            }
            match state.in_flight.get(file_name) {
                Some(running) => {
                    debug!("Joining the download already running for '{}'.", file_name);
                    running.fetch.clone()
                }
                None => {
                    let ticket = state.next_ticket;
                    state.next_ticket += 1;
                    let fetch = self.start_fetch(file_name.to_string(), material_id, ticket);
                    state.in_flight.insert(
                        file_name.to_string(),
                        InFlight {
                            ticket,
                            fetch: fetch.clone(),
                        },
                    );
                    fetch
                }
            }
        };
        fetch.await
    }

    /// The download runs as its own task so it finishes (and its entry is
    /// recorded or released) even if every caller stops waiting.
    fn start_fetch(&self, file_name: String, material_id: MaterialId, ticket: u64) -> SharedFetch {
        let task = tokio::spawn(Arc::clone(&self.inner).fetch(file_name, material_id, ticket));
        async move {
            task.await
                .unwrap_or_else(|e| Err(PortError::Unexpected(format!("download task failed: {}", e))))
        }
        .boxed()
        .shared()
    }

    /// Drops the entry for `file_name`, revokes its URL and detaches any
    /// download still running for it, so the next resolve starts afresh.
    /// Returns whether there was anything to drop.
    pub fn evict(&self, file_name: &str) -> bool {
        let (removed, detached) = {
            let mut state = self.inner.state.lock();
            (
                state.entries.remove(file_name),
                state.in_flight.remove(file_name).is_some(),
            )
        };
        if detached {
            info!("Detached the running download of '{}' from the material cache.", file_name);
        }
        match removed {
            Some(entry) => {
                info!("Evicted '{}' from the material cache.", file_name);
                self.inner.urls.revoke_object_url(&entry.url);
                true
            }
            None => detached,
        }
    }

    /// Releases every cached and detached URL. Downloads still running are
    /// discarded when they land.
    pub fn dispose(&self) {
        let (entries, detached) = {
            let mut state = self.inner.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.in_flight.clear();
            (
                std::mem::take(&mut state.entries),
                std::mem::take(&mut state.detached),
            )
        };
        for url in entries.values().map(|entry| &entry.url).chain(&detached) {
            self.inner.urls.revoke_object_url(url);
        }
        info!(
            "Material cache disposed; released {} URLs.",
            entries.len() + detached.len()
        );
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.inner.state.lock().entries.contains_key(file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<CachedBlob> {
        self.inner.state.lock().entries.get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of storage downloads started so far.
    pub fn downloads_started(&self) -> usize {
        self.inner.downloads.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> &CallStatus {
        &self.calls
    }
}

impl Drop for MaterialBlobCache {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl CacheInner {
    async fn fetch(
        self: Arc<Self>,
        file_name: String,
        material_id: MaterialId,
        ticket: u64,
    ) -> PortResult<String> {
        info!("Cache miss for '{}'. Fetching material {}.", file_name, material_id);
        let downloaded = self.download(material_id).await;

        let mut state = self.state.lock();
        let current = state
            .in_flight
            .get(&file_name)
            .is_some_and(|running| running.ticket == ticket);
        if current {
            state.in_flight.remove(&file_name);
        }
        let blob = match downloaded {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to download '{}': {}", file_name, e);
                return Err(e);
            }
        };

        if state.disposed {
            debug!("Cache was disposed while '{}' downloaded; discarding it.", file_name);
            return Err(PortError::Cancelled);
        }
        let url = self.urls.create_object_url(&blob)?;
        if !current {
            debug!("'{}' was evicted while it downloaded; not caching it.", file_name);
            state.detached.push(url.clone());
            return Ok(url);
        }
        if let Some(previous) = state.entries.insert(
            file_name.clone(),
            CachedBlob {
                blob,
                url: url.clone(),
            },
        ) {
            self.urls.revoke_object_url(&previous.url);
        }
        Ok(url)
    }

    async fn download(&self, material_id: MaterialId) -> PortResult<Blob> {
        let material = self.materials.get_material(material_id).await?;
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let download = self.storage.download(&material.material_file_url);
        let mut blob = match self.download_timeout {
            Some(limit) => tokio::time::timeout(limit, download).await.map_err(|_| {
                PortError::Transport(format!(
                    "download of '{}' exceeded {:?}",
                    material.material_file_url, limit
                ))
            })??,
            None => download.await?,
        };
        // Storage often serves uploads as opaque bytes.
        if blob.content_type == "application/octet-stream" {
            blob.content_type = material.display_type().to_string();
        }
        Ok(blob)
    }
}
