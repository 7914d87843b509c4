//! services/client/src/adapters/object_url.rs
//!
//! An in-process registry of ephemeral `blob:` URLs. Implements the
//! `ObjectUrlService` port for hosts without a browser URL facility.

use parking_lot::Mutex;
use std::collections::HashMap;
use study_helper_core::domain::Blob;
use study_helper_core::ports::{ObjectUrlService, PortResult};
use tracing::debug;
use uuid::Uuid;

const URL_PREFIX: &str = "blob:study-helper/";

/// Holds every live payload until its URL is revoked.
#[derive(Default)]
pub struct InMemoryObjectUrls {
    live: Mutex<HashMap<String, Blob>>,
}

impl InMemoryObjectUrls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the payload behind a live URL.
    pub fn open(&self, url: &str) -> Option<Blob> {
        self.live.lock().get(url).cloned()
    }

    /// Number of URLs created and not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live.lock().len()
    }
}

impl ObjectUrlService for InMemoryObjectUrls {
    fn create_object_url(&self, blob: &Blob) -> PortResult<String> {
        let url = format!("{}{}", URL_PREFIX, Uuid::new_v4());
        self.live.lock().insert(url.clone(), blob.clone());
        debug!("Created object URL {} ({} bytes).", url, blob.data.len());
        Ok(url)
    }

    fn revoke_object_url(&self, url: &str) {
        if self.live.lock().remove(url).is_some() {
            debug!("Revoked object URL {}.", url);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn revoked_urls_no_longer_resolve() {
        let urls = InMemoryObjectUrls::new();
        let blob = Blob {
            data: Bytes::from_static(b"%PDF-1.7"),
            content_type: "application/pdf".to_string(),
        };

        let url = urls.create_object_url(&blob).unwrap();
        assert!(url.starts_with("blob:study-helper/"));
        assert_eq!(urls.open(&url), Some(blob));
        assert_eq!(urls.live_count(), 1);

        urls.revoke_object_url(&url);
        assert_eq!(urls.open(&url), None);
        assert_eq!(urls.live_count(), 0);
    }
}
