//! services/client/src/adapters/storage.rs
//!
//! This module contains the adapter for the object storage bucket that holds
//! uploaded course materials. It implements the `StorageService` port.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use study_helper_core::domain::{Blob, DEFAULT_MATERIAL_TYPE};
use study_helper_core::ports::{PortError, PortResult, StorageService};
use tracing::info;

use crate::adapters::http::{check_status, transport_error};

/// Downloads objects through the Supabase-style `storage/v1/object` API.
#[derive(Clone)]
pub struct BucketStorageAdapter {
    client: Client,
    storage_url: Url,
    bucket: String,
    api_key: Option<String>,
}

impl BucketStorageAdapter {
    pub fn new(client: Client, storage_url: Url, bucket: String, api_key: Option<String>) -> Self {
        Self {
            client,
            storage_url,
            bucket,
            api_key,
        }
    }

    fn object_url(&self, reference: &str) -> PortResult<Url> {
        let path = format!(
            "storage/v1/object/{}/{}",
            self.bucket,
            reference.trim_start_matches('/')
        );
        self.storage_url
            .join(&path)
            .map_err(|e| PortError::Unexpected(format!("invalid storage reference '{}': {}", reference, e)))
    }
}

#[async_trait]
impl StorageService for BucketStorageAdapter {
    async fn download(&self, reference: &str) -> PortResult<Blob> {
        let mut request = self.client.get(self.object_url(reference)?);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key).bearer_auth(key);
        }

        let response = request.send().await.map_err(transport_error)?;
        let response = check_status(response).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(DEFAULT_MATERIAL_TYPE)
            .to_string();
        let data = response.bytes().await.map_err(transport_error)?;

        info!("Downloaded '{}' ({} bytes) from storage.", reference, data.len());
        Ok(Blob { data, content_type })
    }
}
