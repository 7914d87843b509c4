//! services/client/src/session/materials.rs
//!
//! The course materials view: the material list, opening a material through
//! the blob cache, and deleting a material.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use study_helper_core::domain::{CourseId, Material, MaterialId};
use study_helper_core::ports::{MaterialGateway, ObjectUrlService, PortError, StorageService};
use tracing::info;

use crate::session::blob_cache::MaterialBlobCache;
use crate::session::call::CallStatus;

pub struct MaterialLibrary {
    course_id: CourseId,
    gateway: Arc<dyn MaterialGateway>,
    calls: CallStatus,
    materials: Mutex<Vec<Material>>,
    cache: MaterialBlobCache,
}

impl MaterialLibrary {
    pub fn new(
        course_id: CourseId,
        gateway: Arc<dyn MaterialGateway>,
        storage: Arc<dyn StorageService>,
        urls: Arc<dyn ObjectUrlService>,
        calls: CallStatus,
        download_timeout: Option<Duration>,
    ) -> Self {
        let cache = MaterialBlobCache::new(
            gateway.clone(),
            storage,
            urls,
            calls.clone(),
            download_timeout,
        );
        Self {
            course_id,
            gateway,
            calls,
            materials: Mutex::new(Vec::new()),
            cache,
        }
    }

    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    /// Replaces the list with the course's materials. Returns how many were loaded.
    pub async fn load(&self) -> Option<usize> {
        let materials = self
            .calls
            .run(|| self.gateway.list_materials(self.course_id))
            .await?;
        let count = materials.len();
        *self.materials.lock() = materials;
        info!("Loaded {} materials for course {}.", count, self.course_id);
        Some(count)
    }

    pub fn materials(&self) -> Vec<Material> {
        self.materials.lock().clone()
    }

    pub fn find(&self, material_id: MaterialId) -> Option<Material> {
        self.materials.lock().iter().find(|m| m.id == material_id).cloned()
    }

    /// Resolves a listed material to an ephemeral URL, downloading it at most once.
    pub async fn open(&self, material_id: MaterialId) -> Option<String> {
        match self.find(material_id) {
            Some(material) => self.cache.resolve(&material.file_name, material.id).await,
            None => {
                self.calls
                    .run(|| async move {
                        Err::<String, _>(PortError::NotFound(format!("material {}", material_id)))
                    })
                    .await
            }
        }
    }

    /// Deletes a material on the server, then drops it from the list and
    /// releases its cached blob. A download already running for it still
    /// completes for whoever is awaiting it.
    pub async fn delete(&self, material_id: MaterialId) -> bool {
        let deleted = self
            .calls
            .run(|| self.gateway.delete_material(self.course_id, material_id))
            .await;
        if deleted.is_none() {
            return false;
        }

        let removed = {
            let mut materials = self.materials.lock();
            let position = materials.iter().position(|m| m.id == material_id);
            position.map(|idx| materials.remove(idx))
        };
        if let Some(material) = removed {
            self.cache.evict(&material.file_name);
            info!("Deleted material '{}' ({}).", material.file_name, material_id);
        }
        true
    }

    pub fn cache(&self) -> &MaterialBlobCache {
        &self.cache
    }

    pub fn calls(&self) -> &CallStatus {
        &self.calls
    }

    /// Tears the view down, releasing every cached URL.
    pub fn dispose(&self) {
        self.cache.dispose();
    }
}
