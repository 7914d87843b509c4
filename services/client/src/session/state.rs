//! services/client/src/session/state.rs
//!
//! Defines the client's shared state and the per-view objects built from it.

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use study_helper_core::domain::CourseId;
use study_helper_core::ports::{MaterialGateway, ObjectUrlService, QuizGateway, StorageService};

use crate::adapters::{BucketStorageAdapter, HttpBackendAdapter, InMemoryObjectUrls};
use crate::config::Config;
use crate::error::ClientError;
use crate::session::call::CallStatus;
use crate::session::materials::MaterialLibrary;
use crate::session::notify::Notifier;
use crate::session::poller::{GenerationPoller, PollPolicy};
use crate::session::quizzes::QuizService;

//=========================================================================================
// ClientState (Shared Across All Views)
//=========================================================================================

/// The collaborators every view is built from, created once at startup.
#[derive(Clone)]
pub struct ClientState {
    pub quizzes: Arc<dyn QuizGateway>,
    pub materials: Arc<dyn MaterialGateway>,
    pub storage: Arc<dyn StorageService>,
    pub urls: Arc<dyn ObjectUrlService>,
    pub poll_policy: PollPolicy,
    pub download_timeout: Option<Duration>,
    pub notifier: Option<Notifier>,
}

impl ClientState {
    /// Wires the HTTP adapters described by `config`.
    pub fn from_config(config: &Config, notifier: Option<Notifier>) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(config.request_timeout).build()?;
        let backend = Arc::new(HttpBackendAdapter::new(
            http,
            config.api_base_url.clone(),
            config.api_token.clone(),
        ));
        // Downloads are bounded by the cache's own deadline instead of the request timeout.
        let storage_http = Client::builder().build()?;
        let storage = Arc::new(BucketStorageAdapter::new(
            storage_http,
            config.storage_url.clone(),
            config.storage_bucket.clone(),
            config.storage_key.clone(),
        ));

        Ok(Self {
            quizzes: backend.clone(),
            materials: backend,
            storage,
            urls: Arc::new(InMemoryObjectUrls::new()),
            poll_policy: config.poll_policy.clone(),
            download_timeout: Some(config.download_timeout),
            notifier,
        })
    }

    /// A fresh loading/error status for one view.
    pub fn call_status(&self) -> CallStatus {
        match &self.notifier {
            Some(notifier) => CallStatus::with_notifier(notifier.clone()),
            None => CallStatus::new(),
        }
    }

    pub fn quiz_service(&self) -> QuizService {
        QuizService::new(self.quizzes.clone(), self.call_status())
    }

    pub fn generation_poller(&self, quizzes: QuizService) -> GenerationPoller {
        GenerationPoller::new(quizzes, self.poll_policy.clone())
    }

    /// The materials view of one course, with its own blob cache.
    pub fn material_library(&self, course_id: CourseId) -> MaterialLibrary {
        MaterialLibrary::new(
            course_id,
            self.materials.clone(),
            self.storage.clone(),
            self.urls.clone(),
            self.call_status(),
            self.download_timeout,
        )
    }
}
