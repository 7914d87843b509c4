//! crates/study_helper_core/src/ports.rs
//!
//! Defines the contracts (traits) the quiz client depends on.
//! These traits form the boundary of the hexagonal architecture: the transport
//! layer, the storage backend and the ephemeral URL facility are external
//! collaborators, and the core only ever talks to them through these ports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AnswerSet, Blob, CourseId, Material, MaterialId, NewQuiz, Question, QuickCreateRequest,
    QuickCreateResponse, QuickCreateStatus, Quiz, QuizId, QuizResult,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error taxonomy for every port operation.
///
/// `Clone` so a single failed download can be reported to every caller that
/// was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Network request failed: {0}")]
    Transport(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("Quiz generation did not complete after {attempts} status checks")]
    GenerationTimeout { attempts: u32 },
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Operation cancelled")]
    Cancelled,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The quiz endpoints of the backend REST API.
#[async_trait]
pub trait QuizGateway: Send + Sync {
    async fn list_quizzes(&self, course_id: CourseId) -> PortResult<Vec<Quiz>>;

    async fn create_quiz(&self, course_id: CourseId, quiz: &NewQuiz) -> PortResult<Quiz>;

    async fn delete_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz>;

    /// Asks the server to start generating questions; completion is observed by polling.
    async fn generate_questions(&self, quiz_id: QuizId) -> PortResult<Quiz>;

    async fn list_questions(&self, quiz_id: QuizId) -> PortResult<Vec<Question>>;

    async fn get_quiz(&self, quiz_id: QuizId) -> PortResult<Quiz>;

    async fn check_answers(&self, quiz_id: QuizId, answers: &AnswerSet) -> PortResult<QuizResult>;

    async fn quick_create(&self, request: &QuickCreateRequest) -> PortResult<QuickCreateResponse>;

    async fn quick_create_status(&self, quiz_id: QuizId) -> PortResult<QuickCreateStatus>;
}

/// The course material endpoints of the backend REST API.
#[async_trait]
pub trait MaterialGateway: Send + Sync {
    async fn list_materials(&self, course_id: CourseId) -> PortResult<Vec<Material>>;

    async fn get_material(&self, material_id: MaterialId) -> PortResult<Material>;

    async fn delete_material(&self, course_id: CourseId, material_id: MaterialId) -> PortResult<()>;
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Downloads the raw bytes stored under `reference`.
    async fn download(&self, reference: &str) -> PortResult<Blob>;
}

/// Mints process-local URLs for in-memory payloads.
///
/// Every URL returned by `create_object_url` stays alive until it is passed to
/// `revoke_object_url`.
pub trait ObjectUrlService: Send + Sync {
    fn create_object_url(&self, blob: &Blob) -> PortResult<String>;

    fn revoke_object_url(&self, url: &str);
}
